use serde::{Deserialize, Serialize};

/// Default openFDA NDC directory endpoint.
pub const DEFAULT_NDC_DIRECTORY_URL: &str = "https://api.fda.gov";

/// Default generic UPC product database endpoint.
pub const DEFAULT_RETAIL_LOOKUP_URL: &str = "https://api.upcitemdb.com";

/// Per-call timeout for registry lookups. A timed-out candidate is treated as
/// a non-match; the loop moves on, so this stays short.
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Maximum registry rows requested per candidate query. One match is enough;
/// a small page bounds response size.
pub const DEFAULT_RESULT_LIMIT: u32 = 5;

/// Pipeline configuration: registry endpoints, timeouts and the review
/// threshold. Construct with `Default` and override what differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub ndc_directory_url: String,
    pub retail_lookup_url: String,
    pub lookup_timeout_secs: u64,
    pub result_limit: u32,
    /// Drafts scoring below this are flagged "needs manual verification" by
    /// the caller. Never used to discard a draft.
    pub review_threshold: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ndc_directory_url: DEFAULT_NDC_DIRECTORY_URL.to_string(),
            retail_lookup_url: DEFAULT_RETAIL_LOOKUP_URL.to_string(),
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
            result_limit: DEFAULT_RESULT_LIMIT,
            review_threshold: crate::pipeline::confidence::thresholds::REVIEW,
        }
    }
}
