//! Sequential NDC candidate resolution against the drug registry, with a
//! retail product registry fallback for retail-format barcodes.
//!
//! Candidate order is a priority the caller set; the loop is strictly
//! sequential and stops at the first non-empty result. A transport failure
//! counts as a miss for that one candidate only — a mis-formatted NDC will
//! not become valid on retry, so there are none. Cancellation is checked
//! between candidates and produces a terminal state distinct from "not
//! found": an aborted scan is not a failed scan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::medication::{DraftFields, MedicationDraft, Provenance};
use crate::models::registry::{DrugRecord, RetailProduct};
use crate::models::scan::ScannedCode;
use crate::pipeline::{confidence, ndc, RegistryError};

/// Product-decision defaults for retail registry matches. A UPC database
/// knows the product, not the regimen; these are documented placeholders the
/// reviewer is expected to replace, never discovered data.
pub const RETAIL_DEFAULT_DOSAGE: &str = "See package";
pub const RETAIL_DEFAULT_FREQUENCY: &str = "As directed";
pub const RETAIL_DEFAULT_ROUTE: &str = "Oral";

/// Drug registry lookup collaborator. Zero results is a normal outcome, not
/// an error.
pub trait DrugRegistry {
    fn query(&self, candidate: &str) -> Result<Vec<DrugRecord>, RegistryError>;
}

/// Generic retail barcode/product database collaborator.
pub trait RetailRegistry {
    fn query(&self, code: &str) -> Result<Option<RetailProduct>, RegistryError>;
}

/// Trace events emitted while walking the candidate list. Injected instead
/// of ambient logging so the loop itself has no hidden I/O.
#[derive(Debug)]
pub enum ResolveEvent<'a> {
    /// One candidate was queried and missed (no results, or the lookup
    /// itself failed transport-wise).
    TriedCandidate {
        candidate: &'a str,
        error: Option<&'a RegistryError>,
    },
    /// A candidate returned at least one record; the loop stops here.
    Matched { candidate: &'a str },
    /// Every candidate was tried without a match.
    Exhausted { tried: usize },
    /// The caller cancelled between candidates.
    Cancelled { tried: usize },
}

pub trait ResolveObserver {
    fn on_event(&self, event: &ResolveEvent<'_>);
}

/// Default observer: structured tracing, one line per event.
pub struct TracingObserver;

impl ResolveObserver for TracingObserver {
    fn on_event(&self, event: &ResolveEvent<'_>) {
        match event {
            ResolveEvent::TriedCandidate {
                candidate,
                error: None,
            } => {
                tracing::debug!(candidate = %candidate, "registry candidate missed");
            }
            ResolveEvent::TriedCandidate {
                candidate,
                error: Some(e),
            } => {
                tracing::warn!(candidate = %candidate, error = %e, "registry lookup failed, continuing");
            }
            ResolveEvent::Matched { candidate } => {
                tracing::info!(candidate = %candidate, "registry candidate matched");
            }
            ResolveEvent::Exhausted { tried } => {
                tracing::debug!(tried, "candidate list exhausted with no match");
            }
            ResolveEvent::Cancelled { tried } => {
                tracing::debug!(tried, "resolution cancelled by caller");
            }
        }
    }
}

/// Observer that discards everything. Useful in tests and batch tooling.
pub struct NullObserver;

impl ResolveObserver for NullObserver {
    fn on_event(&self, _event: &ResolveEvent<'_>) {}
}

/// Caller-driven cancellation flag, checked between candidates. Cloning
/// shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Terminal state of a candidate walk.
#[derive(Debug)]
pub enum Resolution {
    Matched(DrugRecord),
    NotFound,
    Cancelled,
}

/// Outcome of trying one candidate. Transport failures are folded into a
/// miss here so the walk below stays free of error plumbing.
enum Attempt {
    Match(Box<DrugRecord>),
    Miss(Option<RegistryError>),
}

fn try_candidate(registry: &dyn DrugRegistry, candidate: &str) -> Attempt {
    match registry.query(candidate) {
        Ok(records) => match records.into_iter().next() {
            Some(record) => Attempt::Match(Box::new(record)),
            None => Attempt::Miss(None),
        },
        Err(e) => Attempt::Miss(Some(e)),
    }
}

/// Walk `candidates` in order against the registry. First candidate with a
/// non-empty result wins; `resolve(&[], ..)` issues no queries and returns
/// `NotFound`.
pub fn resolve(
    registry: &dyn DrugRegistry,
    candidates: &[String],
    cancel: &CancelToken,
    observer: &dyn ResolveObserver,
) -> Resolution {
    let mut tried = 0;
    for candidate in candidates {
        if cancel.is_cancelled() {
            observer.on_event(&ResolveEvent::Cancelled { tried });
            return Resolution::Cancelled;
        }
        tried += 1;
        match try_candidate(registry, candidate) {
            Attempt::Match(record) => {
                observer.on_event(&ResolveEvent::Matched { candidate });
                return Resolution::Matched(*record);
            }
            Attempt::Miss(error) => {
                observer.on_event(&ResolveEvent::TriedCandidate {
                    candidate,
                    error: error.as_ref(),
                });
            }
        }
    }
    observer.on_event(&ResolveEvent::Exhausted { tried });
    Resolution::NotFound
}

/// Retail fallback, keyed by the raw scanned code (not the NDC candidates).
/// Only retail symbologies are eligible; transport failures degrade to
/// "no product".
pub fn resolve_retail(
    retail: &dyn RetailRegistry,
    scan: &ScannedCode,
) -> Option<RetailProduct> {
    if !scan.symbology.is_retail() {
        return None;
    }
    match retail.query(&scan.raw) {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(code = %scan.raw, error = %e, "retail lookup failed");
            None
        }
    }
}

/// Build a barcode-provenance draft from a resolved registry record. The
/// score reflects registry completeness, not the free-text field table.
pub fn draft_from_record(record: &DrugRecord, source_image: Option<String>) -> MedicationDraft {
    let fields = DraftFields {
        name: record.display_name().map(str::to_string),
        dosage: record
            .ingredients
            .first()
            .and_then(|i| i.strength.clone()),
        route: record.routes.first().cloned(),
        ..Default::default()
    };
    fields.into_draft(Provenance::Barcode, confidence::score_record(record), source_image)
}

/// Build a best-effort draft from a retail product match, applying the named
/// retail defaults.
pub fn draft_from_retail(product: &RetailProduct, source_image: Option<String>) -> MedicationDraft {
    let fields = DraftFields {
        name: Some(product.title.clone()),
        dosage: Some(RETAIL_DEFAULT_DOSAGE.to_string()),
        frequency: Some(RETAIL_DEFAULT_FREQUENCY.to_string()),
        route: Some(RETAIL_DEFAULT_ROUTE.to_string()),
        ..Default::default()
    };
    let score = confidence::score_fields(&fields);
    fields.into_draft(Provenance::Barcode, score, source_image)
}

/// Terminal state of a whole barcode scan.
#[derive(Debug)]
pub enum ScanOutcome {
    Resolved(MedicationDraft),
    /// Registry and retail fallback both exhausted; caller surfaces manual
    /// entry.
    NotFound,
    Cancelled,
}

/// The whole barcode path: enumerate NDC candidates, resolve them in order,
/// fall back to the retail registry for retail symbologies, and score the
/// result.
pub fn resolve_scan(
    registry: &dyn DrugRegistry,
    retail: &dyn RetailRegistry,
    scan: &ScannedCode,
    cancel: &CancelToken,
    observer: &dyn ResolveObserver,
    source_image: Option<String>,
) -> ScanOutcome {
    let candidates = ndc::normalize(&scan.raw);
    tracing::debug!(code = %scan.raw, candidates = candidates.len(), "resolving scanned code");

    match resolve(registry, &candidates, cancel, observer) {
        Resolution::Matched(record) => {
            ScanOutcome::Resolved(draft_from_record(&record, source_image))
        }
        Resolution::Cancelled => ScanOutcome::Cancelled,
        Resolution::NotFound => match resolve_retail(retail, scan) {
            Some(product) => ScanOutcome::Resolved(draft_from_retail(&product, source_image)),
            None => ScanOutcome::NotFound,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scan::Symbology;
    use std::cell::RefCell;

    /// Registry stub that matches a fixed candidate and counts queries.
    struct StubRegistry {
        match_on: Option<String>,
        fail_on: Vec<String>,
        queries: RefCell<Vec<String>>,
    }

    impl StubRegistry {
        fn matching(candidate: &str) -> Self {
            Self {
                match_on: Some(candidate.to_string()),
                fail_on: Vec::new(),
                queries: RefCell::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self {
                match_on: None,
                fail_on: Vec::new(),
                queries: RefCell::new(Vec::new()),
            }
        }

        fn query_count(&self) -> usize {
            self.queries.borrow().len()
        }
    }

    impl DrugRegistry for StubRegistry {
        fn query(&self, candidate: &str) -> Result<Vec<DrugRecord>, RegistryError> {
            self.queries.borrow_mut().push(candidate.to_string());
            if self.fail_on.iter().any(|c| c == candidate) {
                return Err(RegistryError::Timeout(10));
            }
            if self.match_on.as_deref() == Some(candidate) {
                return Ok(vec![DrugRecord {
                    generic_name: Some("Lisinopril".into()),
                    ndc: Some(candidate.to_string()),
                    ..Default::default()
                }]);
            }
            Ok(Vec::new())
        }
    }

    struct StubRetail {
        product: Option<RetailProduct>,
        queries: RefCell<Vec<String>>,
    }

    impl StubRetail {
        fn with_product(title: &str) -> Self {
            Self {
                product: Some(RetailProduct {
                    title: title.to_string(),
                    brand: None,
                    upc: "036000291452".into(),
                }),
                queries: RefCell::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self {
                product: None,
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl RetailRegistry for StubRetail {
        fn query(&self, code: &str) -> Result<Option<RetailProduct>, RegistryError> {
            self.queries.borrow_mut().push(code.to_string());
            Ok(self.product.clone())
        }
    }

    /// Observer that records the event sequence as short tags.
    struct RecordingObserver {
        events: RefCell<Vec<String>>,
    }

    impl RecordingObserver {
        fn new() -> Self {
            Self {
                events: RefCell::new(Vec::new()),
            }
        }
    }

    impl ResolveObserver for RecordingObserver {
        fn on_event(&self, event: &ResolveEvent<'_>) {
            let tag = match event {
                ResolveEvent::TriedCandidate { .. } => "tried",
                ResolveEvent::Matched { .. } => "matched",
                ResolveEvent::Exhausted { .. } => "exhausted",
                ResolveEvent::Cancelled { .. } => "cancelled",
            };
            self.events.borrow_mut().push(tag.to_string());
        }
    }

    fn candidates(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_candidate_list_issues_no_queries() {
        let registry = StubRegistry::empty();
        let outcome = resolve(&registry, &[], &CancelToken::new(), &NullObserver);
        assert!(matches!(outcome, Resolution::NotFound));
        assert_eq!(registry.query_count(), 0);
    }

    #[test]
    fn stops_at_first_matching_candidate() {
        let registry = StubRegistry::matching("c3");
        let list = candidates(&["c1", "c2", "c3", "c4", "c5"]);
        let outcome = resolve(&registry, &list, &CancelToken::new(), &NullObserver);
        match outcome {
            Resolution::Matched(record) => {
                assert_eq!(record.ndc.as_deref(), Some("c3"));
            }
            other => panic!("expected match, got {other:?}"),
        }
        assert_eq!(registry.query_count(), 3);
    }

    #[test]
    fn transport_failure_does_not_abort_the_walk() {
        let mut registry = StubRegistry::matching("c3");
        registry.fail_on = vec!["c1".to_string(), "c2".to_string()];
        let list = candidates(&["c1", "c2", "c3"]);
        let outcome = resolve(&registry, &list, &CancelToken::new(), &NullObserver);
        assert!(matches!(outcome, Resolution::Matched(_)));
        assert_eq!(registry.query_count(), 3);
    }

    #[test]
    fn exhausted_walk_returns_not_found() {
        let registry = StubRegistry::empty();
        let observer = RecordingObserver::new();
        let list = candidates(&["c1", "c2"]);
        let outcome = resolve(&registry, &list, &CancelToken::new(), &observer);
        assert!(matches!(outcome, Resolution::NotFound));
        assert_eq!(
            *observer.events.borrow(),
            vec!["tried", "tried", "exhausted"]
        );
    }

    #[test]
    fn cancellation_preempts_the_walk_and_skips_exhausted() {
        let registry = StubRegistry::matching("c1");
        let observer = RecordingObserver::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let list = candidates(&["c1", "c2"]);
        let outcome = resolve(&registry, &list, &cancel, &observer);
        assert!(matches!(outcome, Resolution::Cancelled));
        assert_eq!(registry.query_count(), 0);
        assert_eq!(*observer.events.borrow(), vec!["cancelled"]);
    }

    #[test]
    fn matched_walk_emits_tried_then_matched() {
        let registry = StubRegistry::matching("c2");
        let observer = RecordingObserver::new();
        let list = candidates(&["c1", "c2"]);
        let _ = resolve(&registry, &list, &CancelToken::new(), &observer);
        assert_eq!(*observer.events.borrow(), vec!["tried", "matched"]);
    }

    #[test]
    fn retail_fallback_requires_retail_symbology() {
        let retail = StubRetail::with_product("Ibuprofen 200mg Caplets");
        let pharma_scan = ScannedCode::new("50580045850", Symbology::DataMatrix);
        assert!(resolve_retail(&retail, &pharma_scan).is_none());
        assert!(retail.queries.borrow().is_empty());

        let retail_scan = ScannedCode::new("036000291452", Symbology::UpcA);
        assert!(resolve_retail(&retail, &retail_scan).is_some());
    }

    #[test]
    fn retail_fallback_is_keyed_by_raw_code() {
        let retail = StubRetail::with_product("Ibuprofen 200mg Caplets");
        let scan = ScannedCode::new("036000291452", Symbology::UpcA);
        let _ = resolve_retail(&retail, &scan);
        assert_eq!(*retail.queries.borrow(), vec!["036000291452".to_string()]);
    }

    #[test]
    fn retail_draft_carries_the_named_defaults() {
        let product = RetailProduct {
            title: "Ibuprofen 200mg Caplets".into(),
            brand: Some("Advil".into()),
            upc: "036000291452".into(),
        };
        let draft = draft_from_retail(&product, None);
        assert_eq!(draft.provenance, Provenance::Barcode);
        assert_eq!(draft.fields.dosage.as_deref(), Some(RETAIL_DEFAULT_DOSAGE));
        assert_eq!(
            draft.fields.frequency.as_deref(),
            Some(RETAIL_DEFAULT_FREQUENCY)
        );
        assert_eq!(draft.fields.route.as_deref(), Some(RETAIL_DEFAULT_ROUTE));
    }

    #[test]
    fn record_draft_scores_by_registry_completeness() {
        let record = DrugRecord {
            brand_name: Some("Prinivil".into()),
            generic_name: Some("Lisinopril".into()),
            dosage_form: Some("Tablet".into()),
            routes: vec!["Oral".into()],
            ingredients: vec![crate::models::registry::ActiveIngredient {
                name: "Lisinopril".into(),
                strength: Some("10 mg/1".into()),
            }],
            ndc: Some("50580-0458".into()),
        };
        let draft = draft_from_record(&record, Some("scan-42.jpg".into()));
        assert_eq!(draft.provenance, Provenance::Barcode);
        assert_eq!(draft.confidence, 100);
        assert_eq!(draft.fields.name.as_deref(), Some("Prinivil"));
        assert_eq!(draft.fields.dosage.as_deref(), Some("10 mg/1"));
        assert_eq!(draft.fields.route.as_deref(), Some("Oral"));
        assert_eq!(draft.source_image.as_deref(), Some("scan-42.jpg"));
    }

    #[test]
    fn scan_falls_back_to_retail_when_registry_misses() {
        let registry = StubRegistry::empty();
        let retail = StubRetail::with_product("Ibuprofen 200mg Caplets");
        let scan = ScannedCode::new("036000291452", Symbology::UpcA);
        let outcome = resolve_scan(
            &registry,
            &retail,
            &scan,
            &CancelToken::new(),
            &NullObserver,
            None,
        );
        match outcome {
            ScanOutcome::Resolved(draft) => {
                assert_eq!(
                    draft.fields.name.as_deref(),
                    Some("Ibuprofen 200mg Caplets")
                );
            }
            other => panic!("expected resolved draft, got {other:?}"),
        }
        // Every NDC candidate was tried before the fallback.
        assert!(registry.query_count() > 0);
    }

    #[test]
    fn scan_with_nothing_anywhere_is_not_found() {
        let registry = StubRegistry::empty();
        let retail = StubRetail::empty();
        let scan = ScannedCode::new("036000291452", Symbology::UpcA);
        let outcome = resolve_scan(
            &registry,
            &retail,
            &scan,
            &CancelToken::new(),
            &NullObserver,
            None,
        );
        assert!(matches!(outcome, ScanOutcome::NotFound));
    }

    /// Shared buffer writer so fmt subscriber output can be inspected.
    #[derive(Clone)]
    struct CaptureWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn tracing_observer_reports_misses_and_matches() {
        let buffer = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(CaptureWriter(buffer.clone()))
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let registry = StubRegistry::matching("c2");
            let list = candidates(&["c1", "c2"]);
            let _ = resolve(&registry, &list, &CancelToken::new(), &TracingObserver);
        });

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(output.contains("registry candidate missed"), "{output}");
        assert!(output.contains("registry candidate matched"), "{output}");
        assert!(output.contains("c1"), "{output}");
        assert!(output.contains("c2"), "{output}");
    }

    #[test]
    fn cancelled_scan_is_not_reported_as_not_found() {
        let registry = StubRegistry::empty();
        let retail = StubRetail::with_product("Anything");
        let cancel = CancelToken::new();
        cancel.cancel();
        let scan = ScannedCode::new("036000291452", Symbology::UpcA);
        let outcome = resolve_scan(&registry, &retail, &scan, &cancel, &NullObserver, None);
        assert!(matches!(outcome, ScanOutcome::Cancelled));
        // The retail fallback must not run for an aborted scan either.
        assert!(retail.queries.borrow().is_empty());
    }
}
