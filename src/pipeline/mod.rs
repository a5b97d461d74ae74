pub mod annotate;
pub mod confidence;
pub mod extract;
pub mod ndc;
pub mod registry_client;
pub mod resolver;

use thiserror::Error;

use crate::models::medication::{Annotation, MedicationDraft, Provenance};
use crate::models::scan::RecognizedPage;

/// Transport/protocol failure from a registry lookup. Inside the resolver's
/// candidate loop these are logged and treated as a non-match for that
/// candidate only; they never abort the remaining candidates.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Cannot reach registry at {0}")]
    Connection(String),

    #[error("Registry request timed out after {0}s")]
    Timeout(u64),

    #[error("Registry returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Registry response could not be parsed: {0}")]
    ResponseParsing(String),
}

/// One scored, annotated medication candidate from the OCR path.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedMedication {
    pub draft: MedicationDraft,
    pub annotations: Vec<Annotation>,
}

/// Run the whole label-photo path on recognition engine output:
/// extract → score → promote → annotate. Empty recognized text yields an
/// empty list ("nothing detected"), not an error.
pub fn capture_from_text(
    page: &RecognizedPage,
    source_image: Option<String>,
) -> Vec<CapturedMedication> {
    let blocks = extract::extract(&page.text);
    tracing::debug!(blocks = blocks.len(), "label text extracted");

    blocks
        .into_iter()
        .map(|fields| {
            let score = confidence::score_fields(&fields);
            let draft = fields.into_draft(Provenance::Ocr, score, source_image.clone());
            let annotations = annotate::map_annotations(&draft, &page.words);
            CapturedMedication { draft, annotations }
        })
        .collect()
}
