//! Confidence scoring for medication drafts.
//!
//! Two fixed weight tables, each summing to 100 so the score is structurally
//! bounded: one over extracted free-text fields, one over registry-record
//! completeness. A present field contributes its full weight, an absent one
//! contributes zero. Pure and deterministic.

use crate::models::medication::{DraftFields, FieldKind};
use crate::models::registry::DrugRecord;

/// Named score cutoffs used by callers and the review screen.
pub mod thresholds {
    /// Below this: extraction likely failed outright.
    pub const VERY_LOW: u8 = 25;

    /// Below this: flag the draft "needs manual verification". Drafts below
    /// the cutoff are flagged, never discarded.
    pub const REVIEW: u8 = 60;

    /// At or above this: high confidence, no special flagging.
    pub const HIGH: u8 = 85;
}

/// Weights for free-text extracted fields. Name is the anchor of the whole
/// record and weighs heaviest; administrative fields trail.
const FIELD_WEIGHTS: &[(FieldKind, u8)] = &[
    (FieldKind::Name, 30),
    (FieldKind::Dosage, 15),
    (FieldKind::Route, 15),
    (FieldKind::Frequency, 15),
    (FieldKind::Quantity, 10),
    (FieldKind::Instructions, 10),
    (FieldKind::Prescriber, 5),
];

/// Registry completeness weights for barcode-resolved drafts.
const RECORD_WEIGHT_NAME: u8 = 40;
const RECORD_WEIGHT_DOSAGE_FORM: u8 = 20;
const RECORD_WEIGHT_ROUTES: u8 = 20;
const RECORD_WEIGHT_INGREDIENTS: u8 = 20;

/// Score an extracted field set, 0–100.
pub fn score_fields(fields: &DraftFields) -> u8 {
    FIELD_WEIGHTS
        .iter()
        .filter(|(kind, _)| fields.value(*kind).is_some())
        .map(|(_, weight)| weight)
        .sum()
}

/// Score a resolved registry record by completeness, 0–100. Barcode drafts
/// use this instead of the free-text table: the registry either has a datum
/// or it does not, and the field strings are derived rather than extracted.
pub fn score_record(record: &DrugRecord) -> u8 {
    let mut score = 0;
    if record.display_name().is_some() {
        score += RECORD_WEIGHT_NAME;
    }
    if record.dosage_form.is_some() {
        score += RECORD_WEIGHT_DOSAGE_FORM;
    }
    if !record.routes.is_empty() {
        score += RECORD_WEIGHT_ROUTES;
    }
    if !record.ingredients.is_empty() {
        score += RECORD_WEIGHT_INGREDIENTS;
    }
    score
}
