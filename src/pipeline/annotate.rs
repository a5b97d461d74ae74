//! Maps extracted field values back onto recognition engine word boxes for
//! the verification overlay.
//!
//! OCR engines split tokens unpredictably ("10mg" may arrive as "10" + "mg"),
//! so attribution uses containment, not equality: a word belongs to a field
//! when its normalized text is a non-empty substring of the field's
//! normalized value. Output is display-only and recomputed whenever the draft
//! or word list changes; nothing here is persisted.

use crate::models::medication::{Annotation, FieldKind, MedicationDraft};
use crate::models::scan::RecognizedWord;

/// Fixed overlay color per field, in field order. The legend shows every
/// populated field, so fields with no matching words still get an entry.
const FIELD_COLORS: &[(FieldKind, &str)] = &[
    (FieldKind::Name, "#2e7d32"),
    (FieldKind::Dosage, "#1565c0"),
    (FieldKind::Frequency, "#ef6c00"),
    (FieldKind::Route, "#6a1b9a"),
    (FieldKind::Quantity, "#00838f"),
    (FieldKind::Instructions, "#5d4037"),
    (FieldKind::Prescriber, "#546e7a"),
];

/// Lowercase and drop everything non-alphanumeric, so "10mg," and "10 MG"
/// compare equal.
fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Build highlight annotations for every populated field of a draft.
///
/// Fields absent from the draft produce no annotation at all; populated
/// fields with zero attributed words are emitted with an empty box list so
/// the legend can show "no visual match" instead of silently dropping them.
pub fn map_annotations(draft: &MedicationDraft, words: &[RecognizedWord]) -> Vec<Annotation> {
    FIELD_COLORS
        .iter()
        .filter_map(|&(field, color)| {
            let value = draft.fields.value(field)?;
            let field_text = normalize_text(value);
            let boxes = words
                .iter()
                .filter(|word| {
                    let word_text = normalize_text(&word.text);
                    !word_text.is_empty() && field_text.contains(&word_text)
                })
                .map(|word| word.bounds)
                .collect();
            Some(Annotation {
                field,
                color,
                boxes,
            })
        })
        .collect()
}
