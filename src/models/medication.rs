use serde::{Deserialize, Serialize};

use super::scan::BoundingBox;

/// Where a draft came from: barcode resolution or free-text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Barcode,
    Ocr,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Barcode => "barcode",
            Provenance::Ocr => "ocr",
        }
    }
}

/// The seven draft fields, named. Used by the annotation mapper's color table
/// and by anything that iterates fields generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Name,
    Dosage,
    Frequency,
    Route,
    Quantity,
    Instructions,
    Prescriber,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Name,
        FieldKind::Dosage,
        FieldKind::Frequency,
        FieldKind::Route,
        FieldKind::Quantity,
        FieldKind::Instructions,
        FieldKind::Prescriber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Name => "name",
            FieldKind::Dosage => "dosage",
            FieldKind::Frequency => "frequency",
            FieldKind::Route => "route",
            FieldKind::Quantity => "quantity",
            FieldKind::Instructions => "instructions",
            FieldKind::Prescriber => "prescriber",
        }
    }
}

/// Field values extracted for one medication, before scoring. A field the
/// extractor (or registry) produced nothing for stays `None` — never an empty
/// string — so scoring and the review screen can tell "not found" from
/// "found empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftFields {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub route: Option<String>,
    pub quantity: Option<String>,
    pub instructions: Option<String>,
    pub prescriber: Option<String>,
}

impl DraftFields {
    pub fn is_empty(&self) -> bool {
        self.populated().next().is_none()
    }

    /// Iterate the populated fields in fixed field order.
    pub fn populated(&self) -> impl Iterator<Item = (FieldKind, &str)> {
        FieldKind::ALL
            .into_iter()
            .filter_map(move |kind| self.value(kind).map(|v| (kind, v)))
    }

    pub fn value(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::Name => self.name.as_deref(),
            FieldKind::Dosage => self.dosage.as_deref(),
            FieldKind::Frequency => self.frequency.as_deref(),
            FieldKind::Route => self.route.as_deref(),
            FieldKind::Quantity => self.quantity.as_deref(),
            FieldKind::Instructions => self.instructions.as_deref(),
            FieldKind::Prescriber => self.prescriber.as_deref(),
        }
    }

    /// Promote to a full draft with provenance and confidence. Pure: the same
    /// fields always yield the same draft. Record identity and capture time
    /// belong to the persistence layer outside this core.
    pub fn into_draft(
        self,
        provenance: Provenance,
        confidence: u8,
        source_image: Option<String>,
    ) -> MedicationDraft {
        MedicationDraft {
            fields: self,
            provenance,
            confidence,
            source_image,
        }
    }
}

/// The pipeline's output unit: one candidate medication awaiting human
/// verification. Created fresh per scan; the pipeline never mutates it after
/// scoring, and rebuilding from the same inputs reproduces it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationDraft {
    pub fields: DraftFields,
    pub provenance: Provenance,
    /// 0–100.
    pub confidence: u8,
    /// Reference to the source image (opaque to this crate).
    pub source_image: Option<String>,
}

/// Highlight region set for one draft field: display-only, recomputed on
/// demand, never persisted (hence serialize-only).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub field: FieldKind,
    /// Hex color for the overlay, from the fixed field→color table.
    pub color: &'static str,
    pub boxes: Vec<BoundingBox>,
}
