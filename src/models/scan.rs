use serde::{Deserialize, Serialize};

/// Barcode format decoded alongside the raw code value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbology {
    UpcA,
    UpcE,
    Ean13,
    Ean8,
    Code128,
    Code39,
    DataMatrix,
    Other(String),
}

impl Symbology {
    /// Retail point-of-sale formats. Codes in these formats that fail NDC
    /// resolution are eligible for the retail product registry fallback.
    pub fn is_retail(&self) -> bool {
        matches!(
            self,
            Symbology::UpcA | Symbology::UpcE | Symbology::Ean13 | Symbology::Ean8
        )
    }
}

/// A single decoded barcode: raw string plus the symbology the decoder reported.
/// Produced once per scan by the barcode decode engine; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedCode {
    pub raw: String,
    pub symbology: Symbology,
}

impl ScannedCode {
    pub fn new(raw: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            raw: raw.into(),
            symbology,
        }
    }
}

/// Axis-aligned box in source-image pixel space (for highlighting in the
/// verification screen).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// One recognized token from the image recognition engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedWord {
    pub text: String,
    pub bounds: BoundingBox,
    pub confidence: f32,
}

/// Full recognition engine output for one image: the raw text block plus
/// word-level geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedPage {
    pub text: String,
    pub words: Vec<RecognizedWord>,
}
