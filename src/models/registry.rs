use serde::{Deserialize, Serialize};

/// One active ingredient of a registry drug entry: name plus optional strength
/// (e.g., "10 mg/1").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveIngredient {
    pub name: String,
    pub strength: Option<String>,
}

/// A resolved drug registry entry. Every field is optional because registry
/// data is uneven; completeness feeds the confidence score instead of being
/// enforced here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrugRecord {
    pub brand_name: Option<String>,
    pub generic_name: Option<String>,
    pub dosage_form: Option<String>,
    pub routes: Vec<String>,
    pub ingredients: Vec<ActiveIngredient>,
    /// The NDC the registry matched on, when reported.
    pub ndc: Option<String>,
}

impl DrugRecord {
    /// Preferred display name: brand first, generic as fallback.
    pub fn display_name(&self) -> Option<&str> {
        self.brand_name
            .as_deref()
            .or(self.generic_name.as_deref())
    }
}

/// A generic retail product registry entry (UPC/EAN database).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailProduct {
    pub title: String,
    pub brand: Option<String>,
    pub upc: String,
}
