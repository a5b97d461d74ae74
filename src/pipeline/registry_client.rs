//! HTTP clients for the external drug and retail product registries.
//!
//! Both clients are `reqwest::blocking` with a per-client timeout and typed
//! response structs; the resolver only ever sees the `DrugRegistry` /
//! `RetailRegistry` traits. Zero results is a normal `Ok` outcome everywhere
//! — the openFDA directory even reports it as HTTP 404, which is mapped back
//! to "no match" rather than an error.

use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::models::registry::{ActiveIngredient, DrugRecord, RetailProduct};
use crate::pipeline::resolver::{DrugRegistry, RetailRegistry};
use crate::pipeline::RegistryError;

fn map_transport_error(e: reqwest::Error, base_url: &str, timeout_secs: u64) -> RegistryError {
    if e.is_connect() {
        RegistryError::Connection(base_url.to_string())
    } else if e.is_timeout() {
        RegistryError::Timeout(timeout_secs)
    } else {
        RegistryError::Http(e.to_string())
    }
}

/// openFDA NDC directory client.
pub struct NdcDirectoryClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    result_limit: u32,
}

impl NdcDirectoryClient {
    pub fn new(base_url: &str, timeout_secs: u64, result_limit: u32) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
            result_limit,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            &config.ndc_directory_url,
            config.lookup_timeout_secs,
            config.result_limit,
        )
    }
}

/// Response body from the NDC directory search endpoint.
#[derive(Deserialize)]
struct NdcSearchResponse {
    #[serde(default)]
    results: Vec<NdcRow>,
}

#[derive(Deserialize)]
struct NdcRow {
    #[serde(default)]
    brand_name: Option<String>,
    #[serde(default)]
    generic_name: Option<String>,
    #[serde(default)]
    dosage_form: Option<String>,
    #[serde(default)]
    route: Vec<String>,
    #[serde(default)]
    active_ingredients: Vec<NdcIngredient>,
    #[serde(default)]
    product_ndc: Option<String>,
}

#[derive(Deserialize)]
struct NdcIngredient {
    name: String,
    #[serde(default)]
    strength: Option<String>,
}

impl From<NdcRow> for DrugRecord {
    fn from(row: NdcRow) -> Self {
        DrugRecord {
            brand_name: row.brand_name,
            generic_name: row.generic_name,
            dosage_form: row.dosage_form,
            routes: row.route,
            ingredients: row
                .active_ingredients
                .into_iter()
                .map(|i| ActiveIngredient {
                    name: i.name,
                    strength: i.strength,
                })
                .collect(),
            ndc: row.product_ndc,
        }
    }
}

impl DrugRegistry for NdcDirectoryClient {
    fn query(&self, candidate: &str) -> Result<Vec<DrugRecord>, RegistryError> {
        let url = format!("{}/drug/ndc.json", self.base_url);
        let search = format!("product_ndc:\"{candidate}\"");
        let limit = self.result_limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("search", search.as_str()), ("limit", limit.as_str())])
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        // The directory reports an empty result set as 404 NOT_FOUND.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: NdcSearchResponse = response
            .json()
            .map_err(|e| RegistryError::ResponseParsing(e.to_string()))?;

        Ok(parsed.results.into_iter().map(DrugRecord::from).collect())
    }
}

/// Generic UPC product database client (UPCitemdb-style lookup endpoint).
pub struct RetailProductClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl RetailProductClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.retail_lookup_url, config.lookup_timeout_secs)
    }
}

#[derive(Deserialize)]
struct UpcLookupResponse {
    #[serde(default)]
    items: Vec<UpcItem>,
}

#[derive(Deserialize)]
struct UpcItem {
    title: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    upc: Option<String>,
}

impl RetailRegistry for RetailProductClient {
    fn query(&self, code: &str) -> Result<Option<RetailProduct>, RegistryError> {
        let url = format!("{}/prod/trial/lookup", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("upc", code)])
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        // Unknown or malformed codes come back 404/400; both mean "no product".
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::BAD_REQUEST {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UpcLookupResponse = response
            .json()
            .map_err(|e| RegistryError::ResponseParsing(e.to_string()))?;

        Ok(parsed.items.into_iter().next().map(|item| RetailProduct {
            title: item.title,
            brand: item.brand,
            upc: item.upc.unwrap_or_else(|| code.to_string()),
        }))
    }
}
