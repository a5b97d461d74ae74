pub mod config;
pub mod models;
pub mod pipeline;

pub use config::PipelineConfig;
pub use models::medication::{Annotation, DraftFields, FieldKind, MedicationDraft, Provenance};
pub use models::registry::{ActiveIngredient, DrugRecord, RetailProduct};
pub use models::scan::{BoundingBox, RecognizedPage, RecognizedWord, ScannedCode, Symbology};
pub use pipeline::annotate::map_annotations;
pub use pipeline::extract::extract;
pub use pipeline::ndc::normalize;
pub use pipeline::registry_client::{NdcDirectoryClient, RetailProductClient};
pub use pipeline::resolver::{
    resolve, resolve_retail, resolve_scan, CancelToken, DrugRegistry, NullObserver, Resolution,
    ResolveEvent, ResolveObserver, RetailRegistry, ScanOutcome, TracingObserver,
};
pub use pipeline::{capture_from_text, CapturedMedication, RegistryError};
