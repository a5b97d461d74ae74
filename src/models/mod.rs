pub mod medication;
pub mod registry;
pub mod scan;
