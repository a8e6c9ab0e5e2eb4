pub mod capture_types;
pub mod classify_types;
pub mod pipeline_types;
