pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::{DeviceConfig, PipelineConfig};
pub use error::{AppError, ErrorKind, PipelineError, PipelineResult};
pub use models::capture_types::{Acquisition, CapturedImage, EncodedPayload, ImageSource};
pub use models::classify_types::{Category, ClassificationResult};
pub use models::pipeline_types::{PipelineState, RunOutcome};
pub use services::pipeline::Orchestrator;
