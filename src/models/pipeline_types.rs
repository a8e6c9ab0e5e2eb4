use crate::error::ErrorKind;
use crate::models::classify_types::ClassificationResult;
use serde::Serialize;

/// Progress of the live run, as seen by the presentation layer.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    Acquiring,
    Encoding,
    Submitting,
    AwaitingResponse,
    Succeeded(ClassificationResult),
    Failed(ErrorKind),
}

impl PipelineState {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            PipelineState::Acquiring
                | PipelineState::Encoding
                | PipelineState::Submitting
                | PipelineState::AwaitingResponse
        )
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum RunOutcome {
    Classified(ClassificationResult),
    Cancelled,
}
