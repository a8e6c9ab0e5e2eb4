//! Classification pipeline orchestrator.
//!
//! One run is acquire → encode → submit → interpret, strictly in sequence.
//! The first failure ends the run; nothing is retried. A second run started
//! while one is in flight is rejected with [`PipelineError::Busy`].

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::capture_types::{
    Acquisition, CapturedImage, EncodeOptions, EncodedPayload, ImageSource,
};
use crate::models::classify_types::ClassificationResult;
use crate::models::pipeline_types::{PipelineState, RunOutcome};
use crate::services::classifier_client::ClassifierClient;
use crate::services::encode_service;
use crate::services::picker::{self, ImagePicker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{error, info};

pub struct Orchestrator<P> {
    config: PipelineConfig,
    client: ClassifierClient,
    picker: P,
    in_flight: AtomicBool,
    state: watch::Sender<PipelineState>,
}

/// Clears the in-flight flag on every exit path of a run. A run dropped
/// before it settled leaves the state at `Idle`.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
    state: &'a watch::Sender<PipelineState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| {
            if state.is_in_flight() {
                *state = PipelineState::Idle;
                true
            } else {
                false
            }
        });
        self.flag.store(false, Ordering::Release);
    }
}

impl<P: ImagePicker> Orchestrator<P> {
    pub fn new(config: PipelineConfig, picker: P) -> PipelineResult<Self> {
        config.validate()?;
        let client = ClassifierClient::new(&config)?;
        let (state, _) = watch::channel(PipelineState::Idle);
        Ok(Self {
            config,
            client,
            picker,
            in_flight: AtomicBool::new(false),
            state,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    /// Follow state changes of every run from here on.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    pub async fn acquire_from_camera(&self) -> PipelineResult<Acquisition> {
        picker::acquire_from_camera(&self.picker).await
    }

    pub async fn acquire_from_library(&self) -> Acquisition {
        picker::acquire_from_library(&self.picker).await
    }

    /// Encode with the configured dimensions and quality.
    pub async fn encode(&self, image: &CapturedImage) -> PipelineResult<EncodedPayload> {
        encode_off_thread(image, self.config.encode_options()).await
    }

    pub async fn submit(&self, payload: &EncodedPayload) -> PipelineResult<ClassificationResult> {
        self.client.submit(payload).await
    }

    /// Drive one image from `source` to a classification.
    pub async fn run_pipeline(&self, source: ImageSource) -> PipelineResult<RunOutcome> {
        let _guard = self.try_begin().ok_or(PipelineError::Busy)?;
        let start = Instant::now();
        info!(?source, "pipeline run started");

        self.set_state(PipelineState::Acquiring);
        let acquisition = match source {
            ImageSource::Camera => self.acquire_from_camera().await,
            ImageSource::Library => Ok(self.acquire_from_library().await),
        };
        let image = match acquisition {
            Ok(Acquisition::Captured(image)) => image,
            Ok(Acquisition::Cancelled) => {
                self.set_state(PipelineState::Idle);
                return Ok(RunOutcome::Cancelled);
            }
            Err(e) => return Err(self.fail(e)),
        };

        self.set_state(PipelineState::Encoding);
        let payload = self.encode(&image).await.map_err(|e| self.fail(e))?;

        self.set_state(PipelineState::Submitting);
        let result = self
            .client
            .submit_observed(&payload, || self.set_state(PipelineState::AwaitingResponse))
            .await
            .map_err(|e| self.fail(e))?;

        info!(
            category = %result.category,
            confidence = result.confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pipeline run succeeded"
        );
        self.set_state(PipelineState::Succeeded(result.clone()));
        Ok(RunOutcome::Classified(result))
    }

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                flag: &self.in_flight,
                state: &self.state,
            })
    }

    fn set_state(&self, state: PipelineState) {
        self.state.send_replace(state);
    }

    fn fail(&self, e: PipelineError) -> PipelineError {
        error!(error = %e, kind = ?e.kind(), "pipeline run failed");
        self.set_state(PipelineState::Failed(e.kind()));
        e
    }
}

/// Run the CPU-bound encode on the blocking pool.
pub async fn encode_off_thread(
    image: &CapturedImage,
    options: EncodeOptions,
) -> PipelineResult<EncodedPayload> {
    let path = image.path().to_path_buf();
    tokio::task::spawn_blocking(move || encode_service::encode_path(&path, options))
        .await
        .map_err(|e| PipelineError::encode(format!("Encode task failed: {}", e)))?
}
