use crate::error::{AppError, ErrorKind, PipelineError};
use crate::models::capture_types::ImageSource;
use crate::models::classify_types::{format_percent, ClassificationResult};
use crate::models::pipeline_types::RunOutcome;
use crate::services::picker::ImagePicker;
use crate::services::pipeline::Orchestrator;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Where user-facing alerts go (a dialog, the terminal, a test recorder).
pub trait Notifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// What the screen currently shows.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct ScreenState {
    pub is_processing: bool,
    pub result: Option<ClassificationResult>,
    pub error: Option<AppError>,
    /// How the latest run failed. Set even when the panel is left untouched,
    /// as for a permission denial.
    pub last_failure: Option<ErrorKind>,
}

impl ScreenState {
    pub fn is_idle(&self) -> bool {
        !self.is_processing && self.result.is_none() && self.error.is_none()
    }

    /// Plain-text rendering of the result panel.
    pub fn render(&self) -> String {
        if let Some(err) = &self.error {
            return format!("Error: {}", err.message);
        }
        let result = match &self.result {
            Some(r) => r,
            None => return String::new(),
        };

        let mut out = format!(
            "Category: {}\nConfidence: {}\n",
            result.category,
            result.confidence_percent()
        );
        let ranked = result.ranked_predictions();
        if !ranked.is_empty() {
            out.push_str("All Predictions:\n");
            for (category, score) in ranked {
                out.push_str(&format!("  {}: {}\n", category, format_percent(score)));
            }
        }
        out
    }
}

/// Presentation controller for the classify screen.
///
/// Button presses while a run is in flight are ignored, which is how the
/// screen keeps to one request at a time. Every pipeline error ends here and
/// becomes a single alert plus an error panel; cancellations are silent.
pub struct ClassifierScreen<P, N> {
    orchestrator: Arc<Orchestrator<P>>,
    notifier: N,
    view: Mutex<ScreenState>,
}

impl<P: ImagePicker, N: Notifier> ClassifierScreen<P, N> {
    pub fn new(orchestrator: Arc<Orchestrator<P>>, notifier: N) -> Self {
        Self {
            orchestrator,
            notifier,
            view: Mutex::new(ScreenState::default()),
        }
    }

    pub fn controls_enabled(&self) -> bool {
        !self.orchestrator.is_busy()
    }

    pub fn snapshot(&self) -> ScreenState {
        let mut state = self.lock_view().clone();
        state.is_processing = self.orchestrator.is_busy();
        state
    }

    pub async fn take_photo(&self) -> ScreenState {
        self.classify(ImageSource::Camera).await
    }

    pub async fn select_from_gallery(&self) -> ScreenState {
        self.classify(ImageSource::Library).await
    }

    async fn classify(&self, source: ImageSource) -> ScreenState {
        if !self.controls_enabled() {
            info!(?source, "ignoring press while a run is in flight");
            return self.snapshot();
        }

        let outcome = self.orchestrator.run_pipeline(source).await;
        match outcome {
            Ok(RunOutcome::Classified(result)) => {
                self.notifier.alert("Done!", &result.summary());
                let mut view = self.lock_view();
                view.result = Some(result);
                view.error = None;
                view.last_failure = None;
            }
            Ok(RunOutcome::Cancelled) => {
                self.lock_view().last_failure = None;
            }
            Err(PipelineError::Busy) => {
                warn!(?source, "run rejected, another run is in flight");
            }
            Err(e @ PipelineError::PermissionDenied(_)) => {
                // Nothing was attempted; keep whatever is already on screen.
                let shown = AppError::from(&e);
                self.notifier.alert(&shown.title, &shown.message);
                self.lock_view().last_failure = Some(e.kind());
            }
            Err(e) => {
                let shown = AppError::from(&e);
                self.notifier.alert(&shown.title, &shown.message);
                let mut view = self.lock_view();
                view.result = None;
                view.error = Some(shown);
                view.last_failure = Some(e.kind());
            }
        }
        self.snapshot()
    }

    fn lock_view(&self) -> std::sync::MutexGuard<'_, ScreenState> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Writes alerts to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, title: &str, message: &str) {
        eprintln!("[{}] {}", title, message);
    }
}
