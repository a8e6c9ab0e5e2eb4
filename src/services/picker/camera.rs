use crate::error::{PipelineError, PipelineResult};
use crate::models::capture_types::{Acquisition, CapturedImage, ImageSource};
use tokio::process::Command;
use tracing::{info, warn};

const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Captures a frame by running an external command, e.g.
/// `fswebcam --no-banner {output}` or `libcamera-still -o {output}`.
///
/// The command line is split on whitespace; quoting is not supported. If the
/// placeholder is missing the output path is appended as the last argument.
#[derive(Debug, Clone)]
pub struct CommandCamera {
    command: String,
}

impl CommandCamera {
    pub fn new(command: impl Into<String>) -> PipelineResult<Self> {
        let command = command.into();
        if command.split_whitespace().next().is_none() {
            return Err(PipelineError::config("camera command is empty"));
        }
        Ok(Self { command })
    }

    fn argv(&self, output: &str) -> Vec<String> {
        let mut argv: Vec<String> = self
            .command
            .split_whitespace()
            .map(|part| part.replace(OUTPUT_PLACEHOLDER, output))
            .collect();
        if !self.command.contains(OUTPUT_PLACEHOLDER) {
            argv.push(output.to_string());
        }
        argv
    }

    /// Run the capture command into a scratch file.
    ///
    /// A command that cannot be started means the camera is not reachable and
    /// is reported as a permission problem. A non-zero exit or an empty frame
    /// is treated as the user backing out.
    pub async fn capture(&self) -> PipelineResult<Acquisition> {
        let scratch = tempfile::Builder::new()
            .prefix("recycle-lens-capture-")
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| {
                PipelineError::permission_denied(format!("cannot create capture file: {}", e))
            })?
            .into_temp_path();

        let output = scratch.to_string_lossy().to_string();
        let argv = self.argv(&output);
        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => return Err(PipelineError::config("camera command is empty")),
        };

        info!(program = %program, "launching camera capture");
        let status = Command::new(program)
            .args(args)
            .status()
            .await
            .map_err(|e| {
                PipelineError::permission_denied(format!(
                    "cannot start camera command '{}': {}",
                    program, e
                ))
            })?;

        if !status.success() {
            warn!(?status, "camera capture exited without a frame");
            return Ok(Acquisition::Cancelled);
        }

        let captured_bytes = tokio::fs::metadata(&scratch)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if captured_bytes == 0 {
            warn!("camera capture produced an empty frame");
            return Ok(Acquisition::Cancelled);
        }

        let image = CapturedImage::from_scratch(scratch, ImageSource::Camera).await;
        Ok(Acquisition::Captured(image))
    }
}
