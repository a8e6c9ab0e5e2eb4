use crate::error::{PipelineError, PipelineResult};
use crate::models::capture_types::{CapturedImage, EncodeOptions, ImageSource, PayloadReport};
use crate::services::encode_service;
use crate::services::pipeline::encode_off_thread;
use std::path::Path;
use tracing::info;

/// Encode `path` the way a run would and report how big the request gets.
/// With `out`, the encoded JPEG is written there too.
pub async fn inspect_payload(
    path: &Path,
    options: EncodeOptions,
    out: Option<&Path>,
) -> PipelineResult<PayloadReport> {
    let image = CapturedImage::new(path, ImageSource::Library);
    let payload = encode_off_thread(&image, options).await?;
    let report = encode_service::payload_report(&payload)?;

    if let Some(out) = out {
        tokio::fs::write(out, &payload.jpeg).await.map_err(|e| {
            PipelineError::encode(format!("Failed to write {}: {}", out.display(), e))
        })?;
        info!(out = %out.display(), "wrote encoded JPEG");
    }

    Ok(report)
}

pub fn render_report(report: &PayloadReport) -> String {
    format!(
        concat!(
            "Dimensions: {}x{}\n",
            "JPEG bytes: {}\n",
            "Base64 characters: {}\n",
            "Base64 overhead: {} bytes\n",
            "Request body: {} bytes ({:.6} MB)\n",
        ),
        report.width,
        report.height,
        report.jpeg_bytes,
        report.base64_chars,
        report.base64_overhead,
        report.request_body_bytes,
        report.request_body_bytes as f64 / (1024.0 * 1024.0)
    )
}
