//! Pipeline and device configuration.
//!
//! Everything the pipeline needs is injected at construction time; nothing is
//! read from module scope. The binary fills these from flags and
//! `RECYCLE_LENS_*` environment variables.

use crate::error::{PipelineError, PipelineResult};
use crate::models::capture_types::EncodeOptions;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TARGET_SIZE: u32 = 224;
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Settings for encode and submit.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Classifier endpoint
    pub endpoint: Url,
    /// Encoded image width in pixels
    pub target_width: u32,
    /// Encoded image height in pixels
    pub target_height: u32,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Request timeout; `None` leaves the transport defaults in place
    pub request_timeout: Option<Duration>,
}

impl PipelineConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            target_width: DEFAULT_TARGET_SIZE,
            target_height: DEFAULT_TARGET_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            request_timeout: None,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !matches!(self.endpoint.scheme(), "http" | "https") {
            return Err(PipelineError::config(format!(
                "endpoint must be http or https, got '{}'",
                self.endpoint.scheme()
            )));
        }
        if self.target_width == 0 || self.target_height == 0 {
            return Err(PipelineError::config("target dimensions must be non-zero"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PipelineError::config(format!(
                "JPEG quality must be within 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            target_width: self.target_width,
            target_height: self.target_height,
            quality: self.jpeg_quality,
        }
    }
}

/// Settings for the desktop acquisition collaborators.
#[derive(Debug, Clone, Default)]
pub struct DeviceConfig {
    /// Capture command with an `{output}` placeholder, e.g.
    /// `fswebcam --no-banner -r 1280x720 {output}`. Unset means no camera access.
    pub camera_command: Option<String>,
    /// Root of the photo library shown by the gallery picker
    pub library_dir: Option<PathBuf>,
}

pub fn parse_endpoint(raw: &str) -> PipelineResult<Url> {
    Url::parse(raw).map_err(|e| PipelineError::config(format!("invalid endpoint '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig::new(parse_endpoint("https://example.com/prod/classify").unwrap())
    }

    #[test]
    fn defaults_are_square_224() {
        let c = config();
        assert_eq!((c.target_width, c.target_height), (224, 224));
        assert_eq!(c.jpeg_quality, DEFAULT_JPEG_QUALITY);
        assert!(c.request_timeout.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut c = config();
        c.jpeg_quality = 0;
        assert!(c.validate().is_err());

        let mut c = config();
        c.target_height = 0;
        assert!(c.validate().is_err());

        let mut c = config();
        c.endpoint = parse_endpoint("ftp://example.com/").unwrap();
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_unparseable_endpoint() {
        assert!(parse_endpoint("not a url").is_err());
    }
}
