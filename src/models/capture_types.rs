use image::ImageReader;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Camera,
    Library,
}

/// A reference to image bytes picked by the user.
///
/// Frames captured into a scratch file own that file; it is removed when the
/// image is dropped at the end of the run.
#[derive(Debug)]
pub struct CapturedImage {
    pub path: PathBuf,
    pub source: ImageSource,
    pub dimensions: Option<(u32, u32)>,
    scratch: Option<TempPath>,
}

impl CapturedImage {
    /// Reference `path` without touching the file; `dimensions` stays unknown.
    pub fn new(path: impl Into<PathBuf>, source: ImageSource) -> Self {
        Self {
            path: path.into(),
            source,
            dimensions: None,
            scratch: None,
        }
    }

    /// Like [`CapturedImage::new`], with the dimensions read from the image
    /// header on the blocking pool.
    pub async fn open(path: impl Into<PathBuf>, source: ImageSource) -> Self {
        let mut image = Self::new(path, source);
        let path = image.path.clone();
        image.dimensions = tokio::task::spawn_blocking(move || read_dimensions(&path))
            .await
            .ok()
            .flatten();
        image
    }

    /// Wrap a scratch file that should disappear with the image.
    pub async fn from_scratch(scratch: TempPath, source: ImageSource) -> Self {
        let mut image = Self::open(scratch.to_path_buf(), source).await;
        image.scratch = Some(scratch);
        image
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_dimensions(path: &Path) -> Option<(u32, u32)> {
    ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .ok()
        .and_then(|r| r.into_dimensions().ok())
}

/// Outcome of a picker call: an image or a user cancellation, never both.
#[derive(Debug)]
pub enum Acquisition {
    Captured(CapturedImage),
    Cancelled,
}

impl Acquisition {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Acquisition::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub target_width: u32,
    pub target_height: u32,
    pub quality: u8,
}

/// The resized, recompressed image ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPayload {
    pub jpeg: Vec<u8>,
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

/// Byte accounting for one payload, as it will go over the wire.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PayloadReport {
    pub width: u32,
    pub height: u32,
    pub jpeg_bytes: usize,
    pub base64_chars: usize,
    pub base64_overhead: usize,
    pub request_body_bytes: usize,
}
