//! Image acquisition collaborators.
//!
//! The host decides how a photo is captured or picked; the pipeline only sees
//! the [`ImagePicker`] seam and the three possible outcomes: an image, a
//! cancellation, or a permission denial.

pub mod camera;
pub mod library;

use crate::error::{PipelineError, PipelineResult};
use crate::models::capture_types::{Acquisition, ImageSource};
use async_trait::async_trait;
use tracing::info;

pub use camera::CommandCamera;
pub use library::{DirectoryLibrary, Library};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn request_camera_permission(&self) -> PermissionStatus;

    /// Open the capture UI. Only errors with `PermissionDenied`.
    async fn launch_camera(&self) -> PipelineResult<Acquisition>;

    async fn launch_library(&self) -> Acquisition;
}

/// Ask for camera permission, then capture a frame.
pub async fn acquire_from_camera<P: ImagePicker + ?Sized>(
    picker: &P,
) -> PipelineResult<Acquisition> {
    if picker.request_camera_permission().await != PermissionStatus::Granted {
        info!("camera permission denied");
        return Err(PipelineError::permission_denied("camera access was not granted"));
    }
    let acquisition = picker.launch_camera().await?;
    log_acquisition(ImageSource::Camera, &acquisition);
    Ok(acquisition)
}

pub async fn acquire_from_library<P: ImagePicker + ?Sized>(picker: &P) -> Acquisition {
    let acquisition = picker.launch_library().await;
    log_acquisition(ImageSource::Library, &acquisition);
    acquisition
}

fn log_acquisition(source: ImageSource, acquisition: &Acquisition) {
    match acquisition {
        Acquisition::Captured(image) => info!(
            ?source,
            path = %image.path().display(),
            dimensions = ?image.dimensions,
            "image acquired"
        ),
        Acquisition::Cancelled => info!(?source, "picker cancelled"),
    }
}

/// Picker for desktop use: an external capture command for the camera and a
/// directory (or a fixed file) for the library.
pub struct DesktopPicker {
    camera: Option<CommandCamera>,
    library: Library,
}

impl DesktopPicker {
    pub fn new(camera: Option<CommandCamera>, library: Library) -> Self {
        Self { camera, library }
    }
}

#[async_trait]
impl ImagePicker for DesktopPicker {
    async fn request_camera_permission(&self) -> PermissionStatus {
        if self.camera.is_some() {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn launch_camera(&self) -> PipelineResult<Acquisition> {
        match &self.camera {
            Some(camera) => camera.capture().await,
            None => Err(PipelineError::permission_denied("no camera configured")),
        }
    }

    async fn launch_library(&self) -> Acquisition {
        self.library.pick().await
    }
}
