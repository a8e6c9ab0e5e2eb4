#![allow(dead_code)]

use async_trait::async_trait;
use recycle_lens_lib::commands::classifier::Notifier;
use recycle_lens_lib::config::PipelineConfig;
use recycle_lens_lib::services::picker::{ImagePicker, PermissionStatus};
use recycle_lens_lib::{Acquisition, CapturedImage, ImageSource, Orchestrator, PipelineResult};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::ResponseTemplate;

/// Picker whose answers are fixed up front. `None` paths mean the user
/// dismissed the picker.
pub struct ScriptedPicker {
    pub permission: PermissionStatus,
    pub camera_frame: Option<PathBuf>,
    pub library_pick: Option<PathBuf>,
    pub camera_launches: Arc<AtomicUsize>,
}

impl ScriptedPicker {
    pub fn library(pick: Option<PathBuf>) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            camera_frame: None,
            library_pick: pick,
            camera_launches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn camera(permission: PermissionStatus, frame: Option<PathBuf>) -> Self {
        Self {
            permission,
            camera_frame: frame,
            library_pick: None,
            camera_launches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ImagePicker for ScriptedPicker {
    async fn request_camera_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn launch_camera(&self) -> PipelineResult<Acquisition> {
        self.camera_launches.fetch_add(1, Ordering::SeqCst);
        Ok(match &self.camera_frame {
            Some(path) => {
                Acquisition::Captured(CapturedImage::new(path.clone(), ImageSource::Camera))
            }
            None => Acquisition::Cancelled,
        })
    }

    async fn launch_library(&self) -> Acquisition {
        match &self.library_pick {
            Some(path) => {
                Acquisition::Captured(CapturedImage::new(path.clone(), ImageSource::Library))
            }
            None => Acquisition::Cancelled,
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub alerts: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

/// A 640x480 photo-like PNG.
pub fn write_photo(dir: &Path, name: &str) -> PathBuf {
    let img = image::RgbImage::from_fn(640, 480, |x, y| {
        image::Rgb([(x / 3) as u8, (y / 2) as u8, ((x + y) % 256) as u8])
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

pub fn config_for(server_uri: &str) -> PipelineConfig {
    let endpoint = format!("{}/prod/recycling-assistant", server_uri);
    PipelineConfig::new(recycle_lens_lib::config::parse_endpoint(&endpoint).unwrap())
}

/// Orchestrator against `server_uri` whose library returns `pick`.
pub fn library_orchestrator(
    server_uri: &str,
    pick: Option<PathBuf>,
) -> Orchestrator<ScriptedPicker> {
    Orchestrator::new(config_for(server_uri), ScriptedPicker::library(pick)).unwrap()
}

/// A 200 classifier reply without per-category scores.
pub fn classified(class: &str, score: f64) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(json!({"predicted_class": class, "confidence_score": score}))
}
