use crate::models::capture_types::{Acquisition, CapturedImage, ImageSource};
use crate::services::fs_service;
use std::path::PathBuf;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::warn;

const DEFAULT_MAX_DEPTH: usize = 3;

/// Where gallery picks come from.
#[derive(Debug, Clone)]
pub enum Library {
    /// No library available; every pick is a cancellation.
    None,
    /// A file chosen up front, e.g. from the command line.
    Preset(PathBuf),
    Directory(DirectoryLibrary),
}

impl Library {
    pub async fn pick(&self) -> Acquisition {
        match self {
            Library::None => Acquisition::Cancelled,
            Library::Preset(path) => {
                let is_file = tokio::fs::metadata(path)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false);
                if is_file {
                    let image = CapturedImage::open(path.clone(), ImageSource::Library).await;
                    Acquisition::Captured(image)
                } else {
                    warn!(path = %path.display(), "selected file does not exist");
                    Acquisition::Cancelled
                }
            }
            Library::Directory(dir) => {
                let mut stdin = BufReader::new(tokio::io::stdin());
                let mut stdout = tokio::io::stdout();
                dir.pick_from(&mut stdin, &mut stdout).await
            }
        }
    }
}

/// Interactive picker over the images in a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
    max_depth: usize,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub async fn list(&self) -> Vec<PathBuf> {
        let root = self.root.clone();
        let max_depth = self.max_depth;
        tokio::task::spawn_blocking(move || fs_service::list_image_files(&root, max_depth))
            .await
            .unwrap_or_default()
    }

    /// Show a numbered menu on `output` and read one answer from `input`.
    /// A blank answer, an unknown entry, or an empty library cancels.
    pub async fn pick_from<R, W>(&self, input: &mut R, output: &mut W) -> Acquisition
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let images = self.list().await;
        if images.is_empty() {
            warn!(root = %self.root.display(), "no images found in library");
            return Acquisition::Cancelled;
        }

        let mut menu = String::new();
        for (i, path) in images.iter().enumerate() {
            let shown = path.strip_prefix(&self.root).unwrap_or(path);
            menu.push_str(&format!("{:>3}) {}\n", i + 1, shown.display()));
        }
        menu.push_str("Select a photo (number or file name, blank to cancel): ");

        if output.write_all(menu.as_bytes()).await.is_err() || output.flush().await.is_err() {
            return Acquisition::Cancelled;
        }

        let mut answer = String::new();
        if input.read_line(&mut answer).await.is_err() {
            return Acquisition::Cancelled;
        }

        match choose(&images, &answer) {
            Some(path) => {
                Acquisition::Captured(CapturedImage::open(path, ImageSource::Library).await)
            }
            None => Acquisition::Cancelled,
        }
    }
}

/// Resolve a menu answer: a 1-based index or an exact file name.
pub fn choose(images: &[PathBuf], answer: &str) -> Option<PathBuf> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    if let Ok(n) = answer.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| images.get(i)).cloned();
    }
    images
        .iter()
        .find(|p| p.file_name().map(|f| f.to_string_lossy() == answer).unwrap_or(false))
        .cloned()
}
