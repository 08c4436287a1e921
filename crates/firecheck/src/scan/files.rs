//! Still images served as a camera.
//!
//! Lets the scan loop run on photos of labels (one file or a directory of
//! them) where no live camera is available. Frames are replayed in order and
//! then repeat, like a video that never ends.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::device::{CaptureDevice, Facing, VideoStream};
use super::frame::Frame;
use crate::error::{Error, Result, WorkflowError};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// A capture device backed by image files.
#[derive(Debug, Clone)]
pub struct ImageFiles {
    paths: Vec<PathBuf>,
}

impl ImageFiles {
    /// Serve the given files in order.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// A single image, or every PNG/JPEG in a directory sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist or the directory cannot be
    /// read.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            std::fs::metadata(path)?;
            return Ok(Self::new(vec![path.to_path_buf()]));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file = entry?.path();
            if file.is_file() && is_image(&file) {
                paths.push(file);
            }
        }
        paths.sort();
        Ok(Self::new(paths))
    }

    /// The files this device serves.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

/// Load an image file as an RGBA frame.
///
/// # Errors
///
/// Returns [`Error::ImageRead`] if the file cannot be opened or decoded.
pub fn load_frame(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .map_err(|source| Error::ImageRead {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Frame::from_rgba(width, height, image.into_raw())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

struct StillFrames {
    frames: Vec<Frame>,
    next: usize,
}

impl VideoStream for StillFrames {
    fn current_frame(&mut self) -> Option<Frame> {
        let frame = self.frames.get(self.next)?.clone();
        self.next = (self.next + 1) % self.frames.len();
        Some(frame)
    }
}

#[async_trait::async_trait]
impl CaptureDevice for ImageFiles {
    fn name(&self) -> &'static str {
        "image-files"
    }

    async fn acquire(
        &self,
        facing: Facing,
    ) -> std::result::Result<Box<dyn VideoStream>, WorkflowError> {
        if self.paths.is_empty() {
            return Err(WorkflowError::device_unavailable("no images to scan"));
        }
        let paths = self.paths.clone();
        let frames = tokio::task::spawn_blocking(move || {
            paths.iter().map(|path| load_frame(path)).collect::<Result<Vec<_>>>()
        })
        .await
        .map_err(|e| WorkflowError::device_unavailable(e.to_string()))?
        .map_err(|e| WorkflowError::device_unavailable(e.to_string()))?;

        debug!(frames = frames.len(), facing = %facing, "Loaded still frames");
        Ok(Box::new(StillFrames { frames, next: 0 }))
    }

    fn release(&self, stream: Box<dyn VideoStream>) {
        drop(stream);
    }
}
