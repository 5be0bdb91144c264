//! # Frame Sources
//!
//! The frame loop pulls frames one at a time from a [`FrameSource`]; `None`
//! means the stream is over and the loop ends normally.
//!
//! [`ImageSequenceSource`] replays a directory of still images in file-name
//! order, which is how recorded camera sessions are fed to the player.

use crate::frame::Frame;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Default capture resolution requested from a source.
pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Ordered producer of video frames.
pub trait FrameSource {
    /// Next frame, or `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Releases the device or files. Must be safe to call twice.
    fn release(&mut self);
}

/// Frames read from a directory of image files, sorted by file name.
#[derive(Debug)]
pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
    position: usize,
    requested: (u32, u32),
    released: bool,
}

impl ImageSequenceSource {
    /// Lists the images in `dir`.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be read or holds no images; this is
    /// the startup failure that keeps the loop from ever starting.
    pub fn open(dir: &Path, requested_width: u32, requested_height: u32) -> Result<Self> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to open frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();

        if files.is_empty() {
            bail!("No image frames (png, jpg, bmp) found in {}", dir.display());
        }
        files.sort();

        info!("Opened {} frame(s) from {}", files.len(), dir.display());
        Ok(Self {
            files,
            position: 0,
            requested: (requested_width, requested_height),
            released: false,
        })
    }

    /// Number of frames in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.released {
            return Ok(None);
        }
        let Some(path) = self.files.get(self.position) else {
            return Ok(None);
        };

        let image = image::open(path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?
            .to_rgb8();

        // requested resolution is best-effort
        if image.dimensions() != self.requested {
            let (w, h) = image.dimensions();
            debug!(
                "Frame {} is {w}x{h}, requested {}x{}",
                path.display(),
                self.requested.0,
                self.requested.1
            );
        }

        let frame = Frame::from_image(image, self.position);
        self.position += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        if !self.released {
            debug!("Frame source released after {} frame(s)", self.position);
        }
        self.released = true;
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
