//! # Audio Backend
//!
//! Narrow interface to whatever actually plays audio. The playback
//! controller is the only component that talks to a backend.
//!
//! Playback status is an explicit query ([`AudioBackend::status`]) rather
//! than something inferred from side effects, so a paused track is never
//! mistaken for a finished one.
//!
//! Implementations:
//! - [`crate::mpd_backend::MpcBackend`] - MPD via the `mpc` command-line client
//! - [`SimulatedBackend`] - in-process stand-in for dry runs

use anyhow::{bail, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// What the backend is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Nothing loaded, or the loaded track has finished.
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Audio output collaborator.
///
/// Every fallible method reports failure through `Result` and never panics.
/// The controller logs those errors and keeps its last known-good state, so
/// an implementation must leave the current track playing when `load` or
/// `play` fails for a new one.
pub trait AudioBackend {
    /// Loads `track`, replacing whatever was loaded. Does not start playback.
    ///
    /// # Errors
    ///
    /// Returns an error if the track cannot be opened or queued. The
    /// previously loaded track must be unaffected in that case.
    fn load(&mut self, track: &Path) -> Result<()>;

    /// Starts the loaded track from the beginning.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;

    /// Sets output volume, `volume` in `[0.0, 1.0]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output has no adjustable volume. Playback is
    /// expected to continue at whatever level the output uses.
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    fn status(&mut self) -> Result<PlaybackStatus>;

    /// Stops playback and frees the device. Must be safe to call twice.
    fn release(&mut self);

    fn is_playing(&mut self) -> Result<bool> {
        Ok(self.status()? == PlaybackStatus::Playing)
    }
}

/// Backend that plays nothing but keeps track of what it would be doing.
///
/// Loading a path that is not an existing file fails, mirroring a real
/// mixer rejecting an unreadable resource.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    loaded: Option<PathBuf>,
    status: PlaybackStatus,
    volume: f32,
    released: bool,
}

impl SimulatedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn loaded(&self) -> Option<&Path> {
        self.loaded.as_deref()
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Marks the current track as having played to the end.
    pub fn finish_track(&mut self) {
        self.status = PlaybackStatus::Stopped;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.released {
            bail!("Audio backend has been released");
        }
        Ok(())
    }
}

impl AudioBackend for SimulatedBackend {
    fn load(&mut self, track: &Path) -> Result<()> {
        self.ensure_open()?;
        if !track.is_file() {
            bail!("Cannot load {}: no such file", track.display());
        }
        debug!("[simulated] loaded {}", track.display());
        self.loaded = Some(track.to_path_buf());
        self.status = PlaybackStatus::Stopped;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.loaded.is_none() {
            bail!("Nothing loaded");
        }
        self.status = PlaybackStatus::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.status == PlaybackStatus::Paused {
            self.status = PlaybackStatus::Playing;
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.ensure_open()?;
        self.volume = volume.clamp(0.0, 1.0);
        Ok(())
    }

    fn status(&mut self) -> Result<PlaybackStatus> {
        Ok(self.status)
    }

    fn release(&mut self) {
        if !self.released {
            info!("[simulated] audio released");
        }
        self.released = true;
        self.loaded = None;
        self.status = PlaybackStatus::Stopped;
    }
}
