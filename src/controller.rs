//! # Playback Controller
//!
//! Owns the playback state (current emotion, current track, volume) and is
//! the only thing allowed to drive the [`AudioBackend`].
//!
//! ## Switching Rules
//!
//! [`PlaybackController::maybe_switch`] asks for a new track when the
//! dominant emotion changed, or when the backend reports it is stopped
//! (track finished or never started). A paused track is left alone.
//! [`PlaybackController::skip`] asks unconditionally. Either way the
//! selector never hands back the track that is already playing, so with a
//! single track per emotion a skip is a no-op.
//!
//! ## Failure Policy
//!
//! Backend errors are logged and swallowed here. The state keeps its last
//! known-good values and the caller's frame loop carries on.

use crate::backend::{AudioBackend, PlaybackStatus};
use crate::emotion::EmotionLabel;
use crate::selector::TrackSelector;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Volume used when no usable level is configured.
pub const DEFAULT_VOLUME: f32 = 0.7;

/// Result of a switch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// A new track was loaded and started.
    Switched(PathBuf),
    /// Nothing to do, or nothing to switch to.
    Unchanged,
    /// The backend rejected the new track; previous state kept.
    Failed,
}

/// Playback state machine on top of an audio backend.
#[derive(Debug)]
pub struct PlaybackController<B, R = StdRng> {
    selector: TrackSelector<R>,
    backend: B,
    current_emotion: EmotionLabel,
    current_track: Option<PathBuf>,
    volume: f32,
}

impl<B: AudioBackend, R: Rng> PlaybackController<B, R> {
    /// Creates a controller serving `neutral` with nothing loaded.
    ///
    /// `volume` is clamped to `[0.0, 1.0]`. A NaN or infinite volume falls
    /// back to [`DEFAULT_VOLUME`]. Nothing is sent to the backend until the
    /// first switch.
    pub fn new(selector: TrackSelector<R>, backend: B, volume: f32) -> Self {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            warn!("Initial volume {volume} is not a number; using {DEFAULT_VOLUME}");
            DEFAULT_VOLUME
        };
        Self {
            selector,
            backend,
            current_emotion: EmotionLabel::Neutral,
            current_track: None,
            volume,
        }
    }

    /// Emotion the current track was chosen for. Starts as `neutral` and
    /// only changes when a switch succeeds.
    #[must_use]
    pub fn current_emotion(&self) -> EmotionLabel {
        self.current_emotion
    }

    /// Track last started successfully, if any.
    #[must_use]
    pub fn current_track(&self) -> Option<&Path> {
        self.current_track.as_deref()
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Switches to a track for `emotion` if the emotion changed or playback
    /// has stopped.
    ///
    /// Returns [`SwitchOutcome::Unchanged`] when the same emotion is still
    /// playing (or paused), and also when the library has nothing new for
    /// `emotion`. In that case the current track keeps playing.
    ///
    /// Backend failures never propagate. Loading or starting the new track
    /// failing yields [`SwitchOutcome::Failed`] with emotion and track left
    /// as they were. A refused volume change is only logged.
    ///
    /// # Examples
    ///
    /// ```
    /// use moodplay::backend::SimulatedBackend;
    /// use moodplay::controller::{PlaybackController, SwitchOutcome};
    /// use moodplay::emotion::EmotionLabel;
    /// use moodplay::library::TrackLibrary;
    /// use moodplay::selector::TrackSelector;
    /// use std::sync::Arc;
    ///
    /// // An empty library never has anything to switch to
    /// let selector = TrackSelector::new(Arc::new(TrackLibrary::default()));
    /// let mut controller = PlaybackController::new(selector, SimulatedBackend::new(), 0.7);
    ///
    /// assert_eq!(controller.maybe_switch(EmotionLabel::Sad), SwitchOutcome::Unchanged);
    /// assert_eq!(controller.current_emotion(), EmotionLabel::Neutral);
    /// assert_eq!(controller.current_track(), None);
    /// ```
    pub fn maybe_switch(&mut self, emotion: EmotionLabel) -> SwitchOutcome {
        let status = match self.backend.status() {
            Ok(status) => status,
            Err(e) => {
                warn!("Could not query playback status: {e:#}");
                // Without a status only an emotion change justifies a switch
                PlaybackStatus::Playing
            }
        };

        if emotion == self.current_emotion && status != PlaybackStatus::Stopped {
            return SwitchOutcome::Unchanged;
        }
        self.switch_to(emotion)
    }

    /// Forces a new selection for the current emotion.
    ///
    /// The current track is excluded, so with a single track for the
    /// emotion this returns [`SwitchOutcome::Unchanged`].
    pub fn skip(&mut self) -> SwitchOutcome {
        info!("Skipping to another {} track", self.current_emotion);
        self.switch_to(self.current_emotion)
    }

    /// Pauses when playing, resumes when paused, does nothing otherwise.
    /// Returns the status after the toggle.
    pub fn toggle_pause(&mut self) -> PlaybackStatus {
        if self.current_track.is_none() {
            debug!("Pause toggle ignored: nothing loaded");
            return PlaybackStatus::Stopped;
        }

        let result = match self.backend.status() {
            Ok(PlaybackStatus::Playing) => self.backend.pause().map(|()| PlaybackStatus::Paused),
            Ok(PlaybackStatus::Paused) => self.backend.resume().map(|()| PlaybackStatus::Playing),
            Ok(PlaybackStatus::Stopped) => Ok(PlaybackStatus::Stopped),
            Err(e) => Err(e),
        };

        match result {
            Ok(status) => {
                info!("Playback {status:?}");
                status
            }
            Err(e) => {
                error!("Audio error: {e:#}");
                self.backend.status().unwrap_or_default()
            }
        }
    }

    /// Moves the volume by `delta`, clamped to `[0.0, 1.0]`, and applies it
    /// if a track is loaded. Returns the new volume.
    ///
    /// A non-finite `delta` is ignored. A backend that cannot change volume
    /// is logged and the new level is still remembered for the next track.
    ///
    /// # Examples
    ///
    /// ```
    /// use moodplay::backend::SimulatedBackend;
    /// use moodplay::controller::PlaybackController;
    /// use moodplay::library::TrackLibrary;
    /// use moodplay::selector::TrackSelector;
    /// use std::sync::Arc;
    ///
    /// let selector = TrackSelector::new(Arc::new(TrackLibrary::default()));
    /// let mut controller = PlaybackController::new(selector, SimulatedBackend::new(), 0.7);
    ///
    /// assert_eq!(controller.adjust_volume(0.5), 1.0);
    /// assert_eq!(controller.adjust_volume(-2.0), 0.0);
    /// ```
    pub fn adjust_volume(&mut self, delta: f32) -> f32 {
        if !delta.is_finite() {
            warn!("Ignoring volume change of {delta}");
            return self.volume;
        }
        self.volume = (self.volume + delta).clamp(0.0, 1.0);
        if self.current_track.is_some() {
            if let Err(e) = self.backend.set_volume(self.volume) {
                error!("Audio error: {e:#}");
            }
        }
        debug!("Volume {:.0}%", self.volume * 100.0);
        self.volume
    }

    /// Stops playback and releases the backend. Safe to call more than once.
    pub fn release(&mut self) {
        self.backend.release();
    }

    fn switch_to(&mut self, emotion: EmotionLabel) -> SwitchOutcome {
        let Some(track) = self.selector.pick_track(emotion, self.current_track.as_deref()) else {
            debug!("No alternative track for {emotion}; keeping current playback");
            return SwitchOutcome::Unchanged;
        };

        let started = self.backend.load(&track).and_then(|()| {
            // Outputs without a mixer still play at their own level
            if let Err(e) = self.backend.set_volume(self.volume) {
                error!("Audio error: {e:#}");
            }
            self.backend.play()
        });

        match started {
            Ok(()) => {
                info!("Playing: {} for {emotion}", display_name(&track));
                self.current_emotion = emotion;
                self.current_track = Some(track.clone());
                SwitchOutcome::Switched(track)
            }
            Err(e) => {
                error!("Audio error: {e:#}");
                SwitchOutcome::Failed
            }
        }
    }
}

/// File name of a track for display, falling back to the full path.
#[must_use]
pub fn display_name(track: &Path) -> String {
    track
        .file_name()
        .unwrap_or(track.as_os_str())
        .to_string_lossy()
        .into_owned()
}
