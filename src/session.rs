//! # Player Session
//!
//! The per-frame loop that ties everything together:
//!
//! ```text
//! read frame → mirror → detect → record/vote → maybe switch track
//!            → compose overlay → show → poll key → dispatch command
//! ```
//!
//! The session runs until the frame source is exhausted, the user quits,
//! the optional frame limit is hit, or the source fails. Frame source,
//! display and audio backend are released exactly once on every one of
//! those paths, and also when the session is dropped early (an error or a
//! panic unwinding through [`Session::run`]).

use crate::backend::AudioBackend;
use crate::controller::{PlaybackController, SwitchOutcome};
use crate::detector::EmotionDetector;
use crate::display::{Display, KeyCommand};
use crate::history::EmotionHistory;
use crate::render::{compose_overlay, FaceView};
use crate::source::FrameSource;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;

/// Loop tuning knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    /// Volume change per up/down command.
    pub volume_step: f32,
    /// How long each iteration waits for a key.
    pub poll_timeout: Duration,
    /// Stop after this many frames.
    pub max_frames: Option<usize>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            volume_step: 0.1,
            poll_timeout: Duration::from_millis(1),
            max_frames: None,
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The frame source ran out of frames.
    EndOfStream,
    /// A quit command, or the end of keyboard input.
    Quit,
    /// [`LoopSettings::max_frames`] frames were processed.
    FrameLimit,
    /// The frame source returned an error. The binary exits non-zero.
    SourceFailed,
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames read from the source.
    pub frames: usize,
    /// Frames whose primary face had a known emotion and took part in the vote.
    pub frames_with_faces: usize,
    /// Successful switches, from the vote and from skip commands.
    pub track_switches: usize,
    pub exit_reason: ExitReason,
}

/// Owns every collaborator for the lifetime of one run.
///
/// The session is the only place the five collaborators meet: the source
/// and detector never see the backend, and the display only ever receives
/// a composed [`crate::render::Overlay`].
///
/// # Resource Release
///
/// [`Session::run`] releases everything before it returns. If the session
/// is dropped without `run` finishing, for example while a panic in the
/// detector unwinds, `Drop` does the same. Each collaborator is released
/// exactly once either way.
///
/// # Examples
///
/// ```no_run
/// use moodplay::backend::SimulatedBackend;
/// use moodplay::controller::PlaybackController;
/// use moodplay::detector::ReplayDetector;
/// use moodplay::display::TerminalDisplay;
/// use moodplay::history::EmotionHistory;
/// use moodplay::library::TrackLibrary;
/// use moodplay::selector::TrackSelector;
/// use moodplay::session::{LoopSettings, Session};
/// use moodplay::source::ImageSequenceSource;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let source = ImageSequenceSource::open(Path::new("frames"), 640, 480)?;
/// let detector = ReplayDetector::from_file(Path::new("detections.jsonl"))?;
/// let display = TerminalDisplay::new(None, false)?;
/// let controller = PlaybackController::new(
///     TrackSelector::new(Arc::new(TrackLibrary::default())),
///     SimulatedBackend::new(),
///     0.7,
/// );
///
/// let mut session = Session::new(
///     source,
///     detector,
///     display,
///     controller,
///     EmotionHistory::new(5),
///     LoopSettings::default(),
/// );
/// let summary = session.run();
/// println!("{} frame(s), {} switch(es)", summary.frames, summary.track_switches);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Session<S, D, V, B, R = StdRng>
where
    S: FrameSource,
    V: Display,
    B: AudioBackend,
    R: Rng,
{
    source: S,
    detector: D,
    display: V,
    controller: PlaybackController<B, R>,
    history: EmotionHistory,
    settings: LoopSettings,
    frames: usize,
    frames_with_faces: usize,
    track_switches: usize,
    released: bool,
}

impl<S, D, V, B, R> Session<S, D, V, B, R>
where
    S: FrameSource,
    D: EmotionDetector,
    V: Display,
    B: AudioBackend,
    R: Rng,
{
    /// Assembles a session. Nothing is read or played until [`Session::run`].
    pub fn new(
        source: S,
        detector: D,
        display: V,
        controller: PlaybackController<B, R>,
        history: EmotionHistory,
        settings: LoopSettings,
    ) -> Self {
        Self {
            source,
            detector,
            display,
            controller,
            history,
            settings,
            frames: 0,
            frames_with_faces: 0,
            track_switches: 0,
            released: false,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &PlaybackController<B, R> {
        &self.controller
    }

    #[must_use]
    pub fn history(&self) -> &EmotionHistory {
        &self.history
    }

    #[must_use]
    pub fn display(&self) -> &V {
        &self.display
    }

    /// Runs until a terminal condition, then releases every resource.
    ///
    /// Per-frame failures never end the loop: a detector error counts as
    /// no face, and display or audio errors are logged. Only the frame
    /// source can stop it early, reported as [`ExitReason::SourceFailed`].
    pub fn run(&mut self) -> SessionSummary {
        info!("Session started");
        let exit_reason = loop {
            if let Some(reason) = self.tick() {
                break reason;
            }
        };
        self.shutdown();

        let summary = SessionSummary {
            frames: self.frames,
            frames_with_faces: self.frames_with_faces,
            track_switches: self.track_switches,
            exit_reason,
        };
        info!(
            "Session ended ({:?}) after {} frame(s), {} with faces, {} track switch(es)",
            summary.exit_reason, summary.frames, summary.frames_with_faces, summary.track_switches
        );
        summary
    }

    /// One loop iteration. `Some` means the loop must stop.
    fn tick(&mut self) -> Option<ExitReason> {
        if self.settings.max_frames.is_some_and(|max| self.frames >= max) {
            return Some(ExitReason::FrameLimit);
        }

        let mut frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Some(ExitReason::EndOfStream),
            Err(e) => {
                error!("Frame source failed: {e:#}");
                return Some(ExitReason::SourceFailed);
            }
        };
        self.frames += 1;

        frame.mirror_horizontal();

        let detections = self.detector.detect(&frame).unwrap_or_else(|e| {
            warn!("Detection failed on frame {}: {e:#}", frame.index());
            Vec::new()
        });

        let face = detections.first().and_then(|primary| {
            let (emotion, score) = primary.top_emotion()?;
            self.history.record(emotion, score);
            let dominant = self.history.dominant_emotion();
            debug!(
                "Frame {}: {emotion} ({score:.2}), dominant {dominant}",
                frame.index()
            );
            if let SwitchOutcome::Switched(_) = self.controller.maybe_switch(dominant) {
                self.track_switches += 1;
            }
            Some(FaceView {
                bbox: primary.bbox,
                dominant,
                score,
            })
        });
        if face.is_some() {
            self.frames_with_faces += 1;
        }

        let overlay = compose_overlay(face, self.controller.current_track(), self.controller.volume());
        if let Err(e) = self.display.show(&frame, &overlay) {
            warn!("Display failed on frame {}: {e:#}", frame.index());
        }

        match self.display.poll_key(self.settings.poll_timeout) {
            Some(command) => self.dispatch(command),
            None => None,
        }
    }

    fn dispatch(&mut self, command: KeyCommand) -> Option<ExitReason> {
        debug!("Key command {command:?}");
        match command {
            KeyCommand::Quit => return Some(ExitReason::Quit),
            KeyCommand::TogglePause => {
                self.controller.toggle_pause();
            }
            KeyCommand::VolumeUp => {
                self.controller.adjust_volume(self.settings.volume_step);
            }
            KeyCommand::VolumeDown => {
                self.controller.adjust_volume(-self.settings.volume_step);
            }
            KeyCommand::Skip => {
                if let SwitchOutcome::Switched(_) = self.controller.skip() {
                    self.track_switches += 1;
                }
            }
        }
        None
    }
}

impl<S, D, V, B, R> Session<S, D, V, B, R>
where
    S: FrameSource,
    V: Display,
    B: AudioBackend,
    R: Rng,
{
    /// Releases source, display and audio once.
    fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.source.release();
        self.display.close();
        self.controller.release();
        debug!("Session resources released");
    }
}

impl<S, D, V, B, R> Drop for Session<S, D, V, B, R>
where
    S: FrameSource,
    V: Display,
    B: AudioBackend,
    R: Rng,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
