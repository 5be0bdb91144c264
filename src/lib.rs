//! Music that follows the mood on your face.
//!
//! Moodplay reads camera frames, asks a facial-emotion classifier what the
//! primary face is feeling, smooths that over the last few frames and plays
//! a track from the library entry of the dominant emotion. Track changes
//! only happen when the dominant emotion changes or playback has stopped.
//!
//! Core modules:
//! - [`history`] - Sliding-window majority vote over recent emotions
//! - [`selector`] - Random track choice with repeat avoidance
//! - [`controller`] - Playback state machine over an audio backend
//! - [`session`] - The per-frame loop and resource cleanup
//!
//! ### Collaborators
//!
//! - [`source`] - Frame sources ([`source::ImageSequenceSource`])
//! - [`detector`] - Emotion classifiers (replayed or external command)
//! - [`backend`] / [`mpd_backend`] - Audio output (simulated or MPD via `mpc`)
//! - [`display`] / [`render`] - Overlay composition, output and keyboard input
//!
//! ### Supporting Modules
//!
//! - [`config`] - JSON runtime configuration and the track library
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use moodplay::backend::SimulatedBackend;
//! use moodplay::config::RuntimeConfig;
//! use moodplay::controller::PlaybackController;
//! use moodplay::detector::ReplayDetector;
//! use moodplay::display::TerminalDisplay;
//! use moodplay::history::EmotionHistory;
//! use moodplay::selector::TrackSelector;
//! use moodplay::session::{LoopSettings, Session};
//! use moodplay::source::ImageSequenceSource;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = RuntimeConfig::load(None)?;
//! let library = Arc::new(config.track_library());
//! let controller = PlaybackController::new(
//!     TrackSelector::new(library),
//!     SimulatedBackend::new(),
//!     config.initial_volume,
//! );
//!
//! let mut session = Session::new(
//!     ImageSequenceSource::open(Path::new("capture"), 640, 480)?,
//!     ReplayDetector::from_file(Path::new("capture/faces.jsonl"))?,
//!     TerminalDisplay::new(None, true)?,
//!     controller,
//!     EmotionHistory::new(config.history_length),
//!     LoopSettings::default(),
//! );
//! let summary = session.run();
//! println!("{} frames, {} switches", summary.frames, summary.track_switches);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Setup functions return `anyhow::Result` with context attached at every
//! I/O boundary. Once the loop runs, per-frame failures (classifier errors,
//! audio backend errors, display errors) are logged and the loop carries
//! on; only the frame source ending or failing stops it.
//!
//! ## Logging
//!
//! All modules log through the `log` facade. The binary initialises
//! `env_logger` at `info`; use `RUST_LOG=moodplay=debug` to see per-frame
//! decisions.

pub mod backend;
pub mod cli;
pub mod completion;
pub mod config;
pub mod controller;
pub mod detector;
pub mod display;
pub mod emotion;
pub mod frame;
pub mod history;
pub mod library;
pub mod mpd_backend;
pub mod render;
pub mod selector;
pub mod session;
pub mod source;
