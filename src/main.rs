//! # Moodplay
//!
//! Command-line entry point. Parses arguments, loads the configuration and
//! wires the frame source, classifier, display and audio backend into a
//! [`Session`].
//!
//! ## Logging
//!
//! Logging defaults to `info` and can be controlled via `RUST_LOG`:
//! - `RUST_LOG=debug moodplay run ...` - Enable debug logging
//! - `RUST_LOG=moodplay::session=trace moodplay run ...` - Module-specific logging

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use log::{info, warn};
use moodplay::backend::{AudioBackend, SimulatedBackend};
use moodplay::cli::{self, BackendKind, RunArgs};
use moodplay::completion;
use moodplay::config::{self, RuntimeConfig};
use moodplay::controller::PlaybackController;
use moodplay::detector::{CommandDetector, EmotionDetector, ReplayDetector};
use moodplay::display::TerminalDisplay;
use moodplay::history::EmotionHistory;
use moodplay::library::TrackLibrary;
use moodplay::mpd_backend::MpcBackend;
use moodplay::selector::TrackSelector;
use moodplay::session::{ExitReason, LoopSettings, Session, SessionSummary};
use moodplay::source::ImageSequenceSource;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Run(run_args) => run(run_args)?,
        cli::Command::CheckLibrary { config } => {
            let config = RuntimeConfig::load(config.as_deref())?;
            check_library(&config.track_library());
        }
        cli::Command::InitConfig { config, force } => {
            let path = match config {
                Some(path) => path,
                None => config::get_config_path()?,
            };
            if path.exists() && !force {
                bail!(
                    "Config file {} already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            RuntimeConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(
                completion::shell_to_completion_shell(shell),
                &mut cmd,
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = RuntimeConfig::load(args.config.as_deref())?;
    if let Some(history_length) = args.history_length {
        config.history_length = history_length;
    }
    if let Some(volume) = args.volume {
        config.initial_volume = volume;
    }
    if args.music_dir.is_some() {
        config.music_dir = args.music_dir.clone();
    }
    let config = config.validated();

    let library = Arc::new(config.track_library());
    let missing = library.validate();
    if missing > 0 && missing == library.statuses().len() {
        warn!("No library track exists on disk; nothing will play");
    }

    let source = ImageSequenceSource::open(&args.frames, config.capture_width, config.capture_height)
        .context("Could not open frame source")?;
    let detector = build_detector(&args)?;
    let display = TerminalDisplay::new(args.output.clone(), !args.no_input)?;
    let settings = LoopSettings {
        volume_step: config.volume_step,
        poll_timeout: config.poll_timeout(),
        max_frames: args.max_frames,
    };

    let summary = match args.backend {
        BackendKind::Mpc => {
            let backend = MpcBackend::connect(config.music_dir.clone())
                .context("Could not reach MPD. Is it running?")?;
            play(source, detector, display, backend, library, &config, settings)
        }
        BackendKind::Simulated => play(
            source,
            detector,
            display,
            SimulatedBackend::new(),
            library,
            &config,
            settings,
        ),
    };

    println!(
        "{} frames ({} with a face), {} track switch(es)",
        summary.frames, summary.frames_with_faces, summary.track_switches
    );
    if summary.exit_reason == ExitReason::SourceFailed {
        bail!("Frame source failed after {} frame(s)", summary.frames);
    }
    Ok(())
}

fn build_detector(args: &RunArgs) -> Result<Box<dyn EmotionDetector>> {
    if let Some(path) = &args.detections {
        let detector = ReplayDetector::from_file(path)?;
        info!("Replaying detections for {} frame(s)", detector.len());
        return Ok(Box::new(detector));
    }
    if !args.detector_cmd.is_empty() {
        return Ok(Box::new(CommandDetector::new(&args.detector_cmd)?));
    }
    bail!("No emotion detector given. Use --detections <FILE> or --detector-cmd <CMD>...")
}

fn play<B: AudioBackend>(
    source: ImageSequenceSource,
    detector: Box<dyn EmotionDetector>,
    display: TerminalDisplay,
    backend: B,
    library: Arc<TrackLibrary>,
    config: &RuntimeConfig,
    settings: LoopSettings,
) -> SessionSummary {
    let controller = PlaybackController::new(
        TrackSelector::new(library),
        backend,
        config.initial_volume,
    );
    let mut session = Session::new(
        source,
        detector,
        display,
        controller,
        EmotionHistory::new(config.history_length),
        settings,
    );
    session.run()
}

fn check_library(library: &TrackLibrary) {
    let statuses = library.statuses();
    let missing = statuses.iter().filter(|status| !status.available).count();
    for status in &statuses {
        let mark = if status.available { "ok" } else { "missing" };
        println!("{:<9} {:<8} {}", status.emotion, mark, status.path.display());
    }
    println!("{} track(s), {} missing", statuses.len(), missing);
}
