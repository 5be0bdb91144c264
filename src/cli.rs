//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Moodplay using Clap
//! derive macros.
//!
//! ## Commands
//!
//! - `run`: Start the camera loop and let the detected mood pick the music
//! - `check-library`: Show which configured tracks exist on disk
//! - `init-config`: Write the default configuration file
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! moodplay run --frames ./capture --detections ./capture/faces.jsonl
//! moodplay run --frames ./capture --detector-cmd fer-json --backend simulated
//! moodplay check-library --config ~/music/moodplay.json
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Audio output used by `run`.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum BackendKind {
    /// Music Player Daemon, driven through `mpc`
    #[default]
    Mpc,
    /// In-process dry run; nothing is audible
    Simulated,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "moodplay")]
#[command(about = "Moodplay: music that follows the mood on your face")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the emotion-driven player
    ///
    /// Reads frames, classifies the primary face, smooths the result over
    /// the last few frames and switches tracks when the mood changes.
    /// While running, type `q`, space, `+`, `-` or `n` followed by Enter.
    Run(RunArgs),

    /// List every library track and whether it exists
    ///
    /// Missing files are reported but are not an error; the player simply
    /// never selects them.
    CheckLibrary {
        /// Configuration file (defaults to the platform config directory)
        #[arg(long, short, env = "MOODPLAY_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Where to write it (defaults to the platform config directory)
        #[arg(long, short, env = "MOODPLAY_CONFIG")]
        config: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    ///
    /// Outputs shell completion script for the specified shell.
    /// Redirect output to the appropriate completion file for your shell.
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options for `moodplay run`. Flags given here override the config file.
#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Directory of captured frames (png, jpg, bmp), read in name order
    #[arg(long, short)]
    pub frames: PathBuf,

    /// Pre-recorded detections, one JSON array of faces per frame
    #[arg(long, short, conflicts_with = "detector_cmd")]
    pub detections: Option<PathBuf>,

    /// External classifier; the frame's PNG path is appended as last argument
    #[arg(long, num_args = 1.., value_name = "CMD", allow_hyphen_values = true)]
    pub detector_cmd: Vec<String>,

    /// Audio backend
    #[arg(long, value_enum, default_value_t = BackendKind::Mpc)]
    pub backend: BackendKind,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, short, env = "MOODPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write annotated frames to this directory
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    pub max_frames: Option<usize>,

    /// Number of recent frames the dominant emotion is voted over
    #[arg(long)]
    pub history_length: Option<usize>,

    /// Starting volume between 0.0 and 1.0
    #[arg(long)]
    pub volume: Option<f32>,

    /// MPD music directory; tracks inside it are sent to MPD relative to it
    #[arg(long)]
    pub music_dir: Option<PathBuf>,

    /// Don't read keyboard commands from stdin
    #[arg(long)]
    pub no_input: bool,
}
