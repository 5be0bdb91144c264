//! # Configuration Module
//!
//! Runtime configuration for Moodplay: smoothing window, volume behaviour,
//! capture resolution and the emotion → tracks library.
//!
//! ## Location
//!
//! Moodplay reads `config.json` from the platform-standard configuration
//! directory unless a path is given on the command line:
//! - Linux: `~/.config/moodplay/config.json`
//! - macOS: `~/Library/Application Support/moodplay/config.json`
//! - Windows: `%APPDATA%\moodplay\config.json`
//!
//! A missing default file is not an error; built-in defaults are used.
//!
//! ## Format
//!
//! ```json
//! {
//!   "history_length": 5,
//!   "initial_volume": 0.7,
//!   "library": {
//!     "happy": ["happy_music.mp3"],
//!     "sad": ["/srv/music/rain.flac"]
//!   }
//! }
//! ```
//!
//! Every field is optional. Relative track paths are resolved against the
//! directory containing the config file.

use crate::controller::DEFAULT_VOLUME;
use crate::emotion::EmotionLabel;
use crate::history::DEFAULT_HISTORY_LENGTH;
use crate::library::TrackLibrary;
use crate::source::{DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";

/// Returns the platform-appropriate configuration file path.
///
/// The `moodplay` directory is created if it doesn't exist so the file can
/// be written by `moodplay init-config`.
///
/// # Errors
///
/// This function will return an error if:
/// - The system configuration directory cannot be determined
/// - The moodplay subdirectory cannot be created due to permissions
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system configuration directory. Please pass --config explicitly."
        )
    })?;

    let moodplay_dir = config_dir.join("moodplay");
    fs::create_dir_all(&moodplay_dir).with_context(|| {
        format!(
            "Failed to create Moodplay config directory at {}. Please check file permissions.",
            moodplay_dir.display()
        )
    })?;

    Ok(moodplay_dir.join(CONFIG_FILE))
}

/// The library the player ships with: one track per core emotion, looked up
/// relative to the working directory.
#[must_use]
pub fn default_library() -> BTreeMap<EmotionLabel, Vec<PathBuf>> {
    BTreeMap::from([
        (EmotionLabel::Happy, vec![PathBuf::from("happy_music.mp3")]),
        (EmotionLabel::Sad, vec![PathBuf::from("sad_music.mp3")]),
        (EmotionLabel::Angry, vec![PathBuf::from("intense_music.mp3")]),
        (EmotionLabel::Neutral, vec![PathBuf::from("calm_music.mp3")]),
    ])
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Frames the majority vote is taken over
    pub history_length: usize,
    /// Volume at startup, `0.0..=1.0`
    pub initial_volume: f32,
    /// Volume change per up/down key
    pub volume_step: f32,
    /// Requested capture width (best-effort)
    pub capture_width: u32,
    /// Requested capture height (best-effort)
    pub capture_height: u32,
    /// Keyboard poll timeout per frame
    pub poll_timeout_ms: u64,
    /// MPD music directory, for passing library tracks to MPD relative to it
    pub music_dir: Option<PathBuf>,
    /// Emotion → candidate tracks
    pub library: BTreeMap<EmotionLabel, Vec<PathBuf>>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            history_length: DEFAULT_HISTORY_LENGTH,
            initial_volume: DEFAULT_VOLUME,
            volume_step: 0.1,
            capture_width: DEFAULT_CAPTURE_WIDTH,
            capture_height: DEFAULT_CAPTURE_HEIGHT,
            poll_timeout_ms: 1,
            music_dir: None,
            library: default_library(),
        }
    }
}

impl RuntimeConfig {
    /// Loads the configuration.
    ///
    /// With an explicit `path` the file must exist. Without one the default
    /// location is tried and built-in defaults are used if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = get_config_path()?;
                if !default.exists() {
                    debug!("No config at {}, using defaults", default.display());
                    return Ok(Self::default().validated());
                }
                default
            }
        };
        Self::from_file(&path)
    }

    /// Reads and validates a config file, resolving relative paths against
    /// its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base).map(Self::validated)
    }

    /// Writes the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Clamps out-of-range values, warning about each one.
    ///
    /// An `initial_volume` that is NaN or infinite (for example from
    /// `--volume nan`) falls back to the default of 0.7 instead of being
    /// clamped, as is a `volume_step` outside `(0.0, 1.0]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use moodplay::config::RuntimeConfig;
    ///
    /// let config = RuntimeConfig {
    ///     initial_volume: f32::NAN,
    ///     history_length: 0,
    ///     ..RuntimeConfig::default()
    /// }
    /// .validated();
    /// assert_eq!(config.initial_volume, 0.7);
    /// assert_eq!(config.history_length, 1);
    /// ```
    #[must_use]
    pub fn validated(mut self) -> Self {
        if self.history_length == 0 {
            warn!("history_length must be at least 1; using 1");
            self.history_length = 1;
        }
        if !self.initial_volume.is_finite() {
            warn!("initial_volume {} is not a number; using {DEFAULT_VOLUME}", self.initial_volume);
            self.initial_volume = DEFAULT_VOLUME;
        } else if !(0.0..=1.0).contains(&self.initial_volume) {
            let clamped = self.initial_volume.clamp(0.0, 1.0);
            warn!("initial_volume {} out of range; using {clamped}", self.initial_volume);
            self.initial_volume = clamped;
        }
        if !(self.volume_step > 0.0 && self.volume_step <= 1.0) {
            warn!("volume_step {} out of range; using 0.1", self.volume_step);
            self.volume_step = 0.1;
        }
        self
    }

    /// Builds the immutable track library.
    #[must_use]
    pub fn track_library(&self) -> TrackLibrary {
        TrackLibrary::new(self.library.clone())
    }

    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    fn resolve_paths(mut self, base: &Path) -> Result<Self> {
        let resolve = |path: &Path| -> Result<PathBuf> {
            Ok(path
                .absolutize_from(base)
                .with_context(|| format!("Failed to resolve path {}", path.display()))?
                .into_owned())
        };

        for tracks in self.library.values_mut() {
            for track in tracks.iter_mut() {
                *track = resolve(track)?;
            }
        }
        if let Some(dir) = &self.music_dir {
            self.music_dir = Some(resolve(dir)?);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_reference_player() {
        let config = RuntimeConfig::default();
        assert_eq!(config.history_length, 5);
        assert_eq!(config.initial_volume, 0.7);
        assert_eq!(config.volume_step, 0.1);
        assert_eq!((config.capture_width, config.capture_height), (640, 480));
        assert_eq!(
            config.library.get(&EmotionLabel::Angry),
            Some(&vec![PathBuf::from("intense_music.mp3")])
        );
        assert_eq!(config.library.len(), 4);
    }

    #[test]
    fn test_partial_file_takes_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"history_length": 9}"#)?;

        let config = RuntimeConfig::from_file(&path)?;
        assert_eq!(config.history_length, 9);
        assert_eq!(config.initial_volume, 0.7);
        Ok(())
    }

    #[test]
    fn test_relative_tracks_resolve_against_config_dir() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"library": {"sad": ["tracks/rain.mp3", "/abs/storm.mp3"]}, "music_dir": "tracks"}"#,
        )?;

        let config = RuntimeConfig::from_file(&path)?;
        let sad = &config.library[&EmotionLabel::Sad];
        assert_eq!(sad[0], dir.path().join("tracks/rain.mp3"));
        assert_eq!(sad[1], PathBuf::from("/abs/storm.mp3"));
        assert_eq!(config.music_dir, Some(dir.path().join("tracks")));
        // an explicit library replaces the default one
        assert!(!config.library.contains_key(&EmotionLabel::Happy));
        Ok(())
    }

    #[test]
    fn test_unknown_emotion_key_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"library": {"bored": ["a.mp3"]}}"#)?;
        assert!(RuntimeConfig::from_file(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        assert!(RuntimeConfig::load(Some(Path::new("/no/such/moodplay.json"))).is_err());
    }

    #[test]
    fn test_validation_clamps() {
        let config = RuntimeConfig {
            history_length: 0,
            initial_volume: 1.4,
            volume_step: -0.5,
            ..RuntimeConfig::default()
        }
        .validated();
        assert_eq!(config.history_length, 1);
        assert_eq!(config.initial_volume, 1.0);
        assert_eq!(config.volume_step, 0.1);
    }

    #[test]
    fn test_validation_rejects_non_finite_numbers() {
        let config = RuntimeConfig {
            initial_volume: f32::NAN,
            volume_step: f32::NAN,
            ..RuntimeConfig::default()
        }
        .validated();
        assert_eq!(config.initial_volume, DEFAULT_VOLUME);
        assert_eq!(config.volume_step, 0.1);

        let config = RuntimeConfig {
            initial_volume: f32::INFINITY,
            ..RuntimeConfig::default()
        }
        .validated();
        assert_eq!(config.initial_volume, DEFAULT_VOLUME);
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        let config = RuntimeConfig {
            history_length: 3,
            library: BTreeMap::from([(EmotionLabel::Fear, vec![dir.path().join("eerie.ogg")])]),
            ..RuntimeConfig::default()
        };
        config.save(&path)?;
        assert_eq!(RuntimeConfig::from_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_track_library_uses_configured_paths() {
        let config = RuntimeConfig::default();
        let library = config.track_library();
        assert_eq!(
            library.tracks(EmotionLabel::Neutral),
            &[PathBuf::from("calm_music.mp3")]
        );
    }
}
