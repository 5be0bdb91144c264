//! # MPD Audio Backend
//!
//! Drives a Music Player Daemon through the `mpc` command-line client. Every
//! operation is one short `mpc` invocation, so there is no protocol state to
//! keep in sync beyond what MPD itself reports.
//!
//! ## Path Handling
//!
//! MPD addresses songs relative to its music directory. When a music
//! directory is configured, tracks underneath it are passed relative to it;
//! anything else is passed as an absolute path, which MPD accepts from
//! clients connected over its local socket.
//!
//! ## Replacing The Queue
//!
//! Loading appends the new track instead of clearing the queue first, and
//! remembers its queue position. [`AudioBackend::play`] then jumps to that
//! position and crops everything else away. If MPD rejects the new track
//! the queue is untouched and the previous track keeps playing.
//!
//! ```text
//! mpc playlist        # queue length n before the add
//! mpc add calm/a.mp3  # new track lands at n + 1
//! mpc volume 70
//! mpc play 2          # n + 1
//! mpc crop            # drop every entry except the playing one
//! ```
//!
//! ## Status Parsing
//!
//! `mpc status` prints the current song followed by a line such as
//! `[playing] #1/1   0:32/3:45 (13%)`. Only the bracketed state matters here;
//! output without one means playback is stopped.

use crate::backend::{AudioBackend, PlaybackStatus};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// [`AudioBackend`] implemented by shelling out to `mpc`.
#[derive(Debug, Clone)]
pub struct MpcBackend {
    program: String,
    music_dir: Option<PathBuf>,
    /// Queue position of a track added but not yet started.
    pending: Option<usize>,
    loaded: bool,
    released: bool,
}

impl MpcBackend {
    /// Verifies that `mpc` is installed and MPD is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the `mpc` executable cannot be run
    /// - MPD is not running or refuses the connection
    pub fn connect(music_dir: Option<PathBuf>) -> Result<Self> {
        Self::with_program("mpc", music_dir)
    }

    /// Same as [`MpcBackend::connect`] with a custom client executable.
    ///
    /// # Errors
    ///
    /// Returns an error if `program` cannot be run or `program version`
    /// exits unsuccessfully.
    pub fn with_program(program: impl Into<String>, music_dir: Option<PathBuf>) -> Result<Self> {
        let backend = Self {
            program: program.into(),
            music_dir,
            pending: None,
            loaded: false,
            released: false,
        };
        backend
            .mpc(&["version"])
            .context("Failed to connect to MPD. Make sure MPD is running on localhost:6600")?;
        Ok(backend)
    }

    /// Runs one `mpc` subcommand and returns its stdout.
    fn mpc(&self, args: &[&str]) -> Result<String> {
        debug!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute {}. Please install mpc (MPD client)", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("mpc {} failed: {}", args.join(" "), stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Path as MPD should see it.
    fn mpd_path(&self, track: &Path) -> String {
        self.music_dir
            .as_deref()
            .and_then(|root| track.strip_prefix(root).ok())
            .unwrap_or(track)
            .to_string_lossy()
            .into_owned()
    }
}

impl AudioBackend for MpcBackend {
    fn load(&mut self, track: &Path) -> Result<()> {
        let queued = self
            .mpc(&["playlist"])
            .context("Failed to read MPD queue")?
            .lines()
            .count();
        let mpd_path = self.mpd_path(track);
        self.mpc(&["add", &mpd_path])
            .with_context(|| format!("Failed to add {mpd_path} to MPD queue"))?;
        self.pending = Some(queued + 1);
        self.loaded = true;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let Some(position) = self.pending else {
            self.mpc(&["play"]).context("Failed to start MPD playback")?;
            return Ok(());
        };
        let position = position.to_string();
        self.mpc(&["play", &position])
            .with_context(|| format!("Failed to start MPD playback at queue position {position}"))?;
        self.pending = None;
        if let Err(e) = self.mpc(&["crop"]) {
            warn!("Failed to remove previous tracks from MPD queue: {e:#}");
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.mpc(&["pause"]).context("Failed to pause MPD playback")?;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.mpc(&["play"]).context("Failed to resume MPD playback")?;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        let percent = volume_percent(volume).to_string();
        self.mpc(&["volume", &percent])
            .context("Failed to set MPD volume")?;
        Ok(())
    }

    fn status(&mut self) -> Result<PlaybackStatus> {
        let text = self.mpc(&["status"]).context("Failed to get MPD status")?;
        Ok(parse_status(&text))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.loaded {
            if let Err(e) = self.mpc(&["stop"]) {
                warn!("Failed to stop MPD playback on exit: {e}");
            }
        }
    }
}

/// Extracts the player state from `mpc status` output.
#[must_use]
pub fn parse_status(text: &str) -> PlaybackStatus {
    text.lines()
        .find_map(|line| {
            let line = line.trim_start();
            if line.starts_with("[playing]") {
                Some(PlaybackStatus::Playing)
            } else if line.starts_with("[paused]") {
                Some(PlaybackStatus::Paused)
            } else {
                None
            }
        })
        .unwrap_or(PlaybackStatus::Stopped)
}

/// Converts a `[0.0, 1.0]` volume to MPD's 0-100 scale.
#[must_use]
pub fn volume_percent(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_playing() {
        let text = "Artist - Song\n[playing] #1/1   0:32/3:45 (13%)\nvolume: 70%   repeat: off\n";
        assert_eq!(parse_status(text), PlaybackStatus::Playing);
    }

    #[test]
    fn test_parse_status_paused() {
        let text = "calm_music.mp3\n[paused]  #1/1   1:02/4:10 (24%)\nvolume: 50%\n";
        assert_eq!(parse_status(text), PlaybackStatus::Paused);
    }

    #[test]
    fn test_parse_status_stopped() {
        assert_eq!(
            parse_status("volume: 70%   repeat: off   random: off\n"),
            PlaybackStatus::Stopped
        );
        assert_eq!(parse_status(""), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_volume_percent() {
        assert_eq!(volume_percent(0.7), 70);
        assert_eq!(volume_percent(0.0), 0);
        assert_eq!(volume_percent(1.0), 100);
        assert_eq!(volume_percent(1.5), 100);
        assert_eq!(volume_percent(-1.0), 0);
    }

    #[test]
    fn test_connect_fails_without_client() {
        let result = MpcBackend::with_program("moodplay-no-such-mpc-binary", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_mpd_path_relative_to_music_dir() {
        let backend = MpcBackend {
            program: "mpc".to_string(),
            music_dir: Some(PathBuf::from("/srv/music")),
            pending: None,
            loaded: false,
            released: false,
        };
        assert_eq!(backend.mpd_path(Path::new("/srv/music/calm/a.flac")), "calm/a.flac");
        assert_eq!(backend.mpd_path(Path::new("/tmp/b.mp3")), "/tmp/b.mp3");
    }

    /// Stand-in `mpc` that keeps its queue and state in files next to itself.
    /// `add` rejects any path containing `bad`, and `volume` fails once a
    /// `no-mixer` file exists.
    #[cfg(unix)]
    const FAKE_MPC: &str = r#"#!/bin/sh
dir="$(dirname "$0")"
echo "$*" >> "$dir/calls.log"
case "$1" in
  version) echo "mpd version: 0.23.5" ;;
  playlist) cat "$dir/queue" 2>/dev/null || true ;;
  add)
    case "$2" in *bad*) echo "error adding $2: No such directory" >&2; exit 1 ;; esac
    echo "$2" >> "$dir/queue" ;;
  play)
    if [ -n "$2" ]; then echo "$2" > "$dir/current"; fi
    echo playing > "$dir/state" ;;
  crop)
    sed -n "$(cat "$dir/current")p" "$dir/queue" > "$dir/queue.new"
    mv "$dir/queue.new" "$dir/queue"
    echo 1 > "$dir/current" ;;
  pause) echo paused > "$dir/state" ;;
  stop) rm -f "$dir/state" ;;
  volume)
    if [ -f "$dir/no-mixer" ]; then echo "problems setting volume" >&2; exit 1; fi ;;
  status)
    if [ -f "$dir/state" ]; then
      sed -n "$(cat "$dir/current")p" "$dir/queue"
      echo "[$(cat "$dir/state")] #1/1   0:01/3:00 (0%)"
    fi
    echo "volume: 70%   repeat: off" ;;
  *) exit 1 ;;
esac
"#;

    #[cfg(unix)]
    mod with_fake_client {
        use super::*;
        use crate::controller::{PlaybackController, SwitchOutcome};
        use crate::emotion::EmotionLabel;
        use crate::library::TrackLibrary;
        use crate::selector::TrackSelector;
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        use std::collections::BTreeMap;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::sync::Arc;
        use tempfile::TempDir;

        struct FakeMpd {
            dir: TempDir,
            music: TempDir,
        }

        impl FakeMpd {
            fn new() -> Self {
                let dir = TempDir::new().unwrap();
                let script = dir.path().join("mpc");
                fs::write(&script, FAKE_MPC).unwrap();
                fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

                let music = TempDir::new().unwrap();
                for name in ["good.mp3", "other.mp3", "bad.mp3"] {
                    fs::write(music.path().join(name), b"audio").unwrap();
                }
                Self { dir, music }
            }

            fn backend(&self) -> MpcBackend {
                let program = self.dir.path().join("mpc").to_string_lossy().into_owned();
                MpcBackend::with_program(program, Some(self.music.path().to_path_buf())).unwrap()
            }

            fn track(&self, name: &str) -> PathBuf {
                self.music.path().join(name)
            }

            fn without_mixer(&self) {
                fs::write(self.dir.path().join("no-mixer"), b"").unwrap();
            }

            fn calls(&self) -> Vec<String> {
                fs::read_to_string(self.dir.path().join("calls.log"))
                    .unwrap_or_default()
                    .lines()
                    .map(str::to_string)
                    .collect()
            }

            fn queue(&self) -> Vec<String> {
                fs::read_to_string(self.dir.path().join("queue"))
                    .unwrap_or_default()
                    .lines()
                    .map(str::to_string)
                    .collect()
            }

            fn controller(&self, tracks: &[(EmotionLabel, &str)]) -> PlaybackController<MpcBackend, StdRng> {
                let mut library: BTreeMap<EmotionLabel, Vec<PathBuf>> = BTreeMap::new();
                for (emotion, name) in tracks {
                    library.entry(*emotion).or_default().push(self.track(name));
                }
                let selector = TrackSelector::with_rng(Arc::new(TrackLibrary::new(library)), StdRng::seed_from_u64(3));
                PlaybackController::new(selector, self.backend(), 0.7)
            }
        }

        #[test]
        fn test_load_and_play_replaces_queue_after_start() -> Result<()> {
            let mpd = FakeMpd::new();
            let mut backend = mpd.backend();

            backend.load(&mpd.track("good.mp3"))?;
            backend.set_volume(0.7)?;
            backend.play()?;
            assert_eq!(backend.status()?, PlaybackStatus::Playing);

            backend.load(&mpd.track("other.mp3"))?;
            // both queued until the new one actually starts
            assert_eq!(mpd.queue(), ["good.mp3", "other.mp3"]);
            backend.play()?;
            assert_eq!(mpd.queue(), ["other.mp3"]);

            assert_eq!(
                mpd.calls(),
                [
                    "version",
                    "playlist",
                    "add good.mp3",
                    "volume 70",
                    "play 1",
                    "crop",
                    "status",
                    "playlist",
                    "add other.mp3",
                    "play 2",
                    "crop",
                ]
            );
            Ok(())
        }

        #[test]
        fn test_rejected_add_leaves_queue_alone() -> Result<()> {
            let mpd = FakeMpd::new();
            let mut backend = mpd.backend();
            backend.load(&mpd.track("good.mp3"))?;
            backend.play()?;

            let err = backend.load(&mpd.track("bad.mp3")).unwrap_err();
            assert!(format!("{err:#}").contains("bad.mp3"));
            assert_eq!(mpd.queue(), ["good.mp3"]);
            assert_eq!(backend.status()?, PlaybackStatus::Playing);
            assert!(!mpd.calls().iter().any(|call| call == "clear"));
            Ok(())
        }

        #[test]
        fn test_volume_without_mixer_is_error() {
            let mpd = FakeMpd::new();
            mpd.without_mixer();
            let mut backend = mpd.backend();
            assert!(backend.set_volume(0.5).is_err());
        }

        #[test]
        fn test_pause_resume_and_release() -> Result<()> {
            let mpd = FakeMpd::new();
            let mut backend = mpd.backend();
            backend.load(&mpd.track("good.mp3"))?;
            backend.play()?;

            backend.pause()?;
            assert_eq!(backend.status()?, PlaybackStatus::Paused);
            backend.resume()?;
            assert_eq!(backend.status()?, PlaybackStatus::Playing);

            backend.release();
            backend.release();
            assert_eq!(backend.status()?, PlaybackStatus::Stopped);
            assert_eq!(mpd.calls().iter().filter(|call| *call == "stop").count(), 1);
            Ok(())
        }

        #[test]
        fn test_controller_plays_without_mixer() {
            let mpd = FakeMpd::new();
            mpd.without_mixer();
            let mut controller = mpd.controller(&[(EmotionLabel::Happy, "good.mp3")]);

            assert_eq!(
                controller.maybe_switch(EmotionLabel::Happy),
                SwitchOutcome::Switched(mpd.track("good.mp3"))
            );
            let calls = mpd.calls();
            assert!(calls.iter().any(|call| call == "volume 70"));
            assert_eq!(calls.last().map(String::as_str), Some("crop"));
            assert!(calls.iter().any(|call| call == "play 1"));
            assert!(controller.backend_mut().is_playing().unwrap());
        }

        #[test]
        fn test_controller_failed_switch_keeps_playing_track() {
            let mpd = FakeMpd::new();
            let mut controller = mpd.controller(&[
                (EmotionLabel::Happy, "good.mp3"),
                (EmotionLabel::Sad, "bad.mp3"),
            ]);
            assert!(matches!(controller.maybe_switch(EmotionLabel::Happy), SwitchOutcome::Switched(_)));

            assert_eq!(controller.maybe_switch(EmotionLabel::Sad), SwitchOutcome::Failed);
            assert_eq!(controller.current_emotion(), EmotionLabel::Happy);
            assert_eq!(controller.current_track(), Some(mpd.track("good.mp3").as_path()));
            // what the controller reports is what MPD is still playing
            assert_eq!(mpd.queue(), ["good.mp3"]);
            assert!(controller.backend_mut().is_playing().unwrap());
        }
    }
}
