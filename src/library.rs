//! # Track Library
//!
//! Static mapping from emotion to candidate audio files. Built once from the
//! runtime configuration and never mutated afterwards; share it behind an
//! `Arc` if more than one component needs it.
//!
//! Missing files are not an error. They are reported once at startup by
//! [`TrackLibrary::validate`] and silently skipped at selection time.

use crate::emotion::EmotionLabel;
use log::warn;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Availability of one configured track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackStatus {
    pub emotion: EmotionLabel,
    pub path: PathBuf,
    pub available: bool,
}

/// Immutable emotion → tracks mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackLibrary {
    tracks: BTreeMap<EmotionLabel, Vec<PathBuf>>,
}

impl TrackLibrary {
    /// Wraps an emotion → paths map. Paths are taken as given; relative
    /// paths resolve against the working directory when checked.
    #[must_use]
    pub fn new(tracks: BTreeMap<EmotionLabel, Vec<PathBuf>>) -> Self {
        Self { tracks }
    }

    /// Configured tracks for `emotion`, in configuration order. Empty when
    /// the emotion has no entry.
    #[must_use]
    pub fn tracks(&self, emotion: EmotionLabel) -> &[PathBuf] {
        self.tracks.get(&emotion).map_or(&[], Vec::as_slice)
    }

    /// Tracks for `emotion` whose file currently exists.
    pub fn available_tracks(&self, emotion: EmotionLabel) -> impl Iterator<Item = &PathBuf> {
        self.tracks(emotion).iter().filter(|path| is_available(path))
    }

    /// Every configured track with its availability, grouped by emotion.
    #[must_use]
    pub fn statuses(&self) -> Vec<TrackStatus> {
        self.tracks
            .iter()
            .flat_map(|(&emotion, paths)| {
                paths.iter().map(move |path| TrackStatus {
                    emotion,
                    path: path.clone(),
                    available: is_available(path),
                })
            })
            .collect()
    }

    /// Logs a warning for every missing file and returns how many there were.
    ///
    /// Called once at startup. A library where every file is missing still
    /// runs; the player just never finds anything to switch to.
    pub fn validate(&self) -> usize {
        let missing: Vec<TrackStatus> = self
            .statuses()
            .into_iter()
            .filter(|status| !status.available)
            .collect();

        for status in &missing {
            warn!(
                "Music file not found - {} ({})",
                status.path.display(),
                status.emotion
            );
        }
        missing.len()
    }
}

/// A track is playable only if it exists as a regular file.
#[must_use]
pub fn is_available(path: &Path) -> bool {
    path.is_file()
}
