//! # Track Selection
//!
//! Picks the next track for an emotion: a uniform random choice among the
//! library's tracks for that emotion that exist on disk and are not the
//! track already playing.
//!
//! "No track" is an ordinary answer, not an error. It tells the caller to
//! keep whatever is playing (or stay silent).

use crate::emotion::EmotionLabel;
use crate::library::TrackLibrary;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Random track picker over a shared, immutable [`TrackLibrary`].
#[derive(Debug)]
pub struct TrackSelector<R = StdRng> {
    library: Arc<TrackLibrary>,
    rng: R,
}

impl TrackSelector<StdRng> {
    /// Selector seeded from OS entropy.
    #[must_use]
    pub fn new(library: Arc<TrackLibrary>) -> Self {
        Self::with_rng(library, StdRng::from_entropy())
    }
}

impl<R: Rng> TrackSelector<R> {
    /// Selector with a caller-provided random source (seeded in tests).
    pub fn with_rng(library: Arc<TrackLibrary>, rng: R) -> Self {
        Self { library, rng }
    }

    /// Returns a random available track for `emotion` other than `current`,
    /// or `None` when there is nothing to switch to.
    ///
    /// Tracks missing on disk are never returned. Every remaining candidate
    /// is equally likely, so with two tracks the choice alternates.
    ///
    /// # Examples
    ///
    /// ```
    /// use moodplay::emotion::EmotionLabel;
    /// use moodplay::library::TrackLibrary;
    /// use moodplay::selector::TrackSelector;
    /// use std::collections::BTreeMap;
    /// use std::path::PathBuf;
    /// use std::sync::Arc;
    ///
    /// let library = TrackLibrary::new(BTreeMap::from([(
    ///     EmotionLabel::Happy,
    ///     vec![PathBuf::from("/no/such/happy_music.mp3")],
    /// )]));
    /// let mut selector = TrackSelector::new(Arc::new(library));
    ///
    /// // configured but not on disk
    /// assert_eq!(selector.pick_track(EmotionLabel::Happy, None), None);
    /// assert_eq!(selector.pick_track(EmotionLabel::Sad, None), None);
    /// ```
    pub fn pick_track(&mut self, emotion: EmotionLabel, current: Option<&Path>) -> Option<PathBuf> {
        let candidates: Vec<&PathBuf> = self
            .library
            .available_tracks(emotion)
            .filter(|track| Some(track.as_path()) != current)
            .collect();

        debug!(
            "{} candidate track(s) for {emotion} (current: {:?})",
            candidates.len(),
            current
        );

        candidates.choose(&mut self.rng).map(|track| (*track).clone())
    }
}
