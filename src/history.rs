//! # Emotion History
//!
//! Smooths per-frame classifier output with a short majority vote so a single
//! mis-classified frame does not flip the music.
//!
//! The window is a FIFO of `(label, score)` pairs capped at
//! `history_length` entries. [`EmotionHistory::dominant_emotion`] returns
//! the most frequent label in the window.
//!
//! ## Tie-break
//!
//! When several labels share the highest count, the label whose first
//! occurrence in the current window is oldest wins. With the window
//! `[sad, happy, happy, sad]` the result is `sad`.

use crate::emotion::EmotionLabel;
use std::collections::VecDeque;

/// Default number of frames the vote is taken over.
pub const DEFAULT_HISTORY_LENGTH: usize = 5;

/// A single recorded observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub emotion: EmotionLabel,
    pub score: f32,
}

/// Bounded recent-history buffer with majority voting.
#[derive(Debug, Clone)]
pub struct EmotionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for EmotionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LENGTH)
    }
}

impl EmotionHistory {
    /// Creates an empty history. A `history_length` of 0 is treated as 1.
    #[must_use]
    pub fn new(history_length: usize) -> Self {
        let capacity = history_length.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends an observation, evicting the oldest one when full.
    pub fn record(&mut self, emotion: EmotionLabel, score: f32) {
        self.entries.push_back(HistoryEntry { emotion, score });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Majority-vote label over the window, `neutral` when empty.
    #[must_use]
    pub fn dominant_emotion(&self) -> EmotionLabel {
        // (label, count) in order of first appearance
        let mut counts: Vec<(EmotionLabel, usize)> = Vec::with_capacity(EmotionLabel::ALL.len());
        for entry in &self.entries {
            match counts.iter_mut().find(|(label, _)| *label == entry.emotion) {
                Some((_, count)) => *count += 1,
                None => counts.push((entry.emotion, 1)),
            }
        }

        counts
            .into_iter()
            .fold(None, |best: Option<(EmotionLabel, usize)>, (label, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((label, count)),
            })
            .map_or(EmotionLabel::Neutral, |(label, _)| label)
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
