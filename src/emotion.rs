//! # Emotion Types
//!
//! Labels, bounding boxes and per-face detection results shared by the
//! detector adapters, the history tracker and the overlay renderer.
//!
//! The label set is closed and matches the seven classes produced by common
//! facial-expression classifiers. Every label parses from and displays as its
//! lowercase name, which is also the key used in the track library config.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the emotions the classifier can report.
///
/// Variant order is significant: it is the tie-break order for
/// [`DetectionResult::top_emotion`] and the iteration order of score maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    #[default]
    Neutral,
}

impl EmotionLabel {
    /// All labels in tie-break order.
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
        EmotionLabel::Neutral,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Angry => "angry",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        EmotionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown emotion label '{s}'"))
    }
}

/// Axis-aligned face rectangle in frame pixel coordinates.
///
/// `x`/`y` may be negative when a face is partially outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// One detected face: where it is and how confident the classifier is in
/// each emotion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionResult {
    pub bbox: BoundingBox,
    pub scores: BTreeMap<EmotionLabel, f32>,
}

impl DetectionResult {
    #[must_use]
    pub fn new(bbox: BoundingBox, scores: BTreeMap<EmotionLabel, f32>) -> Self {
        Self { bbox, scores }
    }

    /// Label with the highest score, first label in [`EmotionLabel::ALL`]
    /// order on ties. `None` when the classifier returned no scores.
    #[must_use]
    pub fn top_emotion(&self) -> Option<(EmotionLabel, f32)> {
        self.scores
            .iter()
            .fold(None, |best: Option<(EmotionLabel, f32)>, (&label, &score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((label, score)),
            })
    }
}
