//! # Overlay Composition
//!
//! Turns the per-frame state into a display-independent [`Overlay`]: the
//! primary face box and its label, the now-playing line, the volume line and
//! the key help. Displays decide how to actually draw it.

use crate::controller::display_name;
use crate::emotion::{BoundingBox, EmotionLabel};
use std::path::Path;

/// RGB colour.
pub type Color = [u8; 3];

pub const WHITE: Color = [255, 255, 255];

/// Key help shown at the bottom of every frame.
pub const HELP_LINE: &str = "Q:Quit  Space:Pause  +/-:Volume  N:Next";

/// Box colour for an emotion; white for emotions without their own colour.
#[must_use]
pub const fn emotion_color(emotion: EmotionLabel) -> Color {
    match emotion {
        EmotionLabel::Happy => [255, 255, 0],
        EmotionLabel::Sad => [0, 0, 255],
        EmotionLabel::Angry => [255, 0, 0],
        _ => WHITE,
    }
}

/// Face box with its caption.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMarker {
    pub bbox: BoundingBox,
    pub label: String,
    pub color: Color,
}

/// Everything drawn on top of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub face: Option<FaceMarker>,
    pub now_playing: String,
    pub volume: String,
    pub help: &'static str,
}

impl Overlay {
    /// Text lines in drawing order, face caption first when present.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.face
            .as_ref()
            .map(|face| face.label.as_str())
            .into_iter()
            .chain([self.now_playing.as_str(), self.volume.as_str(), self.help])
    }
}

/// The primary face as seen this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceView {
    pub bbox: BoundingBox,
    /// Dominant emotion after smoothing; picks the label text and colour.
    pub dominant: EmotionLabel,
    /// Classifier score of this frame's top emotion.
    pub score: f32,
}

/// Builds the overlay for one frame.
#[must_use]
pub fn compose_overlay(face: Option<FaceView>, track: Option<&Path>, volume: f32) -> Overlay {
    let face = face.map(|view| FaceMarker {
        bbox: view.bbox,
        label: format!("{}: {:.2}", view.dominant, view.score),
        color: emotion_color(view.dominant),
    });

    Overlay {
        face,
        now_playing: format!("Now: {}", track.map(display_name).unwrap_or_default()),
        volume: format!("Volume: {}%", (volume * 100.0).round() as u32),
        help: HELP_LINE,
    }
}
