//! # Emotion Detectors
//!
//! The classifier itself is an external collaborator. This module defines
//! the interface the frame loop uses and two adapters that speak the common
//! face-emotion JSON shape:
//!
//! ```json
//! [{"box": [x, y, w, h], "emotions": {"happy": 0.91, "sad": 0.02, "neutral": 0.07}}]
//! ```
//!
//! - [`ReplayDetector`] replays pre-recorded results, one JSON array per line
//! - [`CommandDetector`] runs an external classifier process per frame
//!
//! Emotion names the player does not know are dropped; a face whose scores
//! are all unknown still counts as a face but has no top emotion.

use crate::emotion::{BoundingBox, DetectionResult, EmotionLabel};
use crate::frame::Frame;
use anyhow::{bail, Context, Result};
use log::{debug, trace};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Facial emotion classifier.
pub trait EmotionDetector {
    /// All faces found in `frame`, primary face first. May be empty.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionResult>>;

    /// Top emotion and score of the primary face, if any.
    fn top_emotion(&mut self, frame: &Frame) -> Result<Option<(EmotionLabel, f32)>> {
        Ok(self
            .detect(frame)?
            .first()
            .and_then(DetectionResult::top_emotion))
    }
}

impl<D: EmotionDetector + ?Sized> EmotionDetector for Box<D> {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionResult>> {
        (**self).detect(frame)
    }
}

#[derive(Debug, Deserialize)]
struct RawFace {
    #[serde(rename = "box")]
    bbox: [i64; 4],
    #[serde(default)]
    emotions: BTreeMap<String, f32>,
}

impl From<RawFace> for DetectionResult {
    fn from(raw: RawFace) -> Self {
        let [x, y, w, h] = raw.bbox;
        let scores = raw
            .emotions
            .into_iter()
            .filter_map(|(name, score)| match name.parse::<EmotionLabel>() {
                Ok(label) => Some((label, score)),
                Err(_) => {
                    trace!("Ignoring unknown emotion '{name}'");
                    None
                }
            })
            .collect();
        DetectionResult::new(
            BoundingBox::new(
                clamp_i32(x),
                clamp_i32(y),
                clamp_i32(w).max(0) as u32,
                clamp_i32(h).max(0) as u32,
            ),
            scores,
        )
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Parses one JSON array of faces.
///
/// # Errors
///
/// Returns an error if the text is not a JSON array of face objects.
pub fn parse_faces(json: &str) -> Result<Vec<DetectionResult>> {
    let raw: Vec<RawFace> = serde_json::from_str(json).context("Invalid detection JSON")?;
    Ok(raw.into_iter().map(DetectionResult::from).collect())
}

/// Detections recorded ahead of time, indexed by frame number.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    frames: Vec<Vec<DetectionResult>>,
}

impl ReplayDetector {
    /// Loads a JSON-lines file: line `n` holds the faces of frame `n`. A
    /// blank line means no faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or any non-blank line is
    /// not a JSON array of faces. The message names the file and the line.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read detections from {}", path.display()))?;
        Self::from_lines(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Same as [`ReplayDetector::from_file`] for text already in memory.
    ///
    /// ```
    /// use moodplay::detector::ReplayDetector;
    ///
    /// let detector = ReplayDetector::from_lines("[]\n\n[]\n")?;
    /// assert_eq!(detector.len(), 3);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_lines(text: &str) -> Result<Self> {
        let frames = text
            .lines()
            .enumerate()
            .map(|(n, line)| {
                if line.trim().is_empty() {
                    Ok(Vec::new())
                } else {
                    parse_faces(line).with_context(|| format!("Bad detections on line {}", n + 1))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { frames })
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl EmotionDetector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionResult>> {
        Ok(self.frames.get(frame.index()).cloned().unwrap_or_default())
    }
}

/// Runs an external classifier once per frame.
///
/// The frame is written to a temporary PNG whose path is appended as the
/// last argument; the process must print one JSON array of faces on stdout.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
}

impl CommandDetector {
    /// `command` is the program followed by its fixed arguments.
    pub fn new(command: &[String]) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            bail!("Detector command is empty");
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl EmotionDetector for CommandDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionResult>> {
        let file = tempfile::Builder::new()
            .prefix("moodplay-frame-")
            .suffix(".png")
            .tempfile()
            .context("Failed to create temporary frame file")?;
        frame
            .to_image()?
            .save_with_format(file.path(), image::ImageFormat::Png)
            .context("Failed to write temporary frame file")?;

        debug!("Running detector {} on frame {}", self.program, frame.index());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .output()
            .with_context(|| format!("Failed to execute detector {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Detector {} failed: {}", self.program, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(Vec::new());
        }
        parse_faces(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(index: usize) -> Frame {
        Frame::new(vec![0u8; 2 * 2 * 3], 2, 2, index)
    }

    #[test]
    fn test_parse_faces_fer_shape() -> Result<()> {
        let faces = parse_faces(
            r#"[{"box": [10, 20, 30, 40], "emotions": {"happy": 0.8, "sad": 0.1, "contempt": 0.95}}]"#,
        )?;
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].bbox, BoundingBox::new(10, 20, 30, 40));
        // unknown labels are dropped before the top emotion is taken
        assert_eq!(faces[0].top_emotion(), Some((EmotionLabel::Happy, 0.8)));
        Ok(())
    }

    #[test]
    fn test_parse_faces_negative_and_empty() -> Result<()> {
        let faces = parse_faces(r#"[{"box": [-5, -3, -1, 12]}]"#)?;
        assert_eq!(faces[0].bbox, BoundingBox::new(-5, -3, 0, 12));
        assert_eq!(faces[0].top_emotion(), None);
        assert!(parse_faces("[]")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_faces_rejects_garbage() {
        assert!(parse_faces("{not json").is_err());
        assert!(parse_faces(r#"{"box": [1,2,3,4]}"#).is_err());
    }

    #[test]
    fn test_replay_detector_by_frame_index() -> Result<()> {
        let mut detector = ReplayDetector::from_lines(
            "[{\"box\": [0,0,1,1], \"emotions\": {\"sad\": 0.9}}]\n\n[]\n",
        )?;
        assert_eq!(detector.len(), 3);
        assert_eq!(detector.top_emotion(&blank(0))?, Some((EmotionLabel::Sad, 0.9)));
        assert!(detector.detect(&blank(1))?.is_empty());
        assert!(detector.detect(&blank(2))?.is_empty());
        // past the recording
        assert!(detector.detect(&blank(99))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_replay_detector_reports_bad_line() {
        let err = ReplayDetector::from_lines("[]\n[oops\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_command_detector_rejects_empty_command() {
        assert!(CommandDetector::new(&[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_detector_parses_stdout() -> Result<()> {
        let mut detector = CommandDetector::new(&[
            "sh".to_string(),
            "-c".to_string(),
            r#"echo '[{"box":[1,2,3,4],"emotions":{"angry":0.7,"fear":0.2}}]'"#.to_string(),
            "detector".to_string(),
        ])?;
        let faces = detector.detect(&blank(0))?;
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].top_emotion(), Some((EmotionLabel::Angry, 0.7)));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_command_detector_failure_is_error() -> Result<()> {
        let mut detector = CommandDetector::new(&["false".to_string()])?;
        assert!(detector.detect(&blank(0)).is_err());
        Ok(())
    }
}
