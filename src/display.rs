//! # Display and Keyboard Input
//!
//! The frame loop presents every composed frame through a [`Display`] and
//! then polls it for one keyboard command with a short timeout.
//!
//! [`TerminalDisplay`] is the headless implementation: overlay text goes to
//! the log (only when it changes), annotated frames can be written as PNGs,
//! and keys are read from stdin lines on a helper thread so the poll never
//! blocks longer than its timeout.

use crate::frame::Frame;
use crate::render::Overlay;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::fs;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Runtime keyboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Quit,
    TogglePause,
    VolumeUp,
    VolumeDown,
    Skip,
}

/// Presents frames and reports key presses.
pub trait Display {
    fn show(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()>;

    /// Waits at most `timeout` for a command.
    fn poll_key(&mut self, timeout: Duration) -> Option<KeyCommand>;

    /// Closes the window or output. Must be safe to call twice.
    fn close(&mut self);
}

/// Maps one key to a command.
#[must_use]
pub fn key_command(key: char) -> Option<KeyCommand> {
    match key.to_ascii_lowercase() {
        'q' => Some(KeyCommand::Quit),
        ' ' => Some(KeyCommand::TogglePause),
        '+' | '=' => Some(KeyCommand::VolumeUp),
        '-' => Some(KeyCommand::VolumeDown),
        'n' => Some(KeyCommand::Skip),
        _ => None,
    }
}

/// Parses one line of terminal input: either a command word or a run of
/// single-key commands (`"++"` is two volume steps).
#[must_use]
pub fn parse_line(line: &str) -> Vec<KeyCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "quit" | "exit" | "stop" => return vec![KeyCommand::Quit],
        "pause" | "resume" => return vec![KeyCommand::TogglePause],
        "up" => return vec![KeyCommand::VolumeUp],
        "down" => return vec![KeyCommand::VolumeDown],
        "next" | "skip" => return vec![KeyCommand::Skip],
        _ => {}
    }

    line.chars()
        .filter_map(|key| {
            let command = key_command(key);
            if command.is_none() && !key.is_whitespace() {
                warn!("Unrecognized key '{key}'. Try q, space, +, - or n");
            }
            command
        })
        .collect()
}

/// Headless display with stdin keyboard input.
///
/// # Output
///
/// Overlay text is not rasterised. The face caption and the `Now:` and
/// `Volume:` lines are logged at `info` level as one `|`-separated line
/// whenever they differ from the previous frame, and the help line is
/// logged once at start-up. PNGs written to `output_dir` carry the frame
/// with only the face box drawn in the emotion colour, named
/// `frame_<index>.png` with the index zero-padded to six digits.
///
/// # Keyboard
///
/// Each stdin line is either a command word (`quit`, `pause`, `skip`, ...)
/// or a run of single keys. End of input counts as a quit request.
pub struct TerminalDisplay {
    output_dir: Option<PathBuf>,
    input: Option<Receiver<String>>,
    pending: VecDeque<KeyCommand>,
    last_lines: Vec<String>,
    closed: bool,
}

impl TerminalDisplay {
    /// `output_dir`: where annotated frames are written, if anywhere.
    /// `read_stdin`: whether to take keyboard commands from stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if `output_dir` does not exist and cannot be created.
    pub fn new(output_dir: Option<PathBuf>, read_stdin: bool) -> Result<Self> {
        if let Some(dir) = &output_dir {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        }

        let input = read_stdin.then(|| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
            rx
        });

        info!("{}", crate::render::HELP_LINE);
        Ok(Self::with_input(output_dir, input))
    }

    /// Display fed from an arbitrary line channel instead of stdin.
    #[must_use]
    pub fn with_input(output_dir: Option<PathBuf>, input: Option<Receiver<String>>) -> Self {
        Self {
            output_dir,
            input,
            pending: VecDeque::new(),
            last_lines: Vec::new(),
            closed: false,
        }
    }

    fn write_frame(&self, frame: &Frame, overlay: &Overlay) -> Result<()> {
        let Some(dir) = &self.output_dir else {
            return Ok(());
        };
        let mut annotated = frame.clone();
        if let Some(face) = &overlay.face {
            annotated.draw_rect(face.bbox.x, face.bbox.y, face.bbox.width, face.bbox.height, 2, face.color);
        }
        let path = dir.join(format!("frame_{:06}.png", frame.index()));
        annotated
            .to_image()?
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

impl Display for TerminalDisplay {
    fn show(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        // the help line never changes; only log the state lines
        let lines: Vec<String> = overlay
            .lines()
            .filter(|line| *line != overlay.help)
            .map(str::to_owned)
            .collect();
        if lines != self.last_lines {
            info!("{}", lines.join(" | "));
            self.last_lines = lines;
        }
        self.write_frame(frame, overlay)
    }

    fn poll_key(&mut self, timeout: Duration) -> Option<KeyCommand> {
        if let Some(command) = self.pending.pop_front() {
            return Some(command);
        }
        let Some(input) = &self.input else {
            thread::sleep(timeout);
            return None;
        };

        match input.recv_timeout(timeout) {
            Ok(line) => {
                self.pending.extend(parse_line(&line));
                self.pending.pop_front()
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Keyboard input closed");
                self.input = None;
                Some(KeyCommand::Quit)
            }
        }
    }

    fn close(&mut self) {
        if !self.closed {
            debug!("Display closed");
        }
        self.closed = true;
        self.input = None;
    }
}
