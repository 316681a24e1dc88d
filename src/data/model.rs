use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{FsddError, Result};

// ---------------------------------------------------------------------------
// Split – which subset a recording belongs to
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Recording – one parsed `{digit}_{speaker}_{index}.wav` file name
// ---------------------------------------------------------------------------

/// A recording file with the fields encoded in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub path: PathBuf,
    /// Spoken digit (0-9), used as the label.
    pub digit: u8,
    /// Speaker name, e.g. `jackson`.
    pub speaker: String,
    /// Zero-based take number of this digit/speaker combination.
    pub index: u32,
}

impl Recording {
    /// Parse the file name of `path`.
    ///
    /// The stem must split on `_` into exactly three fields, the first being a
    /// single decimal digit and the last a non-negative integer.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let invalid = |reason: &str| FsddError::InvalidFileName {
            path: path.clone(),
            reason: reason.to_string(),
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| invalid("file name is not valid UTF-8"))?;

        let fields: Vec<&str> = stem.split('_').collect();
        let [digit, speaker, index] = fields.as_slice() else {
            return Err(invalid("expected three '_'-separated fields"));
        };

        let digit = match digit.as_bytes() {
            [d @ b'0'..=b'9'] => d - b'0',
            _ => return Err(invalid("digit field must be a single character 0-9")),
        };
        let index = index
            .parse::<u32>()
            .map_err(|_| invalid("recording number is not a non-negative integer"))?;

        Ok(Self {
            speaker: speaker.to_string(),
            path,
            digit,
            index,
        })
    }

    /// One-based recording number, the quantity compared against split cut points.
    pub fn number(&self) -> u32 {
        self.index + 1
    }
}

/// Label of a recording file: the leading character of its file name as a digit.
pub fn label_of(path: &Path) -> Result<u8> {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.chars().next())
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
        .ok_or_else(|| FsddError::InvalidFileName {
            path: path.to_path_buf(),
            reason: "file name does not start with a digit".to_string(),
        })
}

// ---------------------------------------------------------------------------
// Waveform – decoded audio
// ---------------------------------------------------------------------------

/// Decoded audio, stored channel-major: all frames of channel 0, then
/// channel 1, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Waveform {
    /// Frames per channel.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Samples of a single channel.
    pub fn channel(&self, channel: u16) -> Option<&[f32]> {
        if channel >= self.channels {
            return None;
        }
        let frames = self.frames();
        let start = channel as usize * frames;
        self.samples.get(start..start + frames)
    }

    /// Collapse to a one-dimensional sample vector.
    pub fn flatten(self) -> Vec<f32> {
        self.samples
    }
}
