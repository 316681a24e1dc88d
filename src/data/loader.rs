use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use serde::{Deserialize, Serialize};

use super::model::Waveform;
use crate::error::{FsddError, Result};

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

/// Options controlling how a recording is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Scale integer PCM into `[-1, 1]`. When false, integer samples are
    /// returned at their raw magnitude (float files are unaffected).
    pub normalize: bool,
    /// Number of frames to skip from the start of the file.
    pub frame_offset: u32,
    /// Maximum number of frames to read; `None` reads to the end.
    pub num_frames: Option<u32>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            frame_offset: 0,
            num_frames: None,
        }
    }
}

impl LoadOptions {
    pub fn validate(&self) -> Result<()> {
        if self.num_frames == Some(0) {
            return Err(FsddError::InvalidLoadOptions(
                "num_frames must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a recording from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.wav` – 8/16/24/32-bit integer PCM or 32-bit float
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Waveform> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "wav" => load_wav(path, options),
        other => Err(FsddError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// WAV loader
// ---------------------------------------------------------------------------

fn load_wav(path: &Path, options: &LoadOptions) -> Result<Waveform> {
    options.validate()?;

    let wav_err = |source: hound::Error| FsddError::Wav {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = WavReader::open(path).map_err(wav_err)?;
    let spec = reader.spec();
    let channels = spec.channels;

    let available = reader.duration();
    let offset = options.frame_offset.min(available);
    if offset > 0 {
        reader.seek(offset).map_err(FsddError::Io)?;
    }
    let frames = match options.num_frames {
        Some(n) => n.min(available - offset),
        None => available - offset,
    };
    let wanted = frames as usize * channels as usize;

    let interleaved = match spec.sample_format {
        SampleFormat::Float => read_float(&mut reader, wanted).map_err(wav_err)?,
        SampleFormat::Int => {
            let scale = if options.normalize {
                1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32
            } else {
                1.0
            };
            read_int(&mut reader, wanted, scale).map_err(wav_err)?
        }
    };

    log::debug!(
        "Decoded {}: {} frames x {} channels @ {} Hz",
        path.display(),
        frames,
        channels,
        spec.sample_rate
    );

    Ok(Waveform {
        samples: deinterleave(&interleaved, channels),
        channels,
        sample_rate: spec.sample_rate,
    })
}

fn read_float(
    reader: &mut WavReader<BufReader<File>>,
    wanted: usize,
) -> std::result::Result<Vec<f32>, hound::Error> {
    reader.samples::<f32>().take(wanted).collect()
}

fn read_int(
    reader: &mut WavReader<BufReader<File>>,
    wanted: usize,
    scale: f32,
) -> std::result::Result<Vec<f32>, hound::Error> {
    reader
        .samples::<i32>()
        .take(wanted)
        .map(|s| s.map(|v| v as f32 * scale))
        .collect()
}

/// Reorder interleaved frames (`L R L R ...`) into channel-major layout.
fn deinterleave(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels as usize;
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let frames = interleaved.len() / channels;
    let mut out = Vec::with_capacity(frames * channels);
    for ch in 0..channels {
        out.extend(interleaved.chunks_exact(channels).map(|frame| frame[ch]));
    }
    out
}
