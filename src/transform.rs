//! Preprocessing transforms applied to a flattened waveform on access.

use crate::error::{FsddError, Result};

/// A transformation of a one-dimensional sample vector.
pub trait Transform: Send + Sync {
    fn apply(&self, samples: Vec<f32>) -> Vec<f32>;
}

impl<F> Transform for F
where
    F: Fn(Vec<f32>) -> Vec<f32> + Send + Sync,
{
    fn apply(&self, samples: Vec<f32>) -> Vec<f32> {
        self(samples)
    }
}

// ---------------------------------------------------------------------------
// TrimSilence
// ---------------------------------------------------------------------------

/// Removes leading and trailing silence.
///
/// Expects normalized audio: a sample is silent when its absolute value does
/// not exceed `threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimSilence {
    threshold: f32,
}

impl TrimSilence {
    pub fn new(threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(FsddError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Bounds `start..end` of the non-silent region; `0..0` when every sample is silent.
    pub fn bounds(&self, samples: &[f32]) -> (usize, usize) {
        let loud = |s: &f32| s.abs() > self.threshold;
        let start = samples.iter().position(loud).unwrap_or(0);
        let end = samples
            .iter()
            .rposition(loud)
            .map(|i| i + 1)
            .unwrap_or(0);
        (start, end)
    }
}

impl Transform for TrimSilence {
    fn apply(&self, mut samples: Vec<f32>) -> Vec<f32> {
        let (start, end) = self.bounds(&samples);
        samples.truncate(end);
        samples.drain(..start.min(end));
        samples
    }
}

// ---------------------------------------------------------------------------
// Compose
// ---------------------------------------------------------------------------

/// Applies transforms in order.
#[derive(Default)]
pub struct Compose {
    steps: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: impl Transform + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Transform for Compose {
    fn apply(&self, samples: Vec<f32>) -> Vec<f32> {
        self.steps.iter().fold(samples, |acc, step| step.apply(acc))
    }
}
