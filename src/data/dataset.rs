use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::loader::{load_file, LoadOptions};
use super::model::{label_of, Waveform};
use crate::error::{FsddError, Result};
use crate::transform::Transform;

// ---------------------------------------------------------------------------
// Dataset trait
// ---------------------------------------------------------------------------

/// Random-access collection of samples.
pub trait Dataset {
    type Item;

    fn len(&self) -> usize;

    /// Sample at `index`, loading it if necessary.
    fn get(&self, index: usize) -> Result<Self::Item>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every sample in order.
    fn iter(&self) -> DatasetIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetIter { dataset: self, index: 0 }
    }
}

pub struct DatasetIter<'a, D> {
    dataset: &'a D,
    index: usize,
}

impl<D: Dataset> Iterator for DatasetIter<'_, D> {
    type Item = Result<D::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.dataset.len() {
            return None;
        }
        let item = self.dataset.get(self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.dataset.len().saturating_sub(self.index);
        (rest, Some(rest))
    }
}

// ---------------------------------------------------------------------------
// FsddDataset
// ---------------------------------------------------------------------------

/// Whether recordings are decoded up front or on every access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingMode {
    #[default]
    Lazy,
    Eager,
}

enum Storage {
    Lazy,
    Eager {
        recordings: Vec<Waveform>,
        labels: Vec<u8>,
    },
}

/// A set of FSDD recordings yielding `(samples, label)` pairs.
///
/// Samples are the flattened waveform, passed through the transform when one
/// is set. Usually built by [`FsddGenerator`](super::generator::FsddGenerator)
/// rather than by hand.
pub struct FsddDataset {
    files: Vec<PathBuf>,
    transform: Option<Arc<dyn Transform>>,
    options: LoadOptions,
    storage: Storage,
}

impl FsddDataset {
    /// Wrap `files`. In [`LoadingMode::Eager`] every file is decoded here and
    /// the first failure is returned.
    pub fn new(
        files: Vec<PathBuf>,
        transform: Option<Arc<dyn Transform>>,
        mode: LoadingMode,
        options: LoadOptions,
    ) -> Result<Self> {
        options.validate()?;

        let storage = match mode {
            LoadingMode::Lazy => Storage::Lazy,
            LoadingMode::Eager => {
                let mut recordings = Vec::with_capacity(files.len());
                let mut labels = Vec::with_capacity(files.len());
                for file in &files {
                    recordings.push(load_file(file, &options)?);
                    labels.push(label_of(file)?);
                }
                log::info!("Loaded {} recordings into memory", recordings.len());
                Storage::Eager { recordings, labels }
            }
        };

        Ok(Self {
            files,
            transform,
            options,
            storage,
        })
    }

    /// Lazily loaded dataset with default options and no transform.
    pub fn from_files(files: Vec<PathBuf>) -> Result<Self> {
        Self::new(files, None, LoadingMode::Lazy, LoadOptions::default())
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn mode(&self) -> LoadingMode {
        match self.storage {
            Storage::Lazy => LoadingMode::Lazy,
            Storage::Eager { .. } => LoadingMode::Eager,
        }
    }

    /// Raw decoded recordings; only available in eager mode.
    pub fn recordings(&self) -> Option<&[Waveform]> {
        match &self.storage {
            Storage::Eager { recordings, .. } => Some(recordings.as_slice()),
            Storage::Lazy => None,
        }
    }

    /// Labels of every recording; only available in eager mode.
    pub fn labels(&self) -> Option<&[u8]> {
        match &self.storage {
            Storage::Eager { labels, .. } => Some(labels.as_slice()),
            Storage::Lazy => None,
        }
    }

    /// Decoded recording at `index` and its label, before flattening or any
    /// transform.
    pub fn waveform(&self, index: usize) -> Result<(Waveform, u8)> {
        if index >= self.files.len() {
            return Err(FsddError::IndexOutOfBounds {
                index,
                len: self.files.len(),
            });
        }
        match &self.storage {
            Storage::Eager { recordings, labels } => Ok((recordings[index].clone(), labels[index])),
            Storage::Lazy => {
                let file = &self.files[index];
                Ok((load_file(file, &self.options)?, label_of(file)?))
            }
        }
    }
}

impl Dataset for FsddDataset {
    type Item = (Vec<f32>, u8);

    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize) -> Result<Self::Item> {
        let (waveform, label) = self.waveform(index)?;
        let samples = waveform.flatten();
        let samples = match &self.transform {
            Some(t) => t.apply(samples),
            None => samples,
        };
        Ok((samples, label))
    }
}

impl std::fmt::Debug for FsddDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsddDataset")
            .field("files", &self.files.len())
            .field("mode", &self.mode())
            .field("transform", &self.transform.is_some())
            .field("options", &self.options)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// DataLoader – batching over any Dataset
// ---------------------------------------------------------------------------

/// Iterates a dataset in batches, optionally in a shuffled order.
///
/// Shuffling is seeded so that a given seed always yields the same order.
pub struct DataLoader<'a, D: Dataset> {
    dataset: &'a D,
    order: Vec<usize>,
    batch_size: usize,
    position: usize,
}

impl<'a, D: Dataset> DataLoader<'a, D> {
    pub fn new(dataset: &'a D, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(FsddError::InvalidBatchSize);
        }
        Ok(Self {
            order: (0..dataset.len()).collect(),
            dataset,
            batch_size,
            position: 0,
        })
    }

    pub fn shuffled(mut self, seed: u64) -> Self {
        self.order.shuffle(&mut StdRng::seed_from_u64(seed));
        self
    }

    pub fn num_batches(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }
}

impl<D: Dataset> Iterator for DataLoader<'_, D> {
    type Item = Result<Vec<D::Item>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.order.len() {
            return None;
        }
        let end = (self.position + self.batch_size).min(self.order.len());
        let batch = self.order[self.position..end]
            .iter()
            .map(|&i| self.dataset.get(i))
            .collect();
        self.position = end;
        Some(batch)
    }
}
