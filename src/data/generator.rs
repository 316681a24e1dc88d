use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::dataset::{FsddDataset, LoadingMode};
use super::loader::LoadOptions;
use super::source::{list_wav_files, DatasetSource, RepositoryFetcher};
use super::split::{partition, Proportions};
use crate::error::Result;
use crate::transform::Transform;

/// Produces [`FsddDataset`]s for the whole FSDD or for deterministic splits
/// of it.
///
/// Every produced dataset shares the generator's transform, loading mode and
/// load options.
pub struct FsddGenerator {
    path: PathBuf,
    all_files: Vec<PathBuf>,
    transform: Option<Arc<dyn Transform>>,
    mode: LoadingMode,
    options: LoadOptions,
}

impl FsddGenerator {
    /// Resolve `source` (cloning it if needed) and enumerate its recordings.
    pub fn new(source: &DatasetSource) -> Result<Self> {
        let path = source.resolve()?;
        Self::from_dir(path)
    }

    /// Like [`new`](Self::new) but with a custom fetcher for references.
    pub fn with_fetcher(source: &DatasetSource, fetcher: &dyn RepositoryFetcher) -> Result<Self> {
        let path = source.resolve_with(fetcher)?;
        Self::from_dir(path)
    }

    fn from_dir(path: PathBuf) -> Result<Self> {
        let all_files = list_wav_files(&path)?;
        log::info!("{} recordings in {}", all_files.len(), path.display());
        Ok(Self {
            path,
            all_files,
            transform: None,
            mode: LoadingMode::Lazy,
            options: LoadOptions::default(),
        })
    }

    pub fn transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn loading_mode(mut self, mode: LoadingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn load_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Directory holding the recordings.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn all_files(&self) -> &[PathBuf] {
        &self.all_files
    }

    fn dataset(&self, files: Vec<PathBuf>) -> Result<FsddDataset> {
        FsddDataset::new(files, self.transform.clone(), self.mode, self.options)
    }

    /// The entire dataset.
    pub fn full(&self) -> Result<FsddDataset> {
        self.dataset(self.all_files.clone())
    }

    /// `(train, test)` where test holds the first `trunc(50 * test_size)`
    /// takes of every digit/speaker combination.
    pub fn train_test_split(&self, test_size: f64) -> Result<(FsddDataset, FsddDataset)> {
        let parts = partition(&self.all_files, Proportions::TrainTest { test: test_size })?;
        Ok((self.dataset(parts.train)?, self.dataset(parts.test)?))
    }

    /// `(train, validation, test)`: the first `trunc(50 * test_size)` takes
    /// go to test, the next `trunc(50 * val_size)` to validation.
    pub fn train_val_test_split(
        &self,
        test_size: f64,
        val_size: f64,
    ) -> Result<(FsddDataset, FsddDataset, FsddDataset)> {
        let parts = partition(
            &self.all_files,
            Proportions::TrainValTest {
                test: test_size,
                val: val_size,
            },
        )?;
        Ok((
            self.dataset(parts.train)?,
            self.dataset(parts.validation)?,
            self.dataset(parts.test)?,
        ))
    }
}

impl std::fmt::Debug for FsddGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsddGenerator")
            .field("path", &self.path)
            .field("files", &self.all_files.len())
            .field("mode", &self.mode)
            .field("options", &self.options)
            .finish()
    }
}
