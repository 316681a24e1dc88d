//! Free Spoken Digit Dataset as deterministic train/validation/test splits.
//!
//! ```no_run
//! use fsdd::{DatasetSource, Dataset, FsddGenerator, TrimSilence};
//!
//! # fn main() -> fsdd::Result<()> {
//! let fsdd = FsddGenerator::new(&DatasetSource::reference("v1.0.10", None))?
//!     .transform(TrimSilence::new(0.1)?);
//! let (train, test) = fsdd.train_test_split(0.1)?;
//! let (samples, label) = train.get(0)?;
//! println!("{} samples of digit {label}, {} test recordings", samples.len(), test.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod transform;

pub use config::FsddConfig;
pub use data::dataset::{DataLoader, Dataset, FsddDataset, LoadingMode};
pub use data::generator::FsddGenerator;
pub use data::loader::{load_file, LoadOptions};
pub use data::model::{Recording, Split, Waveform};
pub use data::source::{DatasetSource, GitFetcher, RepositoryFetcher, Version};
pub use data::split::{partition, Partition, Proportions, SplitCounts, N_REC};
pub use error::{FsddError, Result};
pub use transform::{Compose, Transform, TrimSilence};
