//! TOML configuration.
//!
//! ```toml
//! [source]
//! version = "v1.0.10"     # or "local"
//! path = "data"
//!
//! [split]
//! test_size = 0.1
//! val_size = 0.1          # omit for a train/test split
//!
//! [loading]
//! mode = "eager"
//! normalize = true
//!
//! [transform]
//! trim_threshold = 0.1
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::dataset::LoadingMode;
use crate::data::loader::LoadOptions;
use crate::data::source::{DatasetSource, Version, REPOSITORY_URL};
use crate::data::split::Proportions;
use crate::error::{FsddError, Result};
use crate::transform::TrimSilence;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsddConfig {
    pub source: SourceConfig,
    pub split: SplitConfig,
    pub loading: LoadingConfig,
    pub transform: TransformConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// `"local"`, a branch name, or a tag.
    pub version: String,
    pub path: Option<PathBuf>,
    pub repository_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            version: Version::default().to_string(),
            path: None,
            repository_url: REPOSITORY_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_size: f64,
    pub val_size: Option<f64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.1,
            val_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    pub mode: LoadingMode,
    #[serde(flatten)]
    pub options: LoadOptions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Enables [`TrimSilence`] with this threshold.
    pub trim_threshold: Option<f32>,
}

impl FsddConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| FsddError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check every section without touching the filesystem.
    pub fn validate(&self) -> Result<()> {
        self.split.proportions().validate()?;
        self.loading.options.validate()?;
        self.trim()?;
        Ok(())
    }

    pub fn dataset_source(&self) -> DatasetSource {
        DatasetSource {
            version: Version::from(self.source.version.as_str()),
            path: self.source.path.clone(),
            repository_url: self.source.repository_url.clone(),
        }
    }

    pub fn trim(&self) -> Result<Option<TrimSilence>> {
        self.transform.trim_threshold.map(TrimSilence::new).transpose()
    }
}

impl SplitConfig {
    pub fn proportions(&self) -> Proportions {
        match self.val_size {
            Some(val) => Proportions::TrainValTest {
                test: self.test_size,
                val,
            },
            None => Proportions::TrainTest {
                test: self.test_size,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = FsddConfig::from_toml_str("").unwrap();
        assert_eq!(config, FsddConfig::default());
        assert_eq!(config.dataset_source().version, Version::Reference("master".to_string()));
        assert_eq!(config.split.proportions(), Proportions::TrainTest { test: 0.1 });
        assert!(config.trim().unwrap().is_none());
    }

    #[test]
    fn full_file() {
        let config = FsddConfig::from_toml_str(
            r#"
            [source]
            version = "local"
            path = "data/recordings"

            [split]
            test_size = 0.2
            val_size = 0.1

            [loading]
            mode = "eager"
            normalize = false
            num_frames = 4000

            [transform]
            trim_threshold = 0.05
            "#,
        )
        .unwrap();

        let source = config.dataset_source();
        assert_eq!(source.version, Version::Local);
        assert_eq!(source.path, Some(PathBuf::from("data/recordings")));
        assert_eq!(config.split.proportions(), Proportions::TrainValTest { test: 0.2, val: 0.1 });
        assert_eq!(config.loading.mode, LoadingMode::Eager);
        assert!(!config.loading.options.normalize);
        assert_eq!(config.loading.options.num_frames, Some(4000));
        assert_eq!(config.trim().unwrap().unwrap().threshold(), 0.05);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            FsddConfig::from_toml_str("[split]\ntest_size = 1.5"),
            Err(FsddError::InvalidProportion(_))
        ));
        assert!(matches!(
            FsddConfig::from_toml_str("[transform]\ntrim_threshold = 2.0"),
            Err(FsddError::InvalidThreshold(_))
        ));
        assert!(matches!(
            FsddConfig::from_toml_str("[loading]\nnum_frames = 0"),
            Err(FsddError::InvalidLoadOptions(_))
        ));
        assert!(matches!(
            FsddConfig::from_toml_str("[split]\ntest_size = \"a lot\""),
            Err(FsddError::Config(_))
        ));
    }
}
