use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{FsddError, Result};

/// Directory name of the upstream repository once cloned.
pub const REPOSITORY_NAME: &str = "free-spoken-digit-dataset";
pub const REPOSITORY_URL: &str = "https://github.com/Jakobovski/free-spoken-digit-dataset";
/// Subdirectory of the repository holding the WAV files.
pub const RECORDINGS_DIR: &str = "recordings";

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// Where the recordings come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Version {
    /// An existing directory of WAV files.
    Local,
    /// A branch name or tag of the upstream repository, e.g. `master` or `v1.0.10`.
    Reference(String),
}

impl Default for Version {
    fn default() -> Self {
        Version::Reference("master".to_string())
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        if s == "local" {
            Version::Local
        } else {
            Version::Reference(s.to_string())
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Local => f.write_str("local"),
            Version::Reference(r) => f.write_str(r),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Clones a reference of a repository into `parent`.
pub trait RepositoryFetcher {
    /// Clone `url` at `reference` into `parent/<repository name>`.
    fn fetch(&self, url: &str, reference: &str, parent: &Path) -> Result<()>;
}

/// Fetches with the `git` executable.
#[derive(Debug, Clone, Default)]
pub struct GitFetcher;

impl RepositoryFetcher for GitFetcher {
    fn fetch(&self, url: &str, reference: &str, parent: &Path) -> Result<()> {
        log::info!("Cloning {url} ({reference}) into {}", parent.display());
        let status = Command::new("git")
            .arg("-C")
            .arg(parent)
            .args(["clone", url, "--branch", reference])
            .status()
            .map_err(|e| FsddError::Retrieval(format!("could not run git: {e}")))?;

        if !status.success() {
            return Err(FsddError::Retrieval(format!(
                "git clone of {url} at '{reference}' exited with {status}"
            )));
        }
        Ok(())
    }
}

/// Removes the cloned repository when dropped, whether or not the move
/// of its recordings succeeded.
struct CloneGuard(PathBuf);

impl Drop for CloneGuard {
    fn drop(&mut self) {
        if self.0.is_dir() {
            if let Err(e) = fs::remove_dir_all(&self.0) {
                log::warn!("Failed to remove {}: {e}", self.0.display());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetSource
// ---------------------------------------------------------------------------

/// Resolves the directory of WAV recordings.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    pub version: Version,
    /// Recordings directory for [`Version::Local`]; for a reference, the
    /// directory the repository is cloned into (defaults to the working
    /// directory).
    pub path: Option<PathBuf>,
    pub repository_url: String,
}

impl Default for DatasetSource {
    fn default() -> Self {
        Self {
            version: Version::default(),
            path: None,
            repository_url: REPOSITORY_URL.to_string(),
        }
    }
}

impl DatasetSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            version: Version::Local,
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn reference(reference: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            version: Version::Reference(reference.into()),
            path,
            ..Default::default()
        }
    }

    /// Resolve with [`GitFetcher`].
    pub fn resolve(&self) -> Result<PathBuf> {
        self.resolve_with(&GitFetcher)
    }

    /// Return the recordings directory, retrieving it first for a reference.
    pub fn resolve_with(&self, fetcher: &dyn RepositoryFetcher) -> Result<PathBuf> {
        match &self.version {
            Version::Local => {
                let path = self.path.clone().ok_or(FsddError::MissingLocalPath)?;
                if !path.is_dir() {
                    return Err(FsddError::DirectoryNotFound(path));
                }
                Ok(path)
            }
            Version::Reference(reference) => {
                let parent = match &self.path {
                    Some(p) => p.clone(),
                    None => std::env::current_dir()?,
                };
                retrieve(fetcher, &self.repository_url, reference, &parent)
            }
        }
    }
}

fn retrieve(
    fetcher: &dyn RepositoryFetcher,
    url: &str,
    reference: &str,
    parent: &Path,
) -> Result<PathBuf> {
    let target = parent.join(RECORDINGS_DIR);
    if target.exists() {
        return Err(FsddError::Retrieval(format!(
            "{} already exists; remove it or use the local version",
            target.display()
        )));
    }
    fs::create_dir_all(parent)?;

    let repo = parent.join(REPOSITORY_NAME);
    let _guard = CloneGuard(repo.clone());

    fetcher.fetch(url, reference, parent)?;

    let cloned = repo.join(RECORDINGS_DIR);
    if !cloned.is_dir() {
        return Err(FsddError::Retrieval(format!(
            "{} has no {RECORDINGS_DIR} directory",
            repo.display()
        )));
    }
    fs::rename(&cloned, &target)?;
    log::info!("Recordings available at {}", target.display());
    Ok(target)
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// All `.wav` files directly inside `dir`, sorted by path.
pub fn list_wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(FsddError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "wav") {
            files.push(path);
        }
    }
    files.sort();
    log::debug!("Found {} WAV files in {}", files.len(), dir.display());
    Ok(files)
}
