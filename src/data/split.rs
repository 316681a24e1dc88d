use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::model::{Recording, Split};
use crate::error::{FsddError, Result};

/// Recordings per digit/speaker combination.
pub const N_REC: u32 = 50;

// ---------------------------------------------------------------------------
// Proportions → cut points
// ---------------------------------------------------------------------------

/// Split sizes expressed as proportions of [`N_REC`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proportions {
    /// Train/test only. `test` must lie in `[0, 1)`.
    TrainTest { test: f64 },
    /// Train/validation/test. Both in `(0, 1)`, summing to less than 1.
    TrainValTest { test: f64, val: f64 },
}

impl Proportions {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Proportions::TrainTest { test } => {
                if !(0.0..1.0).contains(&test) {
                    return Err(FsddError::InvalidProportion(format!(
                        "test_size must lie in [0, 1), got {test}"
                    )));
                }
            }
            Proportions::TrainValTest { test, val } => {
                for (name, p) in [("test_size", test), ("val_size", val)] {
                    if !(p > 0.0 && p < 1.0) {
                        return Err(FsddError::InvalidProportion(format!(
                            "{name} must lie in (0, 1), got {p}"
                        )));
                    }
                }
                if test + val >= 1.0 {
                    return Err(FsddError::InvalidProportion(format!(
                        "test_size + val_size must be below 1, got {}",
                        test + val
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validated cut points for these proportions.
    pub fn cut_points(&self) -> Result<CutPoints> {
        self.validate()?;
        Ok(match *self {
            Proportions::TrainTest { test } => CutPoints { n_test: truncated(test), n_val: 0 },
            Proportions::TrainValTest { test, val } => CutPoints {
                n_test: truncated(test),
                n_val: truncated(val),
            },
        })
    }
}

/// `trunc(N_REC * p)`. Small proportions can yield zero recordings.
fn truncated(p: f64) -> u32 {
    (N_REC as f64 * p) as u32
}

/// Integer thresholds on the one-based recording number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutPoints {
    pub n_test: u32,
    pub n_val: u32,
}

impl CutPoints {
    /// Split for a one-based recording number.
    pub fn assign(&self, number: u32) -> Split {
        if number <= self.n_test {
            Split::Test
        } else if number <= self.n_test + self.n_val {
            Split::Validation
        } else {
            Split::Train
        }
    }
}

// ---------------------------------------------------------------------------
// Partition of a file list
// ---------------------------------------------------------------------------

/// Files grouped by split, each group in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub train: Vec<PathBuf>,
    pub validation: Vec<PathBuf>,
    pub test: Vec<PathBuf>,
}

/// Number of files per split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

impl Partition {
    pub fn files(&self, split: Split) -> &[PathBuf] {
        match split {
            Split::Train => &self.train,
            Split::Validation => &self.validation,
            Split::Test => &self.test,
        }
    }

    pub fn counts(&self) -> SplitCounts {
        SplitCounts {
            train: self.train.len(),
            validation: self.validation.len(),
            test: self.test.len(),
        }
    }

    /// Which split `path` was assigned to, if it is part of the partition.
    /// Scans every group; iterate [`by_split`](Self::by_split) for bulk output.
    pub fn split_of(&self, path: &Path) -> Option<Split> {
        [Split::Test, Split::Validation, Split::Train]
            .into_iter()
            .find(|&s| self.files(s).iter().any(|f| f == path))
    }

    /// Per-split files keyed by split, for reporting.
    pub fn by_split(&self) -> BTreeMap<Split, &[PathBuf]> {
        [Split::Train, Split::Validation, Split::Test]
            .into_iter()
            .map(|s| (s, self.files(s)))
            .collect()
    }
}

/// Assign every file to a split.
///
/// Proportions are validated and every file name parsed before any file is
/// assigned, so an error leaves nothing half-partitioned.
pub fn partition(files: &[PathBuf], proportions: Proportions) -> Result<Partition> {
    let cuts = proportions.cut_points()?;
    let recordings = files
        .iter()
        .map(|f| Recording::from_path(f.clone()))
        .collect::<Result<Vec<_>>>()?;

    let mut out = Partition::default();
    for rec in recordings {
        match cuts.assign(rec.number()) {
            Split::Train => out.train.push(rec.path),
            Split::Validation => out.validation.push(rec.path),
            Split::Test => out.test.push(rec.path),
        }
    }

    log::debug!(
        "Partitioned {} files (n_test={}, n_val={}) → {:?}",
        files.len(),
        cuts.n_test,
        cuts.n_val,
        out.counts()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    /// Two speakers x two digits x `N_REC` takes.
    fn grid() -> Vec<PathBuf> {
        let mut files = Vec::new();
        for digit in [3, 8] {
            for speaker in ["jackson", "theo"] {
                for i in 0..N_REC {
                    files.push(PathBuf::from(format!("rec/{digit}_{speaker}_{i}.wav")));
                }
            }
        }
        files
    }

    fn indices(files: &[PathBuf]) -> BTreeSet<u32> {
        files
            .iter()
            .map(|f| Recording::from_path(f.clone()).unwrap().index)
            .collect()
    }

    #[test]
    fn train_test_ten_percent() {
        let files = grid();
        let p = partition(&files, Proportions::TrainTest { test: 0.1 }).unwrap();
        assert_eq!(indices(&p.test), (0..5).collect());
        assert_eq!(indices(&p.train), (5..50).collect());
        assert_eq!(p.counts(), SplitCounts { train: 180, validation: 0, test: 20 });
    }

    #[test]
    fn train_test_thresholds_truncate() {
        let files = grid();
        for (test, n_test) in [(0.0, 0), (0.01, 0), (0.05, 2), (0.5, 25), (0.9, 45), (0.95, 47), (0.99, 49)] {
            let p = partition(&files, Proportions::TrainTest { test }).unwrap();
            assert_eq!(indices(&p.test), (0..n_test).collect(), "test_size={test}");
            assert_eq!(indices(&p.train), (n_test..N_REC).collect(), "test_size={test}");
            assert_eq!(p.test.len() + p.train.len(), files.len());
        }
    }

    #[test]
    fn train_val_test_partitions_every_number_once() {
        let files = grid();
        let p = partition(&files, Proportions::TrainValTest { test: 0.33, val: 0.50 }).unwrap();
        assert_eq!(indices(&p.test), (0..16).collect());
        assert_eq!(indices(&p.validation), (16..41).collect());
        assert_eq!(indices(&p.train), (41..50).collect());

        let mut seen: Vec<&PathBuf> = p.train.iter().chain(&p.validation).chain(&p.test).collect();
        seen.sort();
        let mut expected: Vec<&PathBuf> = files.iter().collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn train_val_test_small_and_uneven() {
        let files = grid();
        let p = partition(&files, Proportions::TrainValTest { test: 0.01, val: 0.01 }).unwrap();
        assert!(p.test.is_empty() && p.validation.is_empty());
        assert_eq!(p.train.len(), files.len());

        let p = partition(&files, Proportions::TrainValTest { test: 0.025, val: 0.025 }).unwrap();
        assert_eq!(indices(&p.test), BTreeSet::from([0]));
        assert_eq!(indices(&p.validation), BTreeSet::from([1]));

        let p = partition(&files, Proportions::TrainValTest { test: 0.17, val: 0.33 }).unwrap();
        assert_eq!(indices(&p.test), (0..8).collect());
        assert_eq!(indices(&p.validation), (8..24).collect());
        assert_eq!(indices(&p.train), (24..50).collect());
    }

    #[test]
    fn rejects_invalid_proportions() {
        let files = grid();
        for bad in [
            Proportions::TrainTest { test: 1.0 },
            Proportions::TrainTest { test: -0.1 },
            Proportions::TrainTest { test: f64::NAN },
            Proportions::TrainValTest { test: 0.0, val: 0.1 },
            Proportions::TrainValTest { test: 0.1, val: 1.0 },
            Proportions::TrainValTest { test: 0.5, val: 0.5 },
            Proportions::TrainValTest { test: 0.3, val: f64::INFINITY },
        ] {
            let err = partition(&files, bad).unwrap_err();
            assert!(matches!(err, FsddError::InvalidProportion(_)), "{bad:?}");
        }
    }

    #[test]
    fn malformed_name_fails_whole_call() {
        let mut files = grid();
        files.push(PathBuf::from("rec/notes.wav"));
        let err = partition(&files, Proportions::TrainTest { test: 0.1 }).unwrap_err();
        assert!(matches!(err, FsddError::InvalidFileName { .. }));
    }

    #[test]
    fn split_lookup() {
        let files = grid();
        let p = partition(&files, Proportions::TrainValTest { test: 0.1, val: 0.1 }).unwrap();
        assert_eq!(p.split_of(Path::new("rec/3_theo_0.wav")), Some(Split::Test));
        assert_eq!(p.split_of(Path::new("rec/3_theo_7.wav")), Some(Split::Validation));
        assert_eq!(p.split_of(Path::new("rec/3_theo_10.wav")), Some(Split::Train));
        assert_eq!(p.split_of(Path::new("rec/9_theo_10.wav")), None);
    }
}
