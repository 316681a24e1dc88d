use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use fsdd::{
    DataLoader, Dataset, DatasetSource, FsddError, FsddGenerator, LoadingMode, Recording,
    TrimSilence, Version, N_REC,
};
use tempfile::TempDir;

const DIGITS: [u8; 2] = [2, 7];
const SPEAKERS: [&str; 3] = ["george", "lucas", "yweweler"];

/// Quiet padding around a loud burst, so trimming has something to remove.
fn utterance(take: u32) -> Vec<i16> {
    let mut samples = vec![30i16; 4];
    samples.extend([12_000, -16_000, 8_000 + take as i16]);
    samples.extend(vec![-25i16; 3]);
    samples
}

fn write_wav(path: &Path, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for digit in DIGITS {
        for speaker in SPEAKERS {
            for take in 0..N_REC {
                let path = dir.path().join(format!("{digit}_{speaker}_{take}.wav"));
                write_wav(&path, &utterance(take));
            }
        }
    }
    std::fs::write(dir.path().join("README.txt"), "not a recording").unwrap();
    dir
}

fn groups() -> usize {
    DIGITS.len() * SPEAKERS.len()
}

fn indices(files: &[PathBuf]) -> BTreeSet<u32> {
    files
        .iter()
        .map(|f| Recording::from_path(f.clone()).unwrap().index)
        .collect()
}

#[test]
fn local_generator_lists_every_recording() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path())).unwrap();
    assert_eq!(fsdd.path(), dir.path());
    assert_eq!(fsdd.all_files().len(), groups() * N_REC as usize);

    let full = fsdd.full().unwrap();
    assert_eq!(full.len(), fsdd.all_files().len());
    assert_eq!(full.files(), fsdd.all_files());
}

#[test]
fn local_without_path_fails() {
    let source = DatasetSource {
        version: Version::Local,
        path: None,
        ..Default::default()
    };
    assert!(matches!(FsddGenerator::new(&source), Err(FsddError::MissingLocalPath)));
}

#[test]
fn train_test_split_ninety_ten() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path())).unwrap();
    let (train, test) = fsdd.train_test_split(0.1).unwrap();

    assert_eq!(indices(train.files()), (5..50).collect());
    assert_eq!(indices(test.files()), (0..5).collect());
    assert_eq!(train.len(), groups() * 45);
    assert_eq!(test.len(), groups() * 5);
}

#[test]
fn train_test_split_tiny_test_is_empty() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path())).unwrap();
    let (train, test) = fsdd.train_test_split(0.01).unwrap();
    assert_eq!(train.len(), groups() * 50);
    assert!(test.is_empty());
}

#[test]
fn train_val_test_split_covers_all_once() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path())).unwrap();
    let (train, val, test) = fsdd.train_val_test_split(0.33, 0.50).unwrap();

    assert_eq!(indices(test.files()), (0..16).collect());
    assert_eq!(indices(val.files()), (16..41).collect());
    assert_eq!(indices(train.files()), (41..50).collect());
    assert_eq!(test.len(), groups() * 16);
    assert_eq!(val.len(), groups() * 25);
    assert_eq!(train.len(), groups() * 9);

    let mut all: Vec<&PathBuf> = train
        .files()
        .iter()
        .chain(val.files())
        .chain(test.files())
        .collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), fsdd.all_files().len());
}

#[test]
fn invalid_proportions_are_rejected() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path())).unwrap();
    assert!(matches!(fsdd.train_test_split(1.0), Err(FsddError::InvalidProportion(_))));
    assert!(matches!(
        fsdd.train_val_test_split(0.6, 0.4),
        Err(FsddError::InvalidProportion(_))
    ));
    assert!(matches!(
        fsdd.train_val_test_split(0.0, 0.2),
        Err(FsddError::InvalidProportion(_))
    ));
}

#[test]
fn items_are_normalized_with_digit_labels() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path())).unwrap();
    let full = fsdd.full().unwrap();

    for (i, file) in full.files().iter().enumerate().step_by(37) {
        let (samples, label) = full.get(i).unwrap();
        assert_eq!(samples.len(), utterance(0).len());
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(label, Recording::from_path(file.clone()).unwrap().digit);
    }
    assert!(matches!(
        full.get(full.len()),
        Err(FsddError::IndexOutOfBounds { .. })
    ));
}

#[test]
fn transform_is_shared_by_every_split() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path()))
        .unwrap()
        .transform(TrimSilence::new(0.1).unwrap());
    let (train, test) = fsdd.train_test_split(0.2).unwrap();

    for ds in [&train, &test] {
        let (samples, _) = ds.get(0).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| s.abs() > 0.1));
    }
}

#[test]
fn eager_mode_materializes_recordings_and_labels() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path()))
        .unwrap()
        .loading_mode(LoadingMode::Eager);
    let (_, test) = fsdd.train_test_split(0.1).unwrap();

    assert_eq!(test.mode(), LoadingMode::Eager);
    let recordings = test.recordings().unwrap();
    let labels = test.labels().unwrap();
    assert_eq!(recordings.len(), test.len());
    assert_eq!(labels.len(), test.len());
    assert!(labels.iter().all(|l| DIGITS.contains(l)));

    let (samples, label) = test.get(3).unwrap();
    assert_eq!(samples, recordings[3].samples);
    assert_eq!(label, labels[3]);
}

#[test]
fn lazy_mode_exposes_nothing_materialized() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path())).unwrap();
    let full = fsdd.full().unwrap();
    assert!(full.recordings().is_none());
    assert!(full.labels().is_none());
}

#[test]
fn malformed_recording_name_fails_split() {
    let dir = fixture();
    write_wav(&dir.path().join("7_broken.wav"), &[0, 1, 2]);
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path())).unwrap();
    assert!(matches!(
        fsdd.train_test_split(0.1),
        Err(FsddError::InvalidFileName { .. })
    ));

    let full = fsdd.full().unwrap();
    assert_eq!(full.len(), groups() * 50 + 1);
    let broken = full
        .files()
        .iter()
        .position(|f| f.ends_with("7_broken.wav"))
        .unwrap();
    assert_eq!(full.get(broken).unwrap(), (vec![0.0, 1.0 / 32768.0, 2.0 / 32768.0], 7));
    assert_eq!(full.waveform(broken).unwrap().0.sample_rate, 8000);
}

#[test]
fn data_loader_batches_a_split() {
    let dir = fixture();
    let fsdd = FsddGenerator::new(&DatasetSource::local(dir.path())).unwrap();
    let (_, test) = fsdd.train_test_split(0.1).unwrap();

    let loader = DataLoader::new(&test, 8).unwrap().shuffled(3);
    assert_eq!(loader.num_batches(), test.len().div_ceil(8));

    let mut labels = Vec::new();
    for batch in loader {
        let batch = batch.unwrap();
        assert!(batch.len() <= 8);
        labels.extend(batch.into_iter().map(|(_, label)| label));
    }
    assert_eq!(labels.len(), test.len());
    labels.sort_unstable();
    let mut expected: Vec<u8> = test.iter().map(|item| item.unwrap().1).collect();
    expected.sort_unstable();
    assert_eq!(labels, expected);
}

/// Stands in for `git clone` by laying out a repository with a few recordings.
struct LocalMirror;

impl fsdd::RepositoryFetcher for LocalMirror {
    fn fetch(&self, _url: &str, _reference: &str, parent: &Path) -> fsdd::Result<()> {
        let recordings = parent.join("free-spoken-digit-dataset").join("recordings");
        std::fs::create_dir_all(&recordings)?;
        for take in 0..N_REC {
            write_wav(&recordings.join(format!("4_nicolas_{take}.wav")), &utterance(take));
        }
        Ok(())
    }
}

#[test]
fn reference_version_relocates_recordings() {
    let dir = tempfile::tempdir().unwrap();
    let source = DatasetSource::reference("v1.0.10", Some(dir.path().to_path_buf()));
    let fsdd = FsddGenerator::with_fetcher(&source, &LocalMirror).unwrap();

    assert_eq!(fsdd.path(), dir.path().join("recordings"));
    assert_eq!(fsdd.all_files().len(), N_REC as usize);
    assert!(!dir.path().join("free-spoken-digit-dataset").exists());

    let (train, test) = fsdd.train_test_split(0.5).unwrap();
    assert_eq!((train.len(), test.len()), (25, 25));
    assert_eq!(test.get(0).unwrap().1, 4);
}
