use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use fsdd::{
    partition, Dataset, DatasetSource, FsddConfig, FsddGenerator, Partition, Recording,
    SplitCounts, TrimSilence, Version,
};

#[derive(Parser)]
#[command(name = "fsdd", version, about = "Free Spoken Digit Dataset utility")]
struct Cli {
    /// TOML configuration supplying defaults for every command.
    #[arg(long, global = true, env = "FSDD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the recordings of a branch or tag.
    Fetch {
        /// Branch name or tag, e.g. `master` or `v1.0.10`.
        #[arg(long = "ref", value_name = "REF")]
        reference: Option<String>,
        /// Directory to clone into (defaults to the working directory).
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Partition a directory of recordings and report the split sizes.
    Split {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        test_size: Option<f64>,
        #[arg(long)]
        val_size: Option<f64>,
        /// Write a CSV manifest of every file and its split.
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Print the counts as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Load one recording and describe it.
    Inspect {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Trim silence with this threshold before reporting.
        #[arg(long)]
        trim: Option<f32>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FsddConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FsddConfig::default(),
    };

    match cli.command {
        Command::Fetch { reference, path } => fetch(&config, reference, path),
        Command::Split {
            path,
            test_size,
            val_size,
            manifest,
            json,
        } => split(&config, path, test_size, val_size, manifest.as_deref(), json),
        Command::Inspect { path, index, trim } => inspect(&config, path, index, trim),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn fetch(config: &FsddConfig, reference: Option<String>, path: Option<PathBuf>) -> Result<()> {
    let mut source = config.dataset_source();
    if let Some(r) = reference {
        source.version = Version::from(r.as_str());
    }
    if path.is_some() {
        source.path = path;
    }
    if source.version == Version::Local {
        bail!("fetch needs a branch or tag, not 'local'");
    }

    let dir = source.resolve().context("retrieving recordings")?;
    let files = fsdd::data::source::list_wav_files(&dir)?;
    println!("{} recordings in {}", files.len(), dir.display());
    Ok(())
}

/// Recordings directory: explicit flag, else the configured local path.
fn local_dir(config: &FsddConfig, path: Option<PathBuf>) -> Result<PathBuf> {
    let source = match path {
        Some(p) => DatasetSource::local(p),
        None => DatasetSource {
            version: Version::Local,
            ..config.dataset_source()
        },
    };
    source.resolve().context("locating recordings")
}

#[derive(Serialize)]
struct SplitSummary<'a> {
    path: &'a Path,
    total: usize,
    counts: SplitCounts,
}

#[derive(Serialize)]
struct ManifestRow<'a> {
    split: &'static str,
    digit: u8,
    speaker: &'a str,
    recording: u32,
    path: String,
}

fn split(
    config: &FsddConfig,
    path: Option<PathBuf>,
    test_size: Option<f64>,
    val_size: Option<f64>,
    manifest: Option<&Path>,
    json: bool,
) -> Result<()> {
    let dir = local_dir(config, path)?;
    let files = fsdd::data::source::list_wav_files(&dir)?;

    let mut split_cfg = config.split;
    if let Some(t) = test_size {
        split_cfg.test_size = t;
    }
    if val_size.is_some() {
        split_cfg.val_size = val_size;
    }
    let parts = partition(&files, split_cfg.proportions())?;

    if let Some(out) = manifest {
        write_manifest(out, &parts)
            .with_context(|| format!("writing manifest {}", out.display()))?;
        log::info!("Wrote manifest to {}", out.display());
    }

    let summary = SplitSummary {
        path: &dir,
        total: files.len(),
        counts: parts.counts(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{} recordings in {}", summary.total, dir.display());
        for (split, files) in parts.by_split() {
            println!("  {:<10} {}", split.as_str(), files.len());
        }
    }
    Ok(())
}

fn write_manifest(out: &Path, parts: &Partition) -> Result<()> {
    let mut writer = csv::Writer::from_path(out)?;
    for (split, files) in parts.by_split() {
        for file in files {
            let rec = Recording::from_path(file.clone())?;
            writer.serialize(ManifestRow {
                split: split.as_str(),
                digit: rec.digit,
                speaker: &rec.speaker,
                recording: rec.index,
                path: file.display().to_string(),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn inspect(config: &FsddConfig, path: Option<PathBuf>, index: usize, trim: Option<f32>) -> Result<()> {
    let dir = local_dir(config, path)?;
    let trim = match trim {
        Some(t) => Some(TrimSilence::new(t)?),
        None => config.trim()?,
    };

    let mut fsdd =
        FsddGenerator::new(&DatasetSource::local(dir))?.load_options(config.loading.options);
    if let Some(t) = trim {
        fsdd = fsdd.transform(t);
    }
    let full = fsdd.full()?;
    let (samples, label) = full.get(index).context("loading recording")?;
    let (waveform, _) = full.waveform(index)?;

    println!("file        {}", full.files()[index].display());
    println!("label       {label}");
    println!("samples     {}", samples.len());
    println!("sample rate {} Hz", waveform.sample_rate);
    if let Some((min, max)) = range(&samples) {
        println!("range       [{min:.4}, {max:.4}]");
    }
    for ch in 0..waveform.channels {
        if let Some((min, max)) = waveform.channel(ch).and_then(range) {
            println!("channel {ch:<3} [{min:.4}, {max:.4}] untrimmed");
        }
    }
    Ok(())
}

fn range(samples: &[f32]) -> Option<(f32, f32)> {
    if samples.is_empty() {
        return None;
    }
    Some(
        samples
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s))),
    )
}
