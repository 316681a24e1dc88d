use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Writes a synthetic directory laid out like the FSDD `recordings` folder.
#[derive(Parser)]
struct Args {
    /// Output directory (created if missing).
    #[arg(long, default_value = "sample_recordings")]
    out: PathBuf,
    /// Speaker names; each gets its own timbre.
    #[arg(long, value_delimiter = ',', default_values = ["jackson", "theo"])]
    speakers: Vec<String>,
    /// Takes per digit and speaker.
    #[arg(long, default_value_t = fsdd::N_REC)]
    takes: u32,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const SAMPLE_RATE: u32 = 8000;

/// Bell-shaped amplitude envelope peaking at `centre`.
fn envelope(t: f64, centre: f64, width: f64, peak: f64) -> f64 {
    peak * (-(t - centre).powi(2) / (2.0 * width.powi(2))).exp()
}

/// One utterance: silence, a tone burst shaped by a Gaussian envelope, silence.
fn generate_utterance(digit: u8, timbre: f64, rng: &mut StdRng) -> Vec<f64> {
    let lead = rng.gen_range(0.08..0.18);
    let voiced = 0.25 + 0.02 * digit as f64 + rng.gen_range(0.0..0.05);
    let tail = rng.gen_range(0.08..0.18);
    let total = ((lead + voiced + tail) * SAMPLE_RATE as f64) as usize;

    let f0 = 220.0 + 45.0 * digit as f64 + noise(rng, 10.0);
    let centre = lead + voiced / 2.0;
    let width = voiced / 4.0;

    (0..total)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            let amp = envelope(t, centre, width, 0.6);
            let tone = (2.0 * std::f64::consts::PI * f0 * t).sin()
                + timbre * (2.0 * std::f64::consts::PI * 2.0 * f0 * t).sin();
            amp * tone / (1.0 + timbre) + noise(rng, 0.003)
        })
        .collect()
}

/// Normally distributed noise via Box-Muller.
fn noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn write_wav(path: &std::path::Path, samples: &[f64]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f64) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let mut written = 0usize;
    for (s, speaker) in args.speakers.iter().enumerate() {
        let timbre = 0.2 + 0.3 * s as f64;
        for digit in 0..10u8 {
            for take in 0..args.takes {
                let samples = generate_utterance(digit, timbre, &mut rng);
                let path = args.out.join(format!("{digit}_{speaker}_{take}.wav"));
                write_wav(&path, &samples)?;
                written += 1;
            }
        }
        log::info!("Generated recordings for {speaker}");
    }

    println!(
        "Wrote {written} recordings ({} speakers x 10 digits x {} takes) to {}",
        args.speakers.len(),
        args.takes,
        args.out.display()
    );
    Ok(())
}
