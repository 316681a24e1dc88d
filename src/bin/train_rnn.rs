//! Example: spoken digit classification with a small recurrent network.
//!
//! Trains an Elman RNN on per-frame features of the train split and reports
//! accuracy on the test split. Run against real FSDD recordings or the output
//! of `generate_sample`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use fsdd::{DataLoader, Dataset, DatasetSource, FsddGenerator, LoadingMode, TrimSilence};

#[derive(Parser)]
struct Args {
    /// Directory of `{digit}_{speaker}_{index}.wav` recordings.
    #[arg(long)]
    path: PathBuf,
    #[arg(long, default_value_t = 0.1)]
    test_size: f64,
    #[arg(long, default_value_t = 0.05)]
    trim: f32,
    #[arg(long, default_value_t = 10)]
    epochs: usize,
    #[arg(long, default_value_t = 16)]
    batch_size: usize,
    #[arg(long, default_value_t = 32)]
    hidden: usize,
    #[arg(long, default_value_t = 0.05)]
    lr: f32,
    /// Samples per analysis frame.
    #[arg(long, default_value_t = 256)]
    frame: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Where to write the trained weights as JSON.
    #[arg(long, default_value = "rnn.json")]
    out: PathBuf,
}

const NUM_CLASSES: usize = 10;
const NUM_FEATURES: usize = 3;
const MAX_FRAMES: usize = 64;
const GRAD_CLIP: f32 = 5.0;

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// Per-frame log energy, zero-crossing rate and mean absolute slope.
fn frame_features(samples: &[f32], frame: usize) -> Vec<[f32; NUM_FEATURES]> {
    let frames: Vec<&[f32]> = samples.chunks(frame.max(1)).filter(|c| c.len() > 1).collect();
    let stride = frames.len().div_ceil(MAX_FRAMES).max(1);
    frames
        .iter()
        .step_by(stride)
        .map(|c| {
            let n = c.len() as f32;
            let energy = c.iter().map(|s| s * s).sum::<f32>() / n;
            let crossings = c.windows(2).filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0)).count();
            let slope = c.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f32>() / (n - 1.0);
            [
                (energy + 1e-8).ln() / 10.0,
                crossings as f32 / (n - 1.0),
                slope * 4.0,
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// `h_t = tanh(W_x x_t + W_h h_{t-1} + b)`, logits from the last hidden state.
#[derive(Debug, Clone, Serialize)]
struct Rnn {
    hidden: usize,
    w_x: Vec<f32>,
    w_h: Vec<f32>,
    b: Vec<f32>,
    w_o: Vec<f32>,
    b_o: Vec<f32>,
}

impl Rnn {
    fn new(hidden: usize, rng: &mut StdRng) -> Self {
        let mut init = |n: usize, fan_in: usize| -> Vec<f32> {
            let scale = (1.0 / fan_in as f32).sqrt();
            (0..n).map(|_| rng.gen_range(-scale..scale)).collect()
        };
        Self {
            w_x: init(hidden * NUM_FEATURES, NUM_FEATURES),
            w_h: init(hidden * hidden, hidden),
            b: vec![0.0; hidden],
            w_o: init(NUM_CLASSES * hidden, hidden),
            b_o: vec![0.0; NUM_CLASSES],
            hidden,
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            hidden: self.hidden,
            w_x: vec![0.0; self.w_x.len()],
            w_h: vec![0.0; self.w_h.len()],
            b: vec![0.0; self.b.len()],
            w_o: vec![0.0; self.w_o.len()],
            b_o: vec![0.0; self.b_o.len()],
        }
    }

    /// Hidden states `h_0..=h_T` (with `h_0 = 0`).
    fn hidden_states(&self, xs: &[[f32; NUM_FEATURES]]) -> Vec<Vec<f32>> {
        let h = self.hidden;
        let mut states = vec![vec![0.0; h]];
        for x in xs {
            let prev = &states[states.len() - 1];
            let next: Vec<f32> = (0..h)
                .map(|i| {
                    let mut a = self.b[i];
                    for (j, xj) in x.iter().enumerate() {
                        a += self.w_x[i * NUM_FEATURES + j] * xj;
                    }
                    for (j, hj) in prev.iter().enumerate() {
                        a += self.w_h[i * h + j] * hj;
                    }
                    a.tanh()
                })
                .collect();
            states.push(next);
        }
        states
    }

    fn logits(&self, last: &[f32]) -> [f32; NUM_CLASSES] {
        let mut out = [0.0; NUM_CLASSES];
        for (k, o) in out.iter_mut().enumerate() {
            *o = self.b_o[k]
                + last
                    .iter()
                    .enumerate()
                    .map(|(j, hj)| self.w_o[k * self.hidden + j] * hj)
                    .sum::<f32>();
        }
        out
    }

    fn predict(&self, xs: &[[f32; NUM_FEATURES]]) -> usize {
        let states = self.hidden_states(xs);
        argmax(&self.logits(&states[states.len() - 1]))
    }

    /// Accumulate gradients of the cross-entropy loss into `grad`; returns the loss.
    fn backprop(&self, xs: &[[f32; NUM_FEATURES]], label: usize, grad: &mut Rnn) -> f32 {
        let h = self.hidden;
        let states = self.hidden_states(xs);
        let last = &states[states.len() - 1];
        let probs = softmax(&self.logits(last));
        let loss = -(probs[label].max(1e-12)).ln();

        let mut d_logits = probs;
        d_logits[label] -= 1.0;

        let mut dh = vec![0.0; h];
        for (k, dl) in d_logits.iter().enumerate() {
            grad.b_o[k] += dl;
            for j in 0..h {
                grad.w_o[k * h + j] += dl * last[j];
                dh[j] += self.w_o[k * h + j] * dl;
            }
        }

        for t in (0..xs.len()).rev() {
            let h_next = &states[t + 1];
            let h_prev = &states[t];
            let da: Vec<f32> = (0..h).map(|i| dh[i] * (1.0 - h_next[i] * h_next[i])).collect();
            let mut dh_prev = vec![0.0; h];
            for i in 0..h {
                grad.b[i] += da[i];
                for j in 0..NUM_FEATURES {
                    grad.w_x[i * NUM_FEATURES + j] += da[i] * xs[t][j];
                }
                for j in 0..h {
                    grad.w_h[i * h + j] += da[i] * h_prev[j];
                    dh_prev[j] += self.w_h[i * h + j] * da[i];
                }
            }
            dh = dh_prev;
        }
        loss
    }

    fn sgd_step(&mut self, grad: &Rnn, lr: f32, batch: usize) {
        let scale = lr / batch.max(1) as f32;
        let pairs = [
            (&mut self.w_x, &grad.w_x),
            (&mut self.w_h, &grad.w_h),
            (&mut self.b, &grad.b),
            (&mut self.w_o, &grad.w_o),
            (&mut self.b_o, &grad.b_o),
        ];
        for (param, g) in pairs {
            for (p, g) in param.iter_mut().zip(g) {
                *p -= scale * g.clamp(-GRAD_CLIP, GRAD_CLIP);
            }
        }
    }
}

fn softmax(logits: &[f32; NUM_CLASSES]) -> [f32; NUM_CLASSES] {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut out = logits.map(|l| (l - max).exp());
    let sum: f32 = out.iter().sum();
    out.iter_mut().for_each(|p| *p /= sum);
    out
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

fn accuracy(model: &Rnn, dataset: &impl Dataset<Item = (Vec<f32>, u8)>, frame: usize) -> Result<f32> {
    if dataset.is_empty() {
        return Ok(0.0);
    }
    let mut correct = 0usize;
    for item in dataset.iter() {
        let (samples, label) = item?;
        if model.predict(&frame_features(&samples, frame)) == label as usize {
            correct += 1;
        }
    }
    Ok(correct as f32 / dataset.len() as f32)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let fsdd = FsddGenerator::new(&DatasetSource::local(&args.path))
        .context("opening recordings")?
        .transform(TrimSilence::new(args.trim)?)
        .loading_mode(LoadingMode::Eager);
    let (train, test) = fsdd.train_test_split(args.test_size)?;
    if train.is_empty() {
        bail!("no training recordings in {}", args.path.display());
    }
    log::info!("train={} test={}", train.len(), test.len());

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut model = Rnn::new(args.hidden, &mut rng);

    for epoch in 0..args.epochs {
        let mut total_loss = 0.0f32;
        let loader = DataLoader::new(&train, args.batch_size)?.shuffled(args.seed + epoch as u64);
        for batch in loader {
            let batch = batch?;
            let mut grad = model.zeros_like();
            for (samples, label) in &batch {
                let xs = frame_features(samples, args.frame);
                total_loss += model.backprop(&xs, *label as usize, &mut grad);
            }
            model.sgd_step(&grad, args.lr, batch.len());
        }
        let loss = total_loss / train.len() as f32;
        let acc = accuracy(&model, &test, args.frame)?;
        println!("epoch {epoch:>3}  loss {loss:.4}  test acc {acc:.3}");
    }

    let json = serde_json::to_string(&model)?;
    std::fs::write(&args.out, json).with_context(|| format!("writing {}", args.out.display()))?;
    println!("Saved weights to {}", args.out.display());
    Ok(())
}
