/// Data layer: locating, splitting, and loading FSDD recordings.
///
/// Architecture:
/// ```text
///   local dir  /  git reference
///        │
///        ▼
///   ┌──────────┐
///   │  source  │  resolve directory → sorted *.wav list
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  split   │  recording number vs. cut points → train / val / test
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ FsddDataset │  index → loader (WAV) → flatten → transform
///   └─────────────┘
/// ```

pub mod dataset;
pub mod generator;
pub mod loader;
pub mod model;
pub mod source;
pub mod split;
