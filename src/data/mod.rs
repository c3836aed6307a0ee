/// Data layer: core types, file parsing, splitting and normalization.
///
/// Architecture:
/// ```text
///  <PatientID>_<Task>.txt        metadata.csv / .json / .parquet
///        │                              │
///        ▼                              ▼
///   ┌──────────┐                  ┌──────────┐
///   │  loader   │  parse file →   │  loader   │  rows → LabelTable
///   └──────────┘   Recording      └──────────┘
///        │                              │
///        └──────────────┬───────────────┘
///                       ▼
///               ┌──────────────┐
///               │  TaskDataset  │  Vec<Record>, patient / label sets
///               └──────────────┘
///                       │
///                       ▼
///   ┌──────────┐   ┌───────────┐
///   │  split    │ → │ normalize  │  leave-one-out folds, pooled z-score
///   └──────────┘   └───────────┘
/// ```

pub mod loader;
pub mod model;
pub mod normalize;
pub mod split;
