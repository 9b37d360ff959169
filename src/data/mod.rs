/// Data layer: trace files in, reference tables in and out.
///
/// Architecture:
/// ```text
///  .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Chromatogram
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ Chromatogram  │  time, channels, sample information
///   └──────────────┘
///        │  channel + max_samples
///        ▼
///     Signal ──► analysis
///
///   MetricsTable ◄──► store ◄──► reference .json
/// ```

pub mod loader;
pub mod model;
pub mod store;
