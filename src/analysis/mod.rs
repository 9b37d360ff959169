/// Analysis core: peak detection, peak metrics and reference comparison.
///
/// Architecture:
/// ```text
///      Signal
///        │
///        ▼
///   ┌──────────┐
///   │  peaks    │  local maxima ≥ min_height
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  widths   │  prominence, width at relative height, interpolated bounds
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  table    │  Position / Height / Width per peak, physical units
///   └──────────┘
///        │   (reference table present)
///        ▼
///   ┌──────────┐
///   │  compare  │  reference − sample, positional columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ tolerance │  |difference| ≥ threshold → out of tolerance
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  summary  │  per metric, one row per sample
///   └──────────┘
/// ```
///
/// Every stage is a pure function of its inputs and returns new values.

pub mod compare;
pub mod peaks;
pub mod summary;
pub mod table;
pub mod tolerance;
pub mod widths;

pub use compare::{Comparison, DifferenceTable, MergedCell, MergedTable, compare};
pub use peaks::{Peak, PeakCandidate, detect_peaks};
pub use summary::{MetricSummary, SummaryCell, SummaryRow, summarize};
pub use table::{Metric, MetricsTable, PeakMetrics, TableRow, TableScale};
pub use tolerance::{Classification, ClassificationGrid, ToleranceSet, classify};
pub use widths::{PeakWidth, peak_widths};

/// Round to two decimals, ties to even.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}
