use super::compare::DifferenceTable;
use super::table::Metric;
use super::tolerance::{Classification, ToleranceSet};

/// One difference in a cross-sample summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryCell {
    pub difference: f64,
    pub classification: Classification,
}

/// A sample's differences for one metric.  Empty when the sample failed.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub sample: String,
    pub cells: Vec<SummaryCell>,
}

/// Differences of one metric across all samples of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub metric: Metric,
    pub tolerance: f64,
    pub rows: Vec<SummaryRow>,
}

impl MetricSummary {
    /// Widest row; rows may differ in length.
    pub fn peak_columns(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    pub fn out_of_tolerance(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| &r.cells)
            .filter(|c| c.classification.is_out())
            .count()
    }
}

/// Build Positions, FWHMs and Heights summaries, in that order.
///
/// `samples` pairs a display name with the sample's difference table, or
/// `None` for a sample that could not be analyzed.
pub fn summarize<'a>(
    samples: &[(&'a str, Option<&'a DifferenceTable>)],
    tolerances: &ToleranceSet,
) -> Vec<MetricSummary> {
    Metric::SUMMARY_ORDER
        .iter()
        .map(|&metric| {
            let tolerance = tolerances.for_metric(metric);
            let rows = samples
                .iter()
                .map(|&(name, differences)| SummaryRow {
                    sample: name.to_string(),
                    cells: differences
                        .map(|d| d.row(metric))
                        .unwrap_or_default()
                        .into_iter()
                        .map(|difference| SummaryCell {
                            difference,
                            classification: Classification::of(difference, tolerance),
                        })
                        .collect(),
                })
                .collect();
            MetricSummary {
                metric,
                tolerance,
                rows,
            }
        })
        .collect()
}
