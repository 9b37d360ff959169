use serde::{Deserialize, Serialize};

use super::round2;
use super::table::{Metric, MetricsTable, PeakMetrics};

// ---------------------------------------------------------------------------
// Comparison results
// ---------------------------------------------------------------------------

/// `reference - sample` per peak and metric, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DifferenceTable {
    columns: Vec<PeakMetrics>,
}

impl DifferenceTable {
    pub fn columns(&self) -> &[PeakMetrics] {
        &self.columns
    }

    pub fn row(&self, metric: Metric) -> Vec<f64> {
        self.columns.iter().map(|c| *c.get(metric)).collect()
    }

    pub fn peak_count(&self) -> usize {
        self.columns.len()
    }
}

/// A sample value next to its difference from the reference.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MergedCell {
    pub sample: f64,
    pub difference: f64,
}

/// The sample table with each compared cell carrying its difference.
pub type MergedTable = Vec<PeakMetrics<MergedCell>>;

/// Result of comparing one sample table with the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub differences: DifferenceTable,
    pub merged: MergedTable,
    /// Peak columns in the sample table.
    pub sample_peaks: usize,
    /// Peak columns in the reference table.
    pub reference_peaks: usize,
}

impl Comparison {
    /// Whether peaks were dropped because the tables differ in length.
    pub fn peak_count_mismatch(&self) -> bool {
        self.sample_peaks != self.reference_peaks
    }
}

// ---------------------------------------------------------------------------
// Differencer
// ---------------------------------------------------------------------------

/// Compare `sample` against `reference` column by column.
///
/// Column `i` of the sample is compared with column `i` of the reference;
/// peaks are not matched by position.  Extra columns on either side are
/// dropped, so a spurious or missing peak shifts every following column.
pub fn compare(sample: &MetricsTable, reference: &MetricsTable) -> Comparison {
    let sample_peaks = sample.peak_count();
    let reference_peaks = reference.peak_count();
    if sample_peaks != reference_peaks {
        log::warn!(
            "sample has {sample_peaks} peaks but reference has {reference_peaks}; \
             comparing the first {} positionally",
            sample_peaks.min(reference_peaks)
        );
    }

    let pairs = sample.columns().iter().zip(reference.columns());

    let differences = DifferenceTable {
        columns: pairs
            .clone()
            .map(|(s, r)| r.zip_with(s, |r, s| round2(r - s)))
            .collect(),
    };

    let merged = pairs
        .zip(differences.columns())
        .map(|((s, _), d)| {
            s.zip_with(d, |&sample, &difference| MergedCell { sample, difference })
        })
        .collect();

    Comparison {
        differences,
        merged,
        sample_peaks,
        reference_peaks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[(f64, f64, f64)]) -> MetricsTable {
        MetricsTable::from_columns(
            columns
                .iter()
                .map(|&(position, height, width)| PeakMetrics {
                    position,
                    height,
                    width,
                })
                .collect(),
        )
    }

    #[test]
    fn test_self_comparison_is_zero() {
        let reference = table(&[(1.0, 5.0, 0.5), (12.3, 0.87, 1.9)]);
        let comparison = compare(&reference, &reference);
        assert!(!comparison.peak_count_mismatch());
        for column in comparison.differences.columns() {
            assert_eq!(*column, PeakMetrics::default());
        }
    }

    #[test]
    fn test_reference_minus_sample() {
        let reference = table(&[(10.0, 5.0, 0.5)]);
        let sample = table(&[(11.5, 4.2, 0.7)]);
        let comparison = compare(&sample, &reference);
        let diff = comparison.differences.columns()[0];
        assert_eq!(diff.position, -1.5);
        assert_eq!(diff.height, 0.8);
        assert_eq!(diff.width, -0.2);

        let merged = comparison.merged[0];
        assert_eq!(merged.position.sample, 11.5);
        assert_eq!(merged.position.difference, -1.5);
        assert_eq!(merged.height.sample, 4.2);
    }

    #[test]
    fn test_truncates_to_shorter_table() {
        let sample = table(&[
            (1.0, 1.0, 0.1),
            (2.0, 1.0, 0.1),
            (3.0, 1.0, 0.1),
            (4.0, 1.0, 0.1),
            (5.0, 1.0, 0.1),
        ]);
        let reference = table(&[(1.0, 1.0, 0.1), (2.0, 1.0, 0.1), (3.0, 1.0, 0.1)]);

        let comparison = compare(&sample, &reference);
        assert_eq!(comparison.differences.peak_count(), 3);
        assert_eq!(comparison.merged.len(), 3);
        assert!(comparison.peak_count_mismatch());

        let comparison = compare(&reference, &sample);
        assert_eq!(comparison.differences.peak_count(), 3);
    }

    #[test]
    fn test_positional_alignment() {
        // A missing first peak misaligns every following column.
        let reference = table(&[(5.0, 1.0, 0.5), (20.0, 3.0, 0.5)]);
        let sample = table(&[(20.0, 3.0, 0.5)]);
        let comparison = compare(&sample, &reference);
        assert_eq!(comparison.differences.row(Metric::Position), vec![-15.0]);
    }

    #[test]
    fn test_empty_tables() {
        let comparison = compare(&MetricsTable::default(), &table(&[(1.0, 1.0, 1.0)]));
        assert_eq!(comparison.differences.peak_count(), 0);
        assert!(comparison.merged.is_empty());
    }
}
