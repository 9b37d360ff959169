use serde::{Deserialize, Serialize};

use super::compare::DifferenceTable;
use super::round2;
use super::table::{Metric, MetricsTable, PeakMetrics};

/// Position tolerance in seconds when none is configured.
pub const DEFAULT_POSITION_TOLERANCE: f64 = 3.0;

/// Auto-derived Height/FWHM tolerances are the largest reference value over this.
const AUTO_TOLERANCE_DIVISOR: f64 = 10.0;

// ---------------------------------------------------------------------------
// ToleranceSet
// ---------------------------------------------------------------------------

/// Maximum absolute deviation allowed per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceSet {
    pub position: f64,
    pub fwhm: f64,
    pub height: f64,
}

/// Explicitly configured tolerances; absent entries are derived.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToleranceOverrides {
    pub position: Option<f64>,
    pub fwhm: Option<f64>,
    pub height: Option<f64>,
}

impl ToleranceSet {
    /// Fill unset tolerances from the reference table.
    ///
    /// Position defaults to 3 s.  Height and FWHM default to a tenth of the
    /// largest reference value of that row, rounded to two decimals.
    pub fn from_reference(reference: &MetricsTable, overrides: &ToleranceOverrides) -> Self {
        let auto = |metric: Metric| {
            round2(reference.row_max(metric).unwrap_or(0.0) / AUTO_TOLERANCE_DIVISOR)
        };
        let tolerances = ToleranceSet {
            position: overrides.position.unwrap_or(DEFAULT_POSITION_TOLERANCE),
            fwhm: overrides.fwhm.unwrap_or_else(|| auto(Metric::Width)),
            height: overrides.height.unwrap_or_else(|| auto(Metric::Height)),
        };
        log::debug!("tolerances: {tolerances:?}");
        tolerances
    }

    pub fn for_metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Position => self.position,
            Metric::Height => self.height,
            Metric::Width => self.fwhm,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Whether a difference lies within its tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    WithinTolerance,
    OutOfTolerance,
}

impl Classification {
    /// `|difference| >= threshold` is out of tolerance.
    pub fn of(difference: f64, threshold: f64) -> Self {
        if difference.abs() >= threshold {
            Classification::OutOfTolerance
        } else {
            Classification::WithinTolerance
        }
    }

    pub fn is_out(self) -> bool {
        self == Classification::OutOfTolerance
    }
}

/// Per-cell classification, one column per compared peak.
pub type ClassificationGrid = Vec<PeakMetrics<Classification>>;

/// Classify every cell of a difference table against its row's tolerance.
pub fn classify(differences: &DifferenceTable, tolerances: &ToleranceSet) -> ClassificationGrid {
    differences
        .columns()
        .iter()
        .map(|column| {
            column.map(|metric, &diff| Classification::of(diff, tolerances.for_metric(metric)))
        })
        .collect()
}

/// Number of out-of-tolerance cells in a grid.
pub fn count_out_of_tolerance(grid: &ClassificationGrid) -> usize {
    grid.iter()
        .flat_map(|c| Metric::ALL.map(|m| *c.get(m)))
        .filter(|c| c.is_out())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compare::compare;

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
    fn test_boundary_is_out_of_tolerance() {
        assert_eq!(Classification::of(3.0, 3.0), Classification::OutOfTolerance);
        assert_eq!(Classification::of(-3.0, 3.0), Classification::OutOfTolerance);
        assert_eq!(Classification::of(2.99, 3.0), Classification::WithinTolerance);
    }

    #[test]
    fn test_defaults_from_reference() {
        let reference = table(&[(1.0, 5.0, 0.5), (7.0, 12.34, 2.2)]);
        let tol = ToleranceSet::from_reference(&reference, &ToleranceOverrides::default());
        assert_eq!(tol.position, 3.0);
        assert_eq!(tol.height, 1.23);
        assert_eq!(tol.fwhm, 0.22);
    }

    #[test]
    fn test_overrides_win() {
        let reference = table(&[(1.0, 5.0, 0.5)]);
        let overrides = ToleranceOverrides {
            position: Some(1.0),
            fwhm: None,
            height: Some(0.1),
        };
        let tol = ToleranceSet::from_reference(&reference, &overrides);
        assert_eq!(tol.position, 1.0);
        assert_eq!(tol.height, 0.1);
        assert_eq!(tol.fwhm, 0.05);
    }

    #[test]
    fn test_identical_sample_is_within_tolerance() {
        let reference = table(&[(1.0, 5.0, 0.5)]);
        let comparison = compare(&reference, &reference);
        for threshold in [0.01, 1.0, 100.0] {
            let tol = ToleranceSet {
                position: threshold,
                fwhm: threshold,
                height: threshold,
            };
            let grid = classify(&comparison.differences, &tol);
            assert_eq!(count_out_of_tolerance(&grid), 0);
        }
    }

    #[test]
    fn test_classify_uses_row_thresholds() {
        let reference = table(&[(10.0, 5.0, 0.5)]);
        let sample = table(&[(12.0, 4.0, 0.5)]);
        let comparison = compare(&sample, &reference);
        let tol = ToleranceSet {
            position: 3.0,
            fwhm: 0.05,
            height: 0.5,
        };
        let grid = classify(&comparison.differences, &tol);
        assert_eq!(grid[0].position, Classification::WithinTolerance);
        assert_eq!(grid[0].height, Classification::OutOfTolerance);
        assert_eq!(grid[0].width, Classification::WithinTolerance);
        assert_eq!(count_out_of_tolerance(&grid), 1);
    }
}
