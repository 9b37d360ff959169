use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

use super::peaks::Peak;
use super::round2;

// ---------------------------------------------------------------------------
// Metric – the three fixed table rows
// ---------------------------------------------------------------------------

/// One row of a metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Position,
    Height,
    Width,
}

impl Metric {
    /// Table row order.
    pub const ALL: [Metric; 3] = [Metric::Position, Metric::Height, Metric::Width];

    /// Order of the per-metric cross-sample summaries.
    pub const SUMMARY_ORDER: [Metric; 3] = [Metric::Position, Metric::Width, Metric::Height];

    /// Row key used in serialized tables.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Position => "Position",
            Metric::Height => "Height",
            Metric::Width => "Width",
        }
    }

    /// Row label with unit, as shown in the "Parameter" column.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Position => "Position (s)",
            Metric::Height => "Height",
            Metric::Width => "FWHM (s)",
        }
    }

    /// Heading of the cross-sample summary for this metric.
    pub fn plural(self) -> &'static str {
        match self {
            Metric::Position => "Positions",
            Metric::Height => "Heights",
            Metric::Width => "FWHMs",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// PeakMetrics – one table column
// ---------------------------------------------------------------------------

/// The three metric cells of one peak column.
///
/// Generic so the same column shape carries values, differences, merged
/// cells and classifications.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeakMetrics<T = f64> {
    pub position: T,
    pub height: T,
    pub width: T,
}

impl<T> PeakMetrics<T> {
    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Position => &self.position,
            Metric::Height => &self.height,
            Metric::Width => &self.width,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Metric, &T) -> U) -> PeakMetrics<U> {
        PeakMetrics {
            position: f(Metric::Position, &self.position),
            height: f(Metric::Height, &self.height),
            width: f(Metric::Width, &self.width),
        }
    }

    pub fn zip_with<U, V>(
        &self,
        other: &PeakMetrics<U>,
        mut f: impl FnMut(&T, &U) -> V,
    ) -> PeakMetrics<V> {
        PeakMetrics {
            position: f(&self.position, &other.position),
            height: f(&self.height, &other.height),
            width: f(&self.width, &other.width),
        }
    }
}

// ---------------------------------------------------------------------------
// TableScale – acquisition unit conversion
// ---------------------------------------------------------------------------

/// Divisors converting sample indices into physical units (seconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableScale {
    pub position: f64,
    pub width: f64,
}

impl Default for TableScale {
    fn default() -> Self {
        TableScale {
            position: 10.0,
            width: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// MetricsTable
// ---------------------------------------------------------------------------

/// Per-peak Position / Height / Width, one column per peak in detection order.
///
/// Serialized row-major as a list of [`TableRow`]s so persisted references
/// read like the table they describe.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<TableRow>", into = "Vec<TableRow>")]
pub struct MetricsTable {
    columns: Vec<PeakMetrics>,
}

/// One serialized row: a metric key and one value per peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub parameter: String,
    pub values: Vec<f64>,
}

impl MetricsTable {
    /// Build the table for detected peaks.
    ///
    /// Position is `index / scale.position`.  Width is floored to whole samples
    /// before dividing by `scale.width`.  Height is rounded to two decimals.
    pub fn build(peaks: &[Peak], scale: &TableScale) -> Self {
        let columns = peaks
            .iter()
            .map(|p| PeakMetrics {
                position: p.index as f64 / scale.position,
                height: round2(p.height),
                width: p.width.floor() / scale.width,
            })
            .collect();
        MetricsTable { columns }
    }

    pub fn from_columns(columns: Vec<PeakMetrics>) -> Self {
        MetricsTable { columns }
    }

    /// Build a table from row-major data.
    ///
    /// Rows must be exactly Position, Height, Width in that order and all of
    /// the same length.
    pub fn from_rows(rows: Vec<TableRow>) -> Result<Self> {
        if rows.len() != Metric::ALL.len() {
            return Err(AnalysisError::ShapeMismatch(format!(
                "expected {} rows (Position, Height, Width), found {}",
                Metric::ALL.len(),
                rows.len()
            )));
        }
        for (row, metric) in rows.iter().zip(Metric::ALL) {
            if row.parameter != metric.key() {
                return Err(AnalysisError::ShapeMismatch(format!(
                    "expected row '{}', found '{}'",
                    metric.key(),
                    row.parameter
                )));
            }
        }
        let width = rows[0].values.len();
        if let Some(row) = rows.iter().find(|r| r.values.len() != width) {
            return Err(AnalysisError::ShapeMismatch(format!(
                "row '{}' has {} values, expected {width}",
                row.parameter,
                row.values.len()
            )));
        }

        let columns = (0..width)
            .map(|j| PeakMetrics {
                position: rows[0].values[j],
                height: rows[1].values[j],
                width: rows[2].values[j],
            })
            .collect();
        Ok(MetricsTable { columns })
    }

    /// Row-major view, in the fixed row order.
    pub fn rows(&self) -> Vec<TableRow> {
        Metric::ALL
            .iter()
            .map(|&metric| TableRow {
                parameter: metric.key().to_string(),
                values: self.row(metric),
            })
            .collect()
    }

    pub fn columns(&self) -> &[PeakMetrics] {
        &self.columns
    }

    pub fn row(&self, metric: Metric) -> Vec<f64> {
        self.columns.iter().map(|c| *c.get(metric)).collect()
    }

    /// Largest value of a row, `None` without peaks.
    pub fn row_max(&self, metric: Metric) -> Option<f64> {
        self.columns.iter().map(|c| *c.get(metric)).reduce(f64::max)
    }

    pub fn peak_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl TryFrom<Vec<TableRow>> for MetricsTable {
    type Error = AnalysisError;

    fn try_from(rows: Vec<TableRow>) -> Result<Self> {
        MetricsTable::from_rows(rows)
    }
}

impl From<MetricsTable> for Vec<TableRow> {
    fn from(table: MetricsTable) -> Self {
        table.rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(index: usize, height: f64, width: f64) -> Peak {
        Peak {
            index,
            height,
            prominence: height,
            width,
            width_height: height / 2.0,
            left_ip: index as f64 - width / 2.0,
            right_ip: index as f64 + width / 2.0,
        }
    }

    fn row(parameter: &str, values: &[f64]) -> TableRow {
        TableRow {
            parameter: parameter.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_build_scales_and_rounds() {
        let peaks = [peak(120, 0.456_78, 37.9), peak(455, 12.0, 8.2)];
        let table = MetricsTable::build(&peaks, &TableScale::default());

        assert_eq!(table.peak_count(), 2);
        assert_eq!(table.row(Metric::Position), vec![12.0, 45.5]);
        assert_eq!(table.row(Metric::Height), vec![0.46, 12.0]);
        assert_eq!(table.row(Metric::Width), vec![3.7, 0.8]);
    }

    #[test]
    fn test_custom_scale() {
        let scale = TableScale {
            position: 2.0,
            width: 4.0,
        };
        let table = MetricsTable::build(&[peak(10, 1.0, 8.6)], &scale);
        assert_eq!(table.columns()[0].position, 5.0);
        assert_eq!(table.columns()[0].width, 2.0);
    }

    #[test]
    fn test_no_peaks_gives_empty_table() {
        let table = MetricsTable::build(&[], &TableScale::default());
        assert!(table.is_empty());
        assert_eq!(table.rows().len(), 3);
        assert!(table.rows().iter().all(|r| r.values.is_empty()));
    }

    #[test]
    fn test_rows_round_trip() {
        let table = MetricsTable::build(
            &[peak(10, 5.0, 5.0), peak(70, 8.0, 12.0)],
            &TableScale::default(),
        );
        assert_eq!(MetricsTable::from_rows(table.rows()).unwrap(), table);
    }

    #[test]
    fn test_from_rows_shape_checks() {
        let missing = vec![row("Position", &[1.0]), row("Height", &[5.0])];
        assert!(matches!(
            MetricsTable::from_rows(missing),
            Err(AnalysisError::ShapeMismatch(_))
        ));

        let swapped = vec![
            row("Height", &[5.0]),
            row("Position", &[1.0]),
            row("Width", &[0.5]),
        ];
        assert!(matches!(
            MetricsTable::from_rows(swapped),
            Err(AnalysisError::ShapeMismatch(_))
        ));

        let ragged = vec![
            row("Position", &[1.0, 2.0]),
            row("Height", &[5.0]),
            row("Width", &[0.5, 0.4]),
        ];
        assert!(matches!(
            MetricsTable::from_rows(ragged),
            Err(AnalysisError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_row_max() {
        let table = MetricsTable::from_columns(vec![
            PeakMetrics {
                position: 1.0,
                height: 5.0,
                width: 0.5,
            },
            PeakMetrics {
                position: 7.0,
                height: 2.0,
                width: 0.9,
            },
        ]);
        assert_eq!(table.row_max(Metric::Height), Some(5.0));
        assert_eq!(table.row_max(Metric::Width), Some(0.9));
        assert_eq!(MetricsTable::default().row_max(Metric::Height), None);
    }
}
