//! Presentation boundary: text tables, encoded cells and CSV export.
//!
//! The analysis types keep sample values and differences as numbers.  Only
//! here are they joined into `"<sample>/<difference>"` cells, the form the
//! dashboards displayed and highlighted.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use console::style;

use crate::analysis::compare::{MergedCell, MergedTable};
use crate::analysis::summary::MetricSummary;
use crate::analysis::table::{Metric, MetricsTable};
use crate::analysis::tolerance::{Classification, ToleranceSet, count_out_of_tolerance};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::{SampleOutcome, SampleReport};

/// Prefix marking an out-of-tolerance cell in text tables.
const OUT_OF_TOLERANCE_MARK: &str = "*";

// ---------------------------------------------------------------------------
// Cell encoding
// ---------------------------------------------------------------------------

fn fmt_value(v: f64) -> String {
    format!("{v:?}")
}

/// `"<sample>/<difference>"`, e.g. `"12.3/-0.05"`.
pub fn encode_cell(cell: &MergedCell) -> String {
    format!("{}/{}", fmt_value(cell.sample), fmt_value(cell.difference))
}

/// Read the difference back from an encoded cell: the text after the last `/`.
pub fn decode_difference(cell: &str) -> Result<f64, AnalysisError> {
    cell.rsplit_once('/')
        .and_then(|(_, diff)| diff.trim().parse::<f64>().ok())
        .ok_or_else(|| AnalysisError::CellParse(cell.to_string()))
}

/// Encoded rows of a merged table, in table row order.
pub fn encoded_rows(merged: &MergedTable) -> Vec<(Metric, Vec<String>)> {
    Metric::ALL
        .iter()
        .map(|&metric| {
            let cells = merged.iter().map(|c| encode_cell(c.get(metric))).collect();
            (metric, cells)
        })
        .collect()
}

/// Classify encoded cells of one row.
///
/// A cell whose difference cannot be read gets no classification; the rest of
/// the row is unaffected.
pub fn classify_encoded(cells: &[String], threshold: f64) -> Vec<Option<Classification>> {
    cells
        .iter()
        .map(|cell| match decode_difference(cell) {
            Ok(diff) => Some(Classification::of(diff, threshold)),
            Err(e) => {
                log::warn!("{e}; leaving cell unhighlighted");
                None
            }
        })
        .collect()
}

/// Classify every row of an encoded table against its metric's tolerance.
pub fn classify_encoded_rows(
    rows: &[(Metric, Vec<String>)],
    tolerances: &ToleranceSet,
) -> Vec<Vec<Option<Classification>>> {
    rows.iter()
        .map(|(metric, cells)| classify_encoded(cells, tolerances.for_metric(*metric)))
        .collect()
}

fn mark(text: String, classification: Option<Classification>) -> String {
    match classification {
        Some(Classification::OutOfTolerance) => format!("{OUT_OF_TOLERANCE_MARK}{text}"),
        _ => text,
    }
}

// ---------------------------------------------------------------------------
// Text tables
// ---------------------------------------------------------------------------

fn string_table(headers: &[String], columns: Vec<Vec<Option<String>>>) -> Result<String> {
    let schema = Schema::new(
        headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    );
    let arrays: Vec<ArrayRef> = columns
        .into_iter()
        .map(|c| Arc::new(StringArray::from(c)) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(Arc::new(schema), arrays).context("building table")?;
    Ok(pretty_format_batches(&[batch])
        .context("formatting table")?
        .to_string())
}

fn peak_headers(first: &str, peaks: usize, config: &AnalysisConfig) -> Vec<String> {
    std::iter::once(first.to_string())
        .chain((0..peaks).map(|i| config.peak_label(i)))
        .collect()
}

fn footer(out: usize) -> String {
    if out == 0 {
        style("all cells within tolerance").green().to_string()
    } else {
        style(format!("{out} cell(s) out of tolerance (marked {OUT_OF_TOLERANCE_MARK})"))
            .red()
            .bold()
            .to_string()
    }
}

/// Parameter column plus one column per peak.
pub fn render_metrics(table: &MetricsTable, config: &AnalysisConfig) -> Result<String> {
    let headers = peak_headers("Parameter", table.peak_count(), config);
    let mut columns: Vec<Vec<Option<String>>> =
        vec![Metric::ALL.iter().map(|m| Some(m.label().to_string())).collect()];
    for column in table.columns() {
        columns.push(
            Metric::ALL
                .iter()
                .map(|&m| Some(fmt_value(*column.get(m))))
                .collect(),
        );
    }
    string_table(&headers, columns)
}

/// The merged `"sample/difference"` table of one sample, marked from its
/// classification grid.
pub fn render_comparison(report: &SampleReport, config: &AnalysisConfig) -> Result<String> {
    let merged = &report.comparison.merged;
    let peaks = merged.len();

    let headers = peak_headers("Parameter", peaks, config);
    let mut columns: Vec<Vec<Option<String>>> =
        vec![Metric::ALL.iter().map(|m| Some(m.label().to_string())).collect()];
    for (cells, classes) in merged.iter().zip(&report.classification) {
        columns.push(
            Metric::ALL
                .iter()
                .map(|&m| Some(mark(encode_cell(cells.get(m)), Some(*classes.get(m)))))
                .collect(),
        );
    }
    let out = count_out_of_tolerance(&report.classification);

    let mut text = string_table(&headers, columns)?;
    text.push('\n');
    if report.comparison.peak_count_mismatch() {
        text.push_str(
            &style(format!(
                "peak count differs: sample {} / reference {}; extra peaks not compared\n",
                report.comparison.sample_peaks, report.comparison.reference_peaks
            ))
            .yellow()
            .to_string(),
        );
    }
    text.push_str(&footer(out));
    Ok(text)
}

/// Sample information lines ("Sample Name: ...").
pub fn render_info(report: &SampleReport) -> String {
    report
        .trace
        .info
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One row per sample, one column per peak; failed samples stay blank.
pub fn render_summary(summary: &MetricSummary, config: &AnalysisConfig) -> Result<String> {
    let peaks = summary.peak_columns();
    let headers = peak_headers("Sample", peaks, config);

    let mut columns: Vec<Vec<Option<String>>> =
        vec![summary.rows.iter().map(|r| Some(r.sample.clone())).collect()];
    for j in 0..peaks {
        columns.push(
            summary
                .rows
                .iter()
                .map(|r| {
                    r.cells
                        .get(j)
                        .map(|c| mark(fmt_value(c.difference), Some(c.classification)))
                })
                .collect(),
        );
    }

    Ok(format!(
        "{} (tolerance ±{})\n{}\n{}",
        style(summary.metric.plural()).bold(),
        summary.tolerance,
        string_table(&headers, columns)?,
        footer(summary.out_of_tolerance())
    ))
}

/// Placeholder line for a file that could not be analyzed.
pub fn render_failure(outcome: &SampleOutcome) -> Option<String> {
    outcome.result.as_ref().err().map(|e| {
        style(format!("{}: {e}", outcome.path.display()))
            .red()
            .to_string()
    })
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Write a summary as CSV: `Sample,Peak 1,...`; missing cells are empty.
pub fn write_summary_csv<W: io::Write>(
    summary: &MetricSummary,
    config: &AnalysisConfig,
    writer: W,
) -> Result<()> {
    let peaks = summary.peak_columns();
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(peak_headers("Sample", peaks, config))
        .context("writing CSV header")?;
    for row in &summary.rows {
        let record = std::iter::once(row.sample.clone()).chain(
            (0..peaks).map(|j| row.cells.get(j).map(|c| fmt_value(c.difference)).unwrap_or_default()),
        );
        csv.write_record(record)
            .with_context(|| format!("writing CSV row for {}", row.sample))?;
    }
    csv.flush().context("flushing CSV")?;
    Ok(())
}
