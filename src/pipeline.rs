//! End-to-end analysis: file → peaks → table → comparison.
//!
//! Each file is analyzed independently.  Errors are kept per file, so a batch
//! always yields one outcome per input path.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::analysis::compare::{Comparison, compare};
use crate::analysis::peaks::{Peak, detect_peaks};
use crate::analysis::table::MetricsTable;
use crate::analysis::tolerance::{ClassificationGrid, ToleranceSet, classify};
use crate::analysis::widths::peak_widths;
use crate::config::AnalysisConfig;
use crate::data::loader::load_file;
use crate::data::model::Signal;
use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// Single trace
// ---------------------------------------------------------------------------

/// Peaks and metrics table of one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalAnalysis {
    pub peaks: Vec<Peak>,
    pub table: MetricsTable,
}

/// An analyzed trace file.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceAnalysis {
    /// Sample name from the file, else the file stem.
    pub name: String,
    /// Sample information entries in display order.
    pub info: Vec<(String, String)>,
    pub analysis: SignalAnalysis,
}

/// Detect peaks and measure their widths.
pub fn measure_peaks(signal: &Signal, config: &AnalysisConfig) -> Result<Vec<Peak>> {
    let candidates = detect_peaks(signal, config.min_height)?;
    let indices: Vec<usize> = candidates.iter().map(|c| c.index).collect();
    let widths = peak_widths(signal, &indices, config.relative_height)?;
    Ok(candidates
        .into_iter()
        .zip(widths)
        .map(|(candidate, width)| Peak::new(candidate, width))
        .collect())
}

/// Run detection, width estimation and table building on one signal.
pub fn analyze_signal(signal: &Signal, config: &AnalysisConfig) -> Result<SignalAnalysis> {
    config.validate()?;
    let peaks = measure_peaks(signal, config)?;
    let table = MetricsTable::build(&peaks, &config.table_scale());
    Ok(SignalAnalysis { peaks, table })
}

/// Load a trace file and analyze its configured channel.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<TraceAnalysis> {
    let chromatogram =
        load_file(path).map_err(|e| AnalysisError::InvalidInput(format!("{e:#}")))?;
    let signal = chromatogram.signal(&config.channel, config.max_samples)?;
    let analysis = analyze_signal(&signal, config)?;

    let name = chromatogram
        .sample_name()
        .unwrap_or_else(|| display_name(path));
    log::info!(
        "{}: {} peaks in {} samples",
        path.display(),
        analysis.peaks.len(),
        signal.len()
    );

    Ok(TraceAnalysis {
        name,
        info: chromatogram
            .info()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        analysis,
    })
}

fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Comparison against a reference
// ---------------------------------------------------------------------------

/// A sample compared with the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleReport {
    pub trace: TraceAnalysis,
    pub comparison: Comparison,
    pub classification: ClassificationGrid,
}

pub fn compare_to_reference(
    trace: TraceAnalysis,
    reference: &MetricsTable,
    tolerances: &ToleranceSet,
) -> SampleReport {
    let comparison = compare(&trace.analysis.table, reference);
    let classification = classify(&comparison.differences, tolerances);
    SampleReport {
        trace,
        comparison,
        classification,
    }
}

/// Result of one file in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub path: PathBuf,
    pub result: Result<SampleReport>,
}

impl SampleOutcome {
    /// Sample name when analysis succeeded, else the file stem.
    pub fn name(&self) -> String {
        match &self.result {
            Ok(report) => report.trace.name.clone(),
            Err(_) => display_name(&self.path),
        }
    }
}

/// Analyze files in parallel, keeping input order.
pub fn analyze_files(
    paths: &[PathBuf],
    config: &AnalysisConfig,
) -> Vec<(PathBuf, Result<TraceAnalysis>)> {
    paths
        .par_iter()
        .map(|path| {
            let result = analyze_file(path, config);
            if let Err(e) = &result {
                log::error!("{}: {e}", path.display());
            }
            (path.clone(), result)
        })
        .collect()
}

/// Compare already analyzed samples with a reference.
pub fn compare_all(
    analyses: &[(PathBuf, Result<TraceAnalysis>)],
    reference: &MetricsTable,
    tolerances: &ToleranceSet,
) -> Vec<SampleOutcome> {
    analyses
        .iter()
        .map(|(path, result)| SampleOutcome {
            path: path.clone(),
            result: result
                .clone()
                .map(|trace| compare_to_reference(trace, reference, tolerances)),
        })
        .collect()
}

/// Analyze and compare a batch of sample files against one reference.
pub fn analyze_batch(
    paths: &[PathBuf],
    reference: &MetricsTable,
    tolerances: &ToleranceSet,
    config: &AnalysisConfig,
) -> Vec<SampleOutcome> {
    compare_all(&analyze_files(paths, config), reference, tolerances)
}
