use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::summary::{MetricSummary, summarize};
use crate::analysis::table::MetricsTable;
use crate::analysis::tolerance::ToleranceSet;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::pipeline::{SampleOutcome, TraceAnalysis, analyze_file, analyze_files, compare_all};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// A published reference: its table and the tolerances derived from it.
///
/// Never mutated after publication; shared read-only with every comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub name: String,
    pub table: MetricsTable,
    pub tolerances: ToleranceSet,
}

/// What a host keeps between requests: one reference, analyzed samples and
/// their comparisons.
pub struct SessionState {
    pub config: AnalysisConfig,

    /// Published reference (None until one is set).
    pub reference: Option<Arc<Reference>>,

    /// Analyzed samples, cached so a new reference does not reload files.
    samples: Vec<(PathBuf, Result<TraceAnalysis>)>,

    /// Samples compared with the current reference.
    pub outcomes: Vec<SampleOutcome>,

    /// Status / error message for the host to display.
    pub status_message: Option<String>,
}

impl SessionState {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            reference: None,
            samples: Vec::new(),
            outcomes: Vec::new(),
            status_message: None,
        }
    }

    /// Publish a reference table and re-run every comparison.
    pub fn set_reference(&mut self, name: impl Into<String>, table: MetricsTable) {
        let tolerances = ToleranceSet::from_reference(&table, &self.config.tolerances);
        self.reference = Some(Arc::new(Reference {
            name: name.into(),
            table,
            tolerances,
        }));
        self.recompare();
    }

    /// Analyze a trace file and publish it as the reference.
    pub fn set_reference_from_file(&mut self, path: &Path) -> Result<()> {
        match analyze_file(path, &self.config) {
            Ok(trace) => {
                self.set_reference(trace.name, trace.analysis.table);
                Ok(())
            }
            Err(e) => {
                self.status_message = Some(format!("{}: {e}", path.display()));
                Err(e)
            }
        }
    }

    /// Analyze sample files (in parallel) and compare them with the reference.
    pub fn add_samples(&mut self, paths: &[PathBuf]) {
        let analyzed = analyze_files(paths, &self.config);
        self.samples.extend(analyzed);
        self.recompare();
    }

    /// Drop all samples, keeping the reference.
    pub fn clear_samples(&mut self) {
        self.samples.clear();
        self.outcomes.clear();
        self.status_message = None;
    }

    pub fn tolerances(&self) -> Option<ToleranceSet> {
        self.reference.as_ref().map(|r| r.tolerances)
    }

    /// Positions, FWHMs and Heights across all samples.
    pub fn summaries(&self) -> Vec<MetricSummary> {
        let Some(reference) = &self.reference else {
            return Vec::new();
        };
        let names: Vec<String> = self.outcomes.iter().map(SampleOutcome::name).collect();
        let samples: Vec<(&str, Option<_>)> = names
            .iter()
            .zip(&self.outcomes)
            .map(|(name, outcome)| {
                let differences = outcome
                    .result
                    .as_ref()
                    .ok()
                    .map(|r| &r.comparison.differences);
                (name.as_str(), differences)
            })
            .collect();
        summarize(&samples, &reference.tolerances)
    }

    fn recompare(&mut self) {
        let failed = self.samples.iter().filter(|(_, r)| r.is_err()).count();
        self.status_message = (failed > 0).then(|| {
            format!("{failed} of {} files could not be analyzed", self.samples.len())
        });

        // Samples wait for a reference.
        let Some(reference) = self.reference.clone() else {
            return;
        };
        self.outcomes = compare_all(&self.samples, &reference.table, &reference.tolerances);
    }
}
