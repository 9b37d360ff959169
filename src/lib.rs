//! # rusty-peaks
//!
//! Peak detection on chromatogram traces and comparison against a reference.
//!
//! A trace is reduced to a table of peak positions, heights and widths.  Sample
//! tables are compared column by column with a reference table, and each
//! difference is classified against a per-metric tolerance.
//!
//! ```no_run
//! use std::path::Path;
//! use rusty_peaks::config::AnalysisConfig;
//! use rusty_peaks::pipeline::{analyze_file, compare_to_reference};
//! use rusty_peaks::analysis::ToleranceSet;
//!
//! let config = AnalysisConfig::default();
//! let reference = analyze_file(Path::new("reference.json"), &config)?;
//! let tolerances = ToleranceSet::from_reference(&reference.analysis.table, &config.tolerances);
//!
//! let sample = analyze_file(Path::new("sample.json"), &config)?;
//! let report = compare_to_reference(sample, &reference.analysis.table, &tolerances);
//! println!("{:?}", report.classification);
//! # Ok::<(), rusty_peaks::error::AnalysisError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod state;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
