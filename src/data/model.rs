use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AnalysisError, Result};

/// Metadata key holding the human-readable sample name.
pub const SAMPLE_NAME_KEY: &str = "Sample Name";

/// Metadata keys shown on a sample's info card, in display order.
pub const INFO_KEYS: [&str; 4] = ["Sample Name", "Method Name", "Run Name", "Run Date"];

// ---------------------------------------------------------------------------
// MetadataValue – one entry of a trace's sample information
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value as found in instrument exports.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Signal – the single-channel input of the analysis core
// ---------------------------------------------------------------------------

/// An immutable 1-D intensity trace, implicitly indexed `0..N-1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    values: Vec<f64>,
}

impl Signal {
    /// Wrap intensities, rejecting NaN and infinities.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "sample {i} is not a finite number ({})",
                values[i]
            )));
        }
        Ok(Signal { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest intensity, `None` for an empty signal.
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

// ---------------------------------------------------------------------------
// Chromatogram – a loaded trace file
// ---------------------------------------------------------------------------

/// A parsed trace file: time axis, intensity channels and sample information.
#[derive(Debug, Clone, Default)]
pub struct Chromatogram {
    /// Acquisition time of each sample.
    pub time: Vec<f64>,
    /// Intensities per detector channel, e.g. `"254"` → values.
    pub channels: BTreeMap<String, Vec<f64>>,
    /// Sample information columns: key → value.
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl Chromatogram {
    /// Extract one channel as a [`Signal`], keeping at most `max_samples` points.
    ///
    /// Peaks are located by sample index, so the time axis may be shorter or
    /// longer than the channel.
    pub fn signal(&self, channel: &str, max_samples: usize) -> Result<Signal> {
        let values = self.channels.get(channel).ok_or_else(|| {
            let available: Vec<&str> = self.channels.keys().map(String::as_str).collect();
            AnalysisError::InvalidInput(format!(
                "channel '{channel}' not found (available: {})",
                available.join(", ")
            ))
        })?;

        if values.len() != self.time.len() {
            log::debug!(
                "channel '{channel}' has {} values, time has {}",
                values.len(),
                self.time.len()
            );
        }

        let n = values.len().min(max_samples);
        if n < values.len() {
            log::debug!("truncating channel '{channel}' from {} to {n} samples", values.len());
        }
        Signal::new(values[..n].to_vec())
    }

    /// The "Sample Name" entry, if the file carried one.
    pub fn sample_name(&self) -> Option<String> {
        self.metadata.get(SAMPLE_NAME_KEY).map(|v| v.to_string())
    }

    /// Sample information entries present in this file, in display order.
    pub fn info(&self) -> Vec<(&'static str, &MetadataValue)> {
        INFO_KEYS
            .iter()
            .filter_map(|&key| self.metadata.get(key).map(|v| (key, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chromatogram(n: usize) -> Chromatogram {
        let mut channels = BTreeMap::new();
        channels.insert("254".to_string(), (0..n).map(|i| i as f64).collect());
        Chromatogram {
            time: (0..n).map(|i| i as f64 / 10.0).collect(),
            channels,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_signal_rejects_nan() {
        let err = Signal::new(vec![0.0, f64::NAN, 1.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn test_signal_max() {
        assert_eq!(Signal::new(vec![]).unwrap().max(), None);
        assert_eq!(Signal::new(vec![1.0, 7.5, 3.0]).unwrap().max(), Some(7.5));
    }

    #[test]
    fn test_truncates_to_max_samples() {
        let signal = chromatogram(10).signal("254", 4).unwrap();
        assert_eq!(signal.values(), &[0.0, 1.0, 2.0, 3.0]);

        let signal = chromatogram(3).signal("254", 6000).unwrap();
        assert_eq!(signal.len(), 3);
    }

    #[test]
    fn test_missing_channel() {
        let err = chromatogram(5).signal("280", 6000).unwrap_err();
        assert!(err.to_string().contains("280"));
    }

    #[test]
    fn test_time_length_does_not_limit_signal() {
        let mut c = chromatogram(5);
        c.time.push(0.5);
        assert_eq!(c.signal("254", 6000).unwrap().len(), 5);

        c.time.truncate(2);
        assert_eq!(c.signal("254", 4).unwrap().len(), 4);
    }

    #[test]
    fn test_info_order() {
        let mut c = chromatogram(1);
        c.metadata
            .insert("Run Date".into(), MetadataValue::String("2021-03-01".into()));
        c.metadata
            .insert("Sample Name".into(), MetadataValue::String("NPB".into()));
        c.metadata.insert("Vial".into(), MetadataValue::Integer(3));
        let keys: Vec<&str> = c.info().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Sample Name", "Run Date"]);
        assert_eq!(c.sample_name().as_deref(), Some("NPB"));
    }
}
