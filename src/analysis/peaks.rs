use crate::data::model::Signal;
use crate::error::{AnalysisError, Result};

use super::widths::PeakWidth;

/// Fraction of the signal maximum used when no minimum height is given.
pub const DEFAULT_HEIGHT_FRACTION: f64 = 0.1;

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// A local maximum that passed the height filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    /// Sample index in the signal.
    pub index: usize,
    /// Signal value at `index`.
    pub height: f64,
}

/// Find local maxima with a value of at least `min_height`.
///
/// A sample is a local maximum when it is strictly greater than both of its
/// neighbours, so the first and last samples never qualify.  Without an
/// explicit `min_height` the threshold is `0.1 * max(signal)`, which fails on
/// an empty signal.  Peaks are returned in ascending index order.
pub fn detect_peaks(signal: &Signal, min_height: Option<f64>) -> Result<Vec<PeakCandidate>> {
    let min_height = match min_height {
        Some(h) if !h.is_finite() => {
            return Err(AnalysisError::parameter(
                "min_height",
                format!("must be a finite number, got {h}"),
            ));
        }
        Some(h) => h,
        None => default_min_height(signal)?,
    };

    let y = signal.values();
    let peaks: Vec<PeakCandidate> = y
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2] && w[1] >= min_height)
        .map(|(i, w)| PeakCandidate {
            index: i + 1,
            height: w[1],
        })
        .collect();

    log::debug!(
        "detected {} peaks in {} samples (min_height = {min_height})",
        peaks.len(),
        y.len()
    );
    Ok(peaks)
}

/// `0.1 * max(signal)`; an empty signal has no maximum and is an error.
pub fn default_min_height(signal: &Signal) -> Result<f64> {
    signal
        .max()
        .map(|max| DEFAULT_HEIGHT_FRACTION * max)
        .ok_or_else(|| {
            AnalysisError::InvalidInput(
                "cannot derive a default minimum height from an empty signal".into(),
            )
        })
}

// ---------------------------------------------------------------------------
// Peak – a detected and measured peak
// ---------------------------------------------------------------------------

/// A detected peak together with its width measurement.
///
/// Peaks carry no identity beyond their rank in ascending index order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub height: f64,
    /// Height above the higher of the two surrounding bases.
    pub prominence: f64,
    /// Width in samples at `width_height`.
    pub width: f64,
    /// Level at which the width was measured.
    pub width_height: f64,
    /// Interpolated left crossing, fractional index.
    pub left_ip: f64,
    /// Interpolated right crossing, fractional index.
    pub right_ip: f64,
}

impl Peak {
    pub fn new(candidate: PeakCandidate, width: PeakWidth) -> Self {
        Peak {
            index: candidate.index,
            height: candidate.height,
            prominence: width.prominence,
            width: width.width,
            width_height: width.width_height,
            left_ip: width.left_ip,
            right_ip: width.right_ip,
        }
    }
}
