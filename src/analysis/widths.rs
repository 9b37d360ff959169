//! Peak width at a fraction of the peak's prominence.
//!
//! For each peak the prominence is measured first: walking outward on each
//! side while samples stay at or below the peak height, the lowest sample seen
//! is that side's base.  The higher of the two bases is the reference level and
//! `prominence = height - reference`.
//!
//! The width is then evaluated at `height - relative_height * prominence`.
//! Starting at the peak, the walk continues toward each base while the signal
//! stays above that level; the exact crossing is linearly interpolated between
//! the two samples that straddle it.  `relative_height = 0.5` gives the full
//! width at half maximum, `0.95` a width close to the peak base.

use crate::data::model::Signal;
use crate::error::{AnalysisError, Result};

/// Relative height for full width at half maximum.
pub const FWHM: f64 = 0.5;

/// Width measurement for one peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakWidth {
    /// `right_ip - left_ip`, in samples, never negative.
    pub width: f64,
    /// Absolute level at which the width was measured.
    pub width_height: f64,
    pub prominence: f64,
    pub left_ip: f64,
    pub right_ip: f64,
}

struct Prominence {
    value: f64,
    left_base: usize,
    right_base: usize,
}

/// Measure the width of every peak in `peaks` at `relative_height` of its
/// prominence.  `relative_height` must lie in `(0, 1]`.
pub fn peak_widths(signal: &Signal, peaks: &[usize], relative_height: f64) -> Result<Vec<PeakWidth>> {
    if !(relative_height > 0.0 && relative_height <= 1.0) {
        return Err(AnalysisError::parameter(
            "relative_height",
            format!("must lie in (0, 1], got {relative_height}"),
        ));
    }

    let y = signal.values();
    peaks
        .iter()
        .map(|&peak| {
            if peak >= y.len() {
                return Err(AnalysisError::InvalidInput(format!(
                    "peak index {peak} outside signal of length {}",
                    y.len()
                )));
            }
            let prominence = prominence(y, peak);
            Ok(width_at(y, peak, &prominence, relative_height))
        })
        .collect()
}

fn prominence(y: &[f64], peak: usize) -> Prominence {
    let height = y[peak];

    let mut left_min = height;
    let mut left_base = peak;
    for i in (0..=peak).rev() {
        if y[i] > height {
            break;
        }
        if y[i] < left_min {
            left_min = y[i];
            left_base = i;
        }
    }

    let mut right_min = height;
    let mut right_base = peak;
    for (i, &v) in y.iter().enumerate().skip(peak) {
        if v > height {
            break;
        }
        if v < right_min {
            right_min = v;
            right_base = i;
        }
    }

    Prominence {
        value: height - left_min.max(right_min),
        left_base,
        right_base,
    }
}

fn width_at(y: &[f64], peak: usize, prominence: &Prominence, relative_height: f64) -> PeakWidth {
    let level = y[peak] - prominence.value * relative_height;
    let last = (y.len() - 1) as f64;

    // y[peak] >= level, so a sample below the level is never the peak itself
    // and its inner neighbour exists.
    let mut i = peak;
    while i > prominence.left_base && level < y[i] {
        i -= 1;
    }
    let mut left_ip = i as f64;
    if y[i] < level {
        left_ip += (level - y[i]) / (y[i + 1] - y[i]);
    }

    let mut i = peak;
    while i < prominence.right_base && level < y[i] {
        i += 1;
    }
    let mut right_ip = i as f64;
    if y[i] < level {
        right_ip -= (level - y[i]) / (y[i - 1] - y[i]);
    }

    let left_ip = left_ip.clamp(0.0, last);
    let right_ip = right_ip.clamp(0.0, last);

    PeakWidth {
        width: (right_ip - left_ip).max(0.0),
        width_height: level,
        prominence: prominence.value,
        left_ip,
        right_ip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(values: &[f64]) -> Signal {
        Signal::new(values.to_vec()).unwrap()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_half_max_on_triangle() {
        let y = signal(&[0.0, 1.0, 5.0, 1.0, 0.0, 0.0, 1.0, 8.0, 1.0, 0.0]);
        let widths = peak_widths(&y, &[2, 7], FWHM).unwrap();

        let first = widths[0];
        assert_close(first.prominence, 5.0);
        assert_close(first.width_height, 2.5);
        assert_close(first.left_ip, 1.375);
        assert_close(first.right_ip, 2.625);
        assert_close(first.width, 1.25);

        let second = widths[1];
        assert_close(second.prominence, 8.0);
        assert_close(second.width_height, 4.0);
        assert_close(second.left_ip, 6.0 + 3.0 / 7.0);
        assert_close(second.right_ip, 8.0 - 3.0 / 7.0);
    }

    #[test]
    fn test_prominence_uses_higher_base() {
        // left base 2.0 at index 0, right base 0.0 at index 4
        let y = signal(&[2.0, 3.0, 6.0, 1.0, 0.0]);
        let widths = peak_widths(&y, &[2], FWHM).unwrap();
        assert_close(widths[0].prominence, 4.0);
        assert_close(widths[0].width_height, 4.0);
    }

    #[test]
    fn test_walk_stops_at_higher_neighbour() {
        // The shoulder at index 1 is bounded by the taller peak at index 3.
        let y = signal(&[0.0, 4.0, 2.0, 9.0, 0.0]);
        let widths = peak_widths(&y, &[1], 1.0).unwrap();
        assert_close(widths[0].prominence, 2.0);
        assert_close(widths[0].width_height, 2.0);
        assert_close(widths[0].left_ip, 0.5);
        assert_close(widths[0].right_ip, 2.0);
    }

    #[test]
    fn test_gaussian_fwhm() {
        let sigma = 10.0;
        let y: Vec<f64> = (0..101)
            .map(|i| {
                let x = (f64::from(i) - 50.0) / sigma;
                (-0.5 * x * x).exp()
            })
            .collect();
        let widths = peak_widths(&signal(&y), &[50], FWHM).unwrap();
        let analytic = 2.0 * (2.0 * 2f64.ln()).sqrt() * sigma;
        assert!((widths[0].width - analytic).abs() <= 1.0);
    }

    #[test]
    fn test_bounds_within_signal() {
        let y = signal(&[0.0, 1.0, 5.0, 1.0, 0.0]);
        let w = peak_widths(&y, &[2], 1.0).unwrap()[0];
        assert!(w.left_ip >= 0.0 && w.right_ip <= 4.0);
        assert!(w.width >= 0.0);
    }

    #[test]
    fn test_relative_height_range() {
        let y = signal(&[0.0, 1.0, 0.0]);
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let err = peak_widths(&y, &[1], bad).unwrap_err();
            assert!(matches!(
                err,
                AnalysisError::InvalidParameter { name: "relative_height", .. }
            ));
        }
        assert!(peak_widths(&y, &[1], 1.0).is_ok());
    }

    #[test]
    fn test_index_out_of_range() {
        let y = signal(&[0.0, 1.0, 0.0]);
        assert!(matches!(
            peak_widths(&y, &[3], FWHM).unwrap_err(),
            AnalysisError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_no_peaks() {
        let y = signal(&[0.0, 1.0, 0.0]);
        assert!(peak_widths(&y, &[], FWHM).unwrap().is_empty());
    }
}
