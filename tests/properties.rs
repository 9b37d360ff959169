//! Property tests for detection, widths, comparison and cell encoding.

use proptest::prelude::*;

use rusty_peaks::analysis::{
    MergedCell, MetricsTable, PeakMetrics, TableScale, compare, detect_peaks, peak_widths,
};
use rusty_peaks::data::model::Signal;
use rusty_peaks::pipeline::measure_peaks;
use rusty_peaks::report::{decode_difference, encode_cell};
use rusty_peaks::AnalysisConfig;

fn signal_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..100.0, 0..200)
}

fn table_strategy() -> impl Strategy<Value = MetricsTable> {
    prop::collection::vec((0.0f64..600.0, 0.0f64..10.0, 0.0f64..5.0), 0..12).prop_map(|cols| {
        MetricsTable::from_columns(
            cols.into_iter()
                .map(|(position, height, width)| PeakMetrics {
                    position,
                    height,
                    width,
                })
                .collect(),
        )
    })
}

proptest! {
    #[test]
    fn prop_peaks_strictly_increasing_and_interior(values in signal_strategy()) {
        let n = values.len();
        let signal = Signal::new(values.clone()).unwrap();
        let peaks = detect_peaks(&signal, Some(0.0)).unwrap();

        for pair in peaks.windows(2) {
            prop_assert!(pair[0].index < pair[1].index);
        }
        for p in &peaks {
            prop_assert!(p.index > 0 && p.index + 1 < n);
            prop_assert!(values[p.index - 1] < p.height && p.height > values[p.index + 1]);
            prop_assert_eq!(p.height, values[p.index]);
        }
    }

    #[test]
    fn prop_nothing_reaches_an_excessive_min_height(values in signal_strategy()) {
        let signal = Signal::new(values).unwrap();
        prop_assert!(detect_peaks(&signal, Some(100.0)).unwrap().is_empty());
    }

    #[test]
    fn prop_widths_are_non_negative_and_bounded(
        values in signal_strategy(),
        rel in 0.01f64..=1.0,
    ) {
        let n = values.len();
        let signal = Signal::new(values).unwrap();
        let indices: Vec<usize> = detect_peaks(&signal, Some(0.0))
            .unwrap()
            .iter()
            .map(|p| p.index)
            .collect();
        let widths = peak_widths(&signal, &indices, rel).unwrap();

        prop_assert_eq!(widths.len(), indices.len());
        let last = n.saturating_sub(1) as f64;
        for (w, &i) in widths.iter().zip(&indices) {
            prop_assert!(w.width >= 0.0);
            prop_assert!(w.prominence >= 0.0);
            prop_assert!(0.0 <= w.left_ip && w.left_ip <= i as f64);
            prop_assert!(i as f64 <= w.right_ip && w.right_ip <= last);
        }
    }

    #[test]
    fn prop_table_has_one_column_per_peak(values in signal_strategy()) {
        let signal = Signal::new(values).unwrap();
        let config = AnalysisConfig {
            min_height: Some(0.0),
            ..AnalysisConfig::default()
        };
        let peaks = measure_peaks(&signal, &config).unwrap();
        let table = MetricsTable::build(&peaks, &TableScale::default());
        prop_assert_eq!(table.peak_count(), peaks.len());
        for (col, peak) in table.columns().iter().zip(&peaks) {
            prop_assert!(col.width >= 0.0);
            prop_assert_eq!(col.position, peak.index as f64 / 10.0);
        }
    }

    #[test]
    fn prop_self_comparison_is_zero(table in table_strategy()) {
        let comparison = compare(&table, &table);
        prop_assert_eq!(comparison.differences.peak_count(), table.peak_count());
        prop_assert!(!comparison.peak_count_mismatch());
        for col in comparison.differences.columns() {
            prop_assert_eq!(col.position, 0.0);
            prop_assert_eq!(col.height, 0.0);
            prop_assert_eq!(col.width, 0.0);
        }
    }

    #[test]
    fn prop_comparison_uses_the_shorter_table(a in table_strategy(), b in table_strategy()) {
        let comparison = compare(&a, &b);
        let n = a.peak_count().min(b.peak_count());
        prop_assert_eq!(comparison.differences.peak_count(), n);
        prop_assert_eq!(comparison.merged.len(), n);
    }

    #[test]
    fn prop_encoded_cell_keeps_difference(sample in -1e6f64..1e6, difference in -1e6f64..1e6) {
        let cell = MergedCell { sample, difference };
        prop_assert_eq!(decode_difference(&encode_cell(&cell)).unwrap(), difference);
    }
}
