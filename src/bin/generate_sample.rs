//! Write synthetic chromatograms for trying out `rusty-peaks`.
//!
//! Produces, in the directory given as first argument (default `.`):
//! * `reference.json` – instrument-style JSON export
//! * `sample_<n>.parquet` – samples with drifted retention, scaled heights
//!   and (for the last one) an extra impurity peak

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use serde_json::json;

/// Samples per second of the simulated detector.
const RATE: f64 = 10.0;
const N_SAMPLES: usize = 6000;
const CHANNELS: [&str; 2] = ["254", "280"];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// (retention time s, sigma s, height) per peak
fn generate_trace(time: &[f64], peaks: &[(f64, f64, f64)], noise_level: f64, rng: &mut SimpleRng) -> Vec<f64> {
    time.iter()
        .map(|&t| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(t, mu, sigma, amp))
                .sum();
            signal + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir).expect("Failed to create output directory");

    let mut rng = SimpleRng::new(42);
    let time: Vec<f64> = (0..N_SAMPLES).map(|i| i as f64 / RATE).collect();

    let reference_peaks = vec![(60.0, 1.5, 0.8), (150.0, 2.0, 1.2), (320.0, 2.5, 0.5)];
    let channel_gain = [1.0, 0.6];

    // ---- Reference: JSON export ----
    let mut intensities = BTreeMap::new();
    for (channel, gain) in CHANNELS.iter().zip(channel_gain) {
        let peaks: Vec<(f64, f64, f64)> = reference_peaks
            .iter()
            .map(|&(mu, sigma, amp)| (mu, sigma, amp * gain))
            .collect();
        intensities.insert(channel.to_string(), generate_trace(&time, &peaks, 0.002, &mut rng));
    }
    let reference = json!({
        "time": time,
        "intensities": intensities,
        "Sample Name": "NPB standard",
        "Method Name": "uv-std",
        "Run Name": "run-000",
        "Run Date": "2021-03-01 09:00",
    });
    let reference_path = out_dir.join("reference.json");
    std::fs::write(&reference_path, reference.to_string()).expect("Failed to write reference");
    println!("Wrote {}", reference_path.display());

    // ---- Samples: Parquet ----
    let drifts = [(0.0, 1.0), (1.2, 0.95), (-4.0, 1.1), (0.5, 0.7)];
    for (n, &(drift, scale)) in drifts.iter().enumerate() {
        let mut peaks: Vec<(f64, f64, f64)> = reference_peaks
            .iter()
            .map(|&(mu, sigma, amp)| (mu + drift, sigma, amp * scale))
            .collect();
        if n == drifts.len() - 1 {
            peaks.insert(1, (100.0, 1.0, 0.3));
        }

        let mut fields = vec![Field::new("time", DataType::Float64, false)];
        let mut columns: Vec<Arc<dyn arrow::array::Array>> =
            vec![Arc::new(Float64Array::from(time.clone()))];
        for (channel, gain) in CHANNELS.iter().zip(channel_gain) {
            let channel_peaks: Vec<(f64, f64, f64)> = peaks
                .iter()
                .map(|&(mu, sigma, amp)| (mu, sigma, amp * gain))
                .collect();
            fields.push(Field::new(*channel, DataType::Float64, false));
            columns.push(Arc::new(Float64Array::from(generate_trace(
                &time,
                &channel_peaks,
                0.002,
                &mut rng,
            ))));
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), columns)
            .expect("Failed to create RecordBatch");

        let props = WriterProperties::builder()
            .set_key_value_metadata(Some(vec![
                KeyValue::new("Sample Name".to_string(), format!("NPB sample {}", n + 1)),
                KeyValue::new("Method Name".to_string(), "uv-std".to_string()),
                KeyValue::new("Run Name".to_string(), format!("run-{:03}", n + 1)),
            ]))
            .build();

        let path = out_dir.join(format!("sample_{}.parquet", n + 1));
        let file = std::fs::File::create(&path).expect("Failed to create output file");
        let mut writer =
            ArrowWriter::try_new(file, schema, Some(props)).expect("Failed to create writer");
        writer.write(&batch).expect("Failed to write batch");
        writer.close().expect("Failed to close writer");

        println!(
            "Wrote {} (drift {drift:+} s, height x{scale}, {} peaks)",
            path.display(),
            peaks.len()
        );
    }
}
