use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Chromatogram, MetadataValue};

/// Name of the time axis in every supported format.
pub const TIME_COLUMN: &str = "time";

/// Key under which the JSON export nests its intensity channels.
const INTENSITIES_KEY: &str = "intensities";

/// Key-value entry the Arrow writer stores in Parquet footers.
const ARROW_SCHEMA_KEY: &str = "ARROW:schema";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a chromatogram from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – instrument export, `{ "time": [...], "intensities": { "254": [...] }, ...meta }`
/// * `.csv`     – header `time,<channel>,...`, one row per time point
/// * `.parquet` – Float columns `time` and one per channel; sample information
///   in the file's key-value metadata
pub fn load_file(path: &Path) -> Result<Chromatogram> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let chromatogram = match ext.as_str() {
        "json" => load_json(path),
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "loaded {}: {} time points, channels [{}]",
        path.display(),
        chromatogram.time.len(),
        chromatogram
            .channels
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(chromatogram)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Chromatogram> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

/// Parse the instrument JSON export:
///
/// ```json
/// {
///   "time": [0.0, 0.1, 0.2, ...],
///   "intensities": { "254": [0.01, 0.02, ...], "280": [...] },
///   "Sample Name": "NPB std",
///   "Method Name": "uv-std",
///   "Run Date": "2021-03-01 10:21"
/// }
/// ```
///
/// Every top-level key other than `time` and `intensities` becomes metadata.
pub fn parse_json(text: &str) -> Result<Chromatogram> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let obj = root
        .as_object()
        .context("Expected top-level JSON object")?;

    let time = json_array_to_f64(obj.get(TIME_COLUMN), TIME_COLUMN)?;

    let intensities = obj
        .get(INTENSITIES_KEY)
        .and_then(|v| v.as_object())
        .context("missing or invalid 'intensities' object")?;

    let mut channels = BTreeMap::new();
    for (name, values) in intensities {
        channels.insert(name.clone(), json_array_to_f64(Some(values), name)?);
    }

    let mut metadata = BTreeMap::new();
    for (key, val) in obj {
        if key == TIME_COLUMN || key == INTENSITIES_KEY {
            continue;
        }
        metadata.insert(key.clone(), json_to_metadata(val));
    }

    Ok(Chromatogram {
        time,
        channels,
        metadata,
    })
}

fn json_array_to_f64(val: Option<&JsonValue>, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("{col}[{j}]: not a number"))
        })
        .collect()
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Chromatogram> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// CSV layout: header row `time,<channel>,<channel>,...`, then one numeric row
/// per time point.  CSV carries no sample information.
pub fn read_csv<R: io::Read>(input: R) -> Result<Chromatogram> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let time_idx = headers
        .iter()
        .position(|h| h == TIME_COLUMN)
        .context("CSV missing 'time' column")?;

    let mut time = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} fields but header has {}",
                record.len(),
                headers.len()
            );
        }
        for (col_idx, tok) in record.iter().enumerate() {
            let value = tok.trim().parse::<f64>().with_context(|| {
                format!("Row {row_no}, {}: '{tok}' is not a number", headers[col_idx])
            })?;
            if col_idx == time_idx {
                time.push(value);
            } else {
                columns[col_idx].push(value);
            }
        }
    }

    let channels = headers
        .into_iter()
        .zip(columns)
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(_, entry)| entry)
        .collect();

    Ok(Chromatogram {
        time,
        channels,
        metadata: BTreeMap::new(),
    })
}

/// Interpret a textual metadata entry.
fn guess_metadata_type(s: &str) -> MetadataValue {
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetadataValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetadataValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one chromatogram.
///
/// Expected schema:
/// - `time`: Float64 (or Float32 / Int) – acquisition time per row
/// - every other numeric column is an intensity channel named after the column
/// - non-numeric columns are ignored
///
/// Sample information ("Sample Name", "Method Name", ...) is read from the
/// file-level key-value metadata.
fn load_parquet(path: &Path) -> Result<Chromatogram> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let mut metadata = BTreeMap::new();
    if let Some(entries) = builder.metadata().file_metadata().key_value_metadata() {
        for entry in entries {
            if entry.key == ARROW_SCHEMA_KEY {
                continue;
            }
            let value = entry
                .value
                .as_deref()
                .map(guess_metadata_type)
                .unwrap_or(MetadataValue::Null);
            metadata.insert(entry.key.clone(), value);
        }
    }

    let reader = builder.build().context("building parquet reader")?;

    let mut time = Vec::new();
    let mut channels: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut saw_time = false;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let time_idx = schema
            .index_of(TIME_COLUMN)
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'time' column"))?;
        saw_time = true;

        for (col_idx, field) in schema.fields().iter().enumerate() {
            let Some(values) = extract_f64_column(batch.column(col_idx)) else {
                log::debug!(
                    "skipping non-numeric parquet column '{}' ({:?})",
                    field.name(),
                    field.data_type()
                );
                continue;
            };
            if col_idx == time_idx {
                time.extend(values);
            } else {
                channels.entry(field.name().clone()).or_default().extend(values);
            }
        }
    }

    if !saw_time {
        bail!("Parquet file contains no record batches");
    }

    Ok(Chromatogram {
        time,
        channels,
        metadata,
    })
}

// -- Parquet / Arrow helpers --

/// Read a numeric column as `f64`; nulls become NaN.  `None` for other types.
fn extract_f64_column(col: &Arc<dyn Array>) -> Option<Vec<f64>> {
    let values = match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>()?;
            arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>()?;
            arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect()
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>()?;
            arr.iter().map(|v| v.map_or(f64::NAN, |i| i as f64)).collect()
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>()?;
            arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect()
        }
        _ => return None,
    };
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_export() {
        let text = r#"{
            "time": [0.0, 0.1, 0.2],
            "intensities": { "254": [0.0, 1.5, 0.0], "280": [0.1, 0.2, 0.1] },
            "Sample Name": "NPB std",
            "Vial": 4
        }"#;
        let c = parse_json(text).unwrap();
        assert_eq!(c.time, vec![0.0, 0.1, 0.2]);
        assert_eq!(c.channels["254"], vec![0.0, 1.5, 0.0]);
        assert_eq!(c.channels.len(), 2);
        assert_eq!(
            c.metadata["Sample Name"],
            MetadataValue::String("NPB std".into())
        );
        assert_eq!(c.metadata["Vial"], MetadataValue::Integer(4));
        assert!(!c.metadata.contains_key("time"));
    }

    #[test]
    fn test_parse_json_rejects_non_numeric() {
        let text = r#"{ "time": [0.0, 0.1], "intensities": { "254": [1.0, "x"] } }"#;
        let err = parse_json(text).unwrap_err();
        assert!(format!("{err:#}").contains("254[1]"));
    }

    #[test]
    fn test_parse_json_requires_intensities() {
        assert!(parse_json(r#"{ "time": [0.0] }"#).is_err());
        assert!(parse_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_parse_json_keeps_channels_of_any_length() {
        let text = r#"{
            "time": [0.0, 0.1, 0.2, 0.3, 0.4],
            "intensities": { "254": [0.0, 1.0, 5.0, 1.0, 0.0], "280": [0.0, 0.0, 0.0, 0.0] }
        }"#;
        let c = parse_json(text).unwrap();
        assert_eq!(c.channels["254"].len(), 5);
        assert_eq!(c.channels["280"].len(), 4);
        assert_eq!(c.signal("254", 6000).unwrap().len(), 5);
    }

    #[test]
    fn test_read_csv() {
        let text = "time,254,280\n0.0,0.5,1.0\n0.1,2.5,1.5\n";
        let c = read_csv(text.as_bytes()).unwrap();
        assert_eq!(c.time, vec![0.0, 0.1]);
        assert_eq!(c.channels["254"], vec![0.5, 2.5]);
        assert_eq!(c.channels["280"], vec![1.0, 1.5]);
        assert!(c.metadata.is_empty());
    }

    #[test]
    fn test_read_csv_without_time() {
        assert!(read_csv("254\n1.0\n".as_bytes()).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("trace.xlsx")).unwrap_err();
        assert!(err.to_string().contains("xlsx"));
    }

    #[test]
    fn test_guess_metadata_type() {
        assert_eq!(guess_metadata_type(""), MetadataValue::Null);
        assert_eq!(guess_metadata_type("12"), MetadataValue::Integer(12));
        assert_eq!(guess_metadata_type("1.5"), MetadataValue::Float(1.5));
        assert_eq!(
            guess_metadata_type("uv-std"),
            MetadataValue::String("uv-std".into())
        );
    }
}
