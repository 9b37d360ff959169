use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::analysis::table::MetricsTable;

// ---------------------------------------------------------------------------
// Reference persistence
// ---------------------------------------------------------------------------

/// Serialize a reference table to JSON.  Values round-trip exactly.
pub fn reference_to_string(table: &MetricsTable) -> Result<String> {
    serde_json::to_string_pretty(table).context("serializing reference table")
}

/// Parse a reference table previously written by [`reference_to_string`].
///
/// Tables whose rows are missing, out of order or ragged are rejected.
pub fn reference_from_str(text: &str) -> Result<MetricsTable> {
    serde_json::from_str(text).context("parsing reference table")
}

pub fn save_reference(path: &Path, table: &MetricsTable) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating reference file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, table).context("writing reference table")?;
    writer.flush().context("flushing reference table")?;
    log::info!(
        "saved reference with {} peaks to {}",
        table.peak_count(),
        path.display()
    );
    Ok(())
}

pub fn load_reference(path: &Path) -> Result<MetricsTable> {
    let file = File::open(path)
        .with_context(|| format!("opening reference file {}", path.display()))?;
    let table: MetricsTable = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing reference file {}", path.display()))?;
    log::info!(
        "loaded reference with {} peaks from {}",
        table.peak_count(),
        path.display()
    );
    Ok(table)
}
