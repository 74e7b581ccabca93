//! Spreadsheet-friendly export of accepted mappings.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::types::MappingResult;

const HEADER: [&str; 6] = [
    "Legacy Table",
    "Legacy Column",
    "Modern Table",
    "Modern Column",
    "Confidence",
    "Reasoning",
];

/// Write `mappings` as CSV, one row each, header first
pub fn write_csv<W: Write>(writer: W, mappings: &[MappingResult]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(HEADER)?;
    for m in mappings {
        let confidence = format!("{:.2}", m.confidence_score);
        writer.write_record([
            m.legacy_table.as_str(),
            m.legacy_column.as_str(),
            m.modern_table.as_str(),
            m.modern_column.as_str(),
            confidence.as_str(),
            m.reasoning.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Export mappings to a CSV file at `output_path`
pub fn export_csv(output_path: &Path, mappings: &[MappingResult]) -> Result<()> {
    let file = File::create(output_path)?;
    write_csv(file, mappings)?;
    debug!(path = %output_path.display(), rows = mappings.len(), "exported mappings");
    Ok(())
}
