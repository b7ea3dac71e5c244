use std::path::Path;

use anyhow::{Context, Result};

use super::model::{CellValue, Table};

/// File name offered when saving the filtered table.
pub const SUGGESTED_FILE_NAME: &str = "gestion_hospitalaria_datos_filtrados.csv";

/// Serialize `table` as UTF-8, comma-separated text with a header row.
/// Nulls are written as empty fields.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.columns())
        .context("writing CSV header")?;

    for (row_no, row) in table.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(export_field))
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV buffer: {}", e.error()))
}

fn export_field(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        other => other.label(),
    }
}

/// Write the CSV export of `table` to `path`.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let bytes = to_csv_bytes(table)?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} rows to {}", table.len(), path.display());
    Ok(())
}
