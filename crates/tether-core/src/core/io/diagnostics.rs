use serde::Serialize;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("CSV error: {0}")]
    Stream(#[from] csv::Error),
}

/// Writes serializable rows (one per frame) as CSV with a header line.
pub fn write_rows<T: Serialize>(rows: &[T], writer: impl Write) -> Result<(), DiagnosticsError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_rows_to_path<T: Serialize>(rows: &[T], path: &Path) -> Result<(), DiagnosticsError> {
    let to_err = |source: csv::Error| DiagnosticsError::Csv {
        path: path.to_string_lossy().to_string(),
        source,
    };
    let mut csv_writer = csv::Writer::from_path(path).map_err(to_err)?;
    for row in rows {
        csv_writer.serialize(row).map_err(to_err)?;
    }
    csv_writer
        .flush()
        .map_err(|e| to_err(csv::Error::from(e)))?;
    Ok(())
}
