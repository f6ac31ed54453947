use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the production-time dashboard.
#[derive(Error, Debug)]
pub enum TiemposError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A spreadsheet could not be opened or one of its sheets parsed.
    #[error("Failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// A required section is missing from the report workbook.
    #[error("Sheet '{sheet}' not found in {path}")]
    MissingSheet { path: PathBuf, sheet: String },

    /// The ingestion pipeline produced no rows at all.
    #[error("No data loaded from {0}")]
    EmptyDataset(PathBuf),

    /// The expected data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// The report workbook could not be written.
    #[error("Failed to write report {path}: {message}")]
    ReportWrite { path: PathBuf, message: String },

    /// No cached report is available and the artifact could not be loaded.
    #[error("Report database not available at {path}: {reason}")]
    ReportUnavailable { path: PathBuf, reason: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, TiemposError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = TiemposError::FileRead {
            path: PathBuf::from("/data/List (2024-01-15).xlsx"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("List (2024-01-15).xlsx"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_sheet() {
        let err = TiemposError::MissingSheet {
            path: PathBuf::from("report.xlsx"),
            sheet: "Rankings".to_string(),
        };
        assert_eq!(err.to_string(), "Sheet 'Rankings' not found in report.xlsx");
    }

    #[test]
    fn test_error_display_empty_dataset() {
        let err = TiemposError::EmptyDataset(PathBuf::from("/empty/dir"));
        assert_eq!(err.to_string(), "No data loaded from /empty/dir");
    }

    #[test]
    fn test_error_display_data_path_not_found() {
        let err = TiemposError::DataPathNotFound(PathBuf::from("/missing/dir"));
        assert_eq!(err.to_string(), "Data path not found: /missing/dir");
    }

    #[test]
    fn test_error_display_report_unavailable() {
        let err = TiemposError::ReportUnavailable {
            path: PathBuf::from("report.xlsx"),
            reason: "file not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("report.xlsx"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_error_display_config() {
        let err = TiemposError::Config("port out of range".to_string());
        assert_eq!(err.to_string(), "Configuration error: port out of range");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TiemposError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_anyhow() {
        let err: TiemposError = anyhow::anyhow!("zip archive corrupted").into();
        assert_eq!(err.to_string(), "zip archive corrupted");
    }
}
