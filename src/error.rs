//! Error types for the extraction and rendering pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Main error type for all extraction and rendering operations
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Invalid settings, reported before any processing starts
    #[error("Configuration error:\n{0}")]
    Config(String),

    /// Input spreadsheet does not exist
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Read or write denied, typically because another program holds the file
    #[error("Permission denied to {action} '{}'. Please ensure the file is not open in another program.", .path.display())]
    PermissionDenied { path: PathBuf, action: &'static str },

    /// Named sheet missing from the workbook
    #[error("Sheet '{sheet}' not found. Available sheets: {available}")]
    SheetNotFound { sheet: String, available: String },

    /// Workbook content could not be parsed
    #[error("Cannot read spreadsheet '{}': {reason}", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// Column reference was not a letter sequence like "A" or "AB"
    #[error("Invalid column reference '{0}': expected letters A-Z")]
    InvalidColumn(String),

    /// Extracted range resolved to zero rows or zero columns
    #[error("No data to export: the extracted range is empty")]
    EmptyData,

    /// Requested table style is not one the document writer defines
    #[error("Unknown table style '{style}'. Supported styles: {supported}")]
    StyleNotFound { style: String, supported: String },

    /// Filesystem notification source failed
    #[error("File watcher error: {0}")]
    Watch(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP container error while writing the document package
    #[error("Failed to write document package: {0}")]
    Package(String),
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(err: zip::result::ZipError) -> Self {
        ConvertError::Package(err.to_string())
    }
}

impl ConvertError {
    /// True for errors the batch runner should report as invalid configuration
    /// rather than a runtime failure (distinct exit codes for scripting).
    pub fn is_config(&self) -> bool {
        matches!(self, ConvertError::Config(_))
    }
}
