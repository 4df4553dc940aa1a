//! Static settings for the extraction pipeline.
//!
//! Settings are loaded once at startup (from a JSON file, or built-in
//! defaults) and passed by reference to the batch runner and the watch
//! reconciler. There is no process-wide mutable configuration state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::column::column_letter_to_index;
use crate::error::{ConvertError, Result};
use crate::extract::ExtractionRequest;

/// Default settings file looked up next to the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "sheet2doc.json";

/// Extraction and formatting settings, mirroring the tool's config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the input spreadsheet (batch mode)
    pub excel_file: PathBuf,
    /// Sheet to read; None means the workbook's first sheet
    pub sheet_name: Option<String>,
    /// 1-based inclusive row range
    pub start_row: u32,
    pub end_row: u32,
    /// Column letters, inclusive ("A".."E")
    pub start_col: String,
    pub end_col: String,
    /// Output document path (batch mode)
    pub output_file: PathBuf,
    /// Title rendered at the top of the document
    pub document_title: String,
    /// Word table style name
    pub table_style: String,
    /// Auto-fit table width to content
    pub auto_fit: bool,
    /// Center the table in the document
    pub center_table: bool,
    /// Treat the first extracted row as a header (bold + shaded)
    pub first_row_is_header: bool,
    /// Watch-mode settings
    pub watch: WatchSettings,
}

/// Settings specific to the directory watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Directory monitored for new spreadsheets
    pub directory: PathBuf,
    /// Directory where rendered documents are written
    pub output_directory: PathBuf,
    /// Where processed spreadsheets are relocated; None leaves them in place
    pub processed_directory: Option<PathBuf>,
    /// Process detected files without prompting
    pub auto_process: bool,
    /// File name patterns considered for processing
    pub patterns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            excel_file: PathBuf::from("excel-data/data.xlsx"),
            sheet_name: None,
            start_row: 1,
            end_row: 10,
            start_col: "A".to_string(),
            end_col: "E".to_string(),
            output_file: PathBuf::from("docx-output/extracted_data.docx"),
            document_title: "Extracted Excel Data".to_string(),
            table_style: "Table Grid".to_string(),
            auto_fit: true,
            center_table: true,
            first_row_is_header: true,
            watch: WatchSettings::default(),
        }
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        WatchSettings {
            directory: PathBuf::from("./excel-data"),
            output_directory: PathBuf::from("./docx-output"),
            processed_directory: Some(PathBuf::from("./excel-data/processed")),
            auto_process: true,
            patterns: vec![
                "*.xlsx".to_string(),
                "*.xls".to_string(),
                "*.xlsm".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Load settings from an explicit file, or from `sheet2doc.json` if it
    /// exists, or fall back to the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConvertError::Config(format!(
                        "  - Settings file '{}' not found",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => {
                let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if !default.exists() {
                    return Ok(Settings::default());
                }
                default
            }
        };

        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents).map_err(|e| {
            ConvertError::Config(format!("  - Invalid settings file '{}': {}", path.display(), e))
        })
    }

    /// Validate the extraction settings, collecting every problem before
    /// failing. Creates the output file's parent directory as a side effect.
    /// `require_input` is set in batch mode, where the configured input file
    /// must already exist; the watcher processes files as they arrive.
    pub fn validate(&self, require_input: bool) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if require_input && !self.excel_file.exists() {
            errors.push(format!(
                "Excel file '{}' not found",
                self.excel_file.display()
            ));
        }

        if self.start_row < 1 {
            errors.push("start_row must be at least 1".to_string());
        }
        if self.end_row < self.start_row {
            errors.push("end_row must be greater than or equal to start_row".to_string());
        }

        match (
            column_letter_to_index(&self.start_col),
            column_letter_to_index(&self.end_col),
        ) {
            (Ok(start), Ok(end)) => {
                if end < start {
                    errors.push(format!(
                        "end_col ({}) must be after or equal to start_col ({})",
                        self.end_col, self.start_col
                    ));
                }
            }
            _ => {
                errors.push(
                    "start_col and end_col must be valid column letters (A, B, C, etc.)"
                        .to_string(),
                );
            }
        }

        if let Some(output_dir) = self.output_file.parent() {
            if !output_dir.as_os_str().is_empty() && !output_dir.exists() {
                if let Err(e) = fs::create_dir_all(output_dir) {
                    errors.push(format!(
                        "Failed to create output directory '{}': {}",
                        output_dir.display(),
                        e
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConvertError::Config(
                errors
                    .iter()
                    .map(|e| format!("  - {}", e))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ))
        }
    }

    /// Build an extraction request for the given input path using the
    /// configured ranges. Assumes `validate` already passed.
    pub fn request_for(&self, path: &Path) -> Result<ExtractionRequest> {
        Ok(ExtractionRequest {
            path: path.to_path_buf(),
            sheet: self.sheet_name.clone(),
            start_row: self.start_row,
            end_row: self.end_row,
            start_col: column_letter_to_index(&self.start_col)?,
            end_col: column_letter_to_index(&self.end_col)?,
        })
    }

    /// Human-readable description of the configured range, shown in the
    /// document metadata block and console summaries.
    pub fn range_description(&self) -> String {
        format!(
            "Rows {}-{}, Columns {}-{}",
            self.start_row, self.end_row, self.start_col, self.end_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writable_settings(dir: &Path) -> Settings {
        Settings {
            output_file: dir.join("out/extracted.docx"),
            ..Settings::default()
        }
    }

    #[test]
    fn test_defaults_validate_without_input() {
        let dir = tempfile::tempdir().unwrap();
        let settings = writable_settings(dir.path());
        assert!(settings.validate(false).is_ok());
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    fn test_missing_input_fails_in_batch_mode() {
        let dir = tempfile::tempdir().unwrap();
        let settings = writable_settings(dir.path());
        let err = settings.validate(true).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_inverted_ranges_collected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            start_row: 5,
            end_row: 2,
            start_col: "E".to_string(),
            end_col: "A".to_string(),
            ..writable_settings(dir.path())
        };
        let message = settings.validate(false).unwrap_err().to_string();
        assert!(message.contains("end_row"));
        assert!(message.contains("end_col"));
    }

    #[test]
    fn test_bad_column_letters() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            start_col: "1".to_string(),
            ..writable_settings(dir.path())
        };
        let message = settings.validate(false).unwrap_err().to_string();
        assert!(message.contains("column letters"));
    }

    #[test]
    fn test_load_missing_explicit_file_is_config_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/settings.json"))).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"start_row": 3, "end_col": "C"}"#).unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.start_row, 3);
        assert_eq!(settings.end_col, "C");
        assert_eq!(settings.end_row, 10);
        assert_eq!(settings.table_style, "Table Grid");
    }

    #[test]
    fn test_request_for_converts_columns() {
        let settings = Settings::default();
        let request = settings.request_for(Path::new("a.xlsx")).unwrap();
        assert_eq!(request.start_col, 1);
        assert_eq!(request.end_col, 5);
        assert_eq!(request.start_row, 1);
        assert_eq!(request.end_row, 10);
    }
}
