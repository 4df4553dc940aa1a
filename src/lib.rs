//! sheet2doc: extract a cell range from a spreadsheet and render it as a
//! formatted table in a Word document.
//!
//! Two modes share one pipeline:
//! - batch: validate settings, extract once, render, report
//! - watch: reconcile filesystem notifications for a monitored directory
//!   into exactly-once extraction/render runs, relocating processed files

pub mod batch;
pub mod column;
pub mod config;
pub mod docx;
pub mod error;
pub mod extract;
pub mod render;
pub mod watch;

// Re-export commonly used types and functions
pub use config::Settings;
pub use error::{ConvertError, Result};
pub use extract::{extract, CellGrid, Extraction, ExtractionRequest};
pub use render::{render, RenderOptions};
pub use watch::{AutoConfirm, Confirm, FileEvent, Reconciler, ScanDecision, StdinConfirm};
