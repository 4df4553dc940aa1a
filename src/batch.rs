//! One-shot orchestration: Validate -> Extract -> Render -> Report.
//!
//! Each stage is a hard gate; the first failure aborts the run and no
//! partial output is produced.

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::Result;
use crate::extract::{self, CellGrid};
use crate::render::{self, RenderOptions};

/// Run the batch pipeline. On success returns the output document path.
pub fn run(settings: &Settings) -> Result<PathBuf> {
    println!("{}", "=".repeat(50));
    println!("Excel to Word Table Extractor");
    println!("{}", "=".repeat(50));
    println!("Input file: {}", settings.excel_file.display());
    println!(
        "Sheet: {}",
        settings.sheet_name.as_deref().unwrap_or("First sheet")
    );
    println!("Range: {}", settings.range_description());
    println!("Output: {}", settings.output_file.display());
    println!("{}", "-".repeat(50));

    settings.validate(true)?;

    println!("\nExtracting data from Excel...");
    let request = settings.request_for(&settings.excel_file)?;
    let extraction = extract::extract(&request)?;
    for warning in &extraction.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!(
        "✓ Successfully extracted {} rows with {} columns from sheet '{}'.",
        extraction.grid.row_count(),
        extraction.grid.col_count(),
        extraction.sheet_used
    );
    print_preview(&extraction.grid);

    println!("\nCreating Word document...");
    let options = RenderOptions::from_settings(
        settings,
        settings.document_title.clone(),
        &settings.excel_file,
    );
    render::render(&extraction.grid, &settings.output_file, &options)?;

    let output = settings
        .output_file
        .canonicalize()
        .unwrap_or_else(|_| settings.output_file.clone());
    println!("✓ Word document saved as: {}", output.display());
    Ok(output)
}

/// Print up to the first 5 rows, cells truncated at 20 characters.
fn print_preview(grid: &CellGrid) {
    if grid.is_empty() {
        return;
    }
    println!("\nPreview of extracted data (first 5 rows):");
    println!("{}", "-".repeat(50));
    for (i, row) in grid.rows().iter().take(5).enumerate() {
        let preview = row
            .iter()
            .map(|cell| truncate(cell, 20))
            .collect::<Vec<_>>()
            .join(" | ");
        println!("Row {}: {}", i + 1, preview);
    }
    if grid.row_count() > 5 {
        println!("... and {} more rows", grid.row_count() - 5);
    }
}

fn truncate(cell: &str, max_chars: usize) -> String {
    if cell.chars().count() > max_chars {
        let head: String = cell.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        cell.to_string()
    }
}
