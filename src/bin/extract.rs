//! Batch mode: extract the configured range once and write the document.
//!
//! Exit codes: 0 success, 2 invalid configuration, 1 runtime failure.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use sheet2doc::{batch, Settings};

#[derive(Parser)]
#[command(name = "sheet2doc", about = "Extract a spreadsheet range into a Word table")]
struct Cli {
    /// Settings file (defaults to sheet2doc.json if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    match batch::run(&settings) {
        Ok(_) => {
            println!("\n✓ Export completed successfully!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\n✗ {}", e);
            if e.is_config() {
                eprintln!("Please fix the configuration errors and try again.");
                ExitCode::from(2)
            } else {
                eprintln!("Export failed.");
                ExitCode::from(1)
            }
        }
    }
}
