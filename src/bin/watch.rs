//! Watch mode: monitor a directory for new spreadsheets and process each
//! exactly once.
//!
//! Exit codes: 0 on a clean quit at the startup scan, 2 on invalid
//! configuration, 1 on runtime failure or when the loop is interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;

use sheet2doc::watch::spawn_watcher;
use sheet2doc::{AutoConfirm, Confirm, ConvertError, Reconciler, Settings, StdinConfirm};

#[derive(Parser)]
#[command(
    name = "sheet2doc-watch",
    about = "Process new spreadsheets as they appear in a watched directory"
)]
struct Cli {
    /// Directory to watch (overrides the configured one)
    watch_dir: Option<PathBuf>,

    /// Settings file (defaults to sheet2doc.json if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    println!("{}", "=".repeat(50));
    println!("Excel to Word Table Extractor - File Watcher");
    println!("{}", "=".repeat(50));

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n✗ {}", e);
            if e.is_config() {
                eprintln!("Please fix the configuration errors and try again.");
                eprintln!("Note: the watcher uses the same extraction settings as batch mode.");
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, ConvertError> {
    let settings = Settings::load(cli.config.as_deref())?;

    let watch_dir = match cli.watch_dir {
        Some(dir) => {
            println!("Watch directory overridden: {}", dir.display());
            dir
        }
        None => settings.watch.directory.clone(),
    };

    println!("\nValidating extraction configuration...");
    settings.validate(false)?;
    println!("✓ Configuration valid");

    let confirm: Box<dyn Confirm> = if settings.watch.auto_process {
        Box::new(AutoConfirm)
    } else {
        Box::new(StdinConfirm)
    };

    let mut reconciler = Reconciler::new(&settings, watch_dir.clone(), confirm)?;

    if !reconciler.scan_existing()? {
        println!("Exiting...");
        return Ok(ExitCode::SUCCESS);
    }

    let (tx, rx) = channel();
    let watcher = spawn_watcher(&watch_dir, tx)?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })
    .map_err(|e| ConvertError::Watch(format!("failed to install interrupt handler: {}", e)))?;

    println!("Watching for new Excel files... (Press Ctrl+C to stop)");
    println!("{}", "=".repeat(50));

    reconciler.run(&rx, &stop);

    // halt the notification source before returning
    drop(watcher);
    println!("\nFile watcher stopped.");
    Ok(ExitCode::from(1))
}
