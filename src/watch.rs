//! Directory watching and file-arrival reconciliation.
//!
//! Filesystem notifications (plus an initial directory scan) are turned into
//! exactly-once extraction/render invocations. Notifications arrive as a
//! tagged event on a single channel and are handled one at a time by one
//! reconciliation loop; the in-progress registry is the only shared state
//! and presence in it is an exclusive claim on a path.

use notify::event::{ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::config::Settings;
use crate::error::{ConvertError, Result};
use crate::extract;
use crate::render::{self, RenderOptions};

/// Filesystem change notification, normalized from the watcher backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Moved {
        from: Option<PathBuf>,
        to: PathBuf,
    },
}

/// Operator decision for the startup scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDecision {
    Process,
    Skip,
    Quit,
}

/// Pluggable confirmation strategy for offering detected files to the
/// operator. The default is non-interactive auto-yes for headless runs.
pub trait Confirm {
    fn confirm_file(&mut self, path: &Path) -> bool;
    fn confirm_batch(&mut self, files: &[PathBuf]) -> ScanDecision;
}

/// Non-interactive strategy: process everything
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm_file(&mut self, _path: &Path) -> bool {
        true
    }

    fn confirm_batch(&mut self, _files: &[PathBuf]) -> ScanDecision {
        ScanDecision::Process
    }
}

/// Interactive strategy prompting on stdin
pub struct StdinConfirm;

impl StdinConfirm {
    fn prompt(message: &str) -> String {
        print!("{}", message);
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return String::new();
        }
        line.trim().to_lowercase()
    }
}

impl Confirm for StdinConfirm {
    fn confirm_file(&mut self, _path: &Path) -> bool {
        Self::prompt("Process this file? (y/n): ") == "y"
    }

    fn confirm_batch(&mut self, _files: &[PathBuf]) -> ScanDecision {
        match Self::prompt("\nProcess existing files? (y/n/q to quit): ").as_str() {
            "y" => ScanDecision::Process,
            "q" => ScanDecision::Quit,
            _ => ScanDecision::Skip,
        }
    }
}

/// File-name prefix of transient editor lock artifacts, never real data
const LOCK_FILE_PREFIX: &str = "~$";

/// Wait after claiming a path before re-checking it still exists, to
/// tolerate editors that save via delete+recreate or multiple writes
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Wait before extraction to reduce the chance of reading a file mid-write
/// (best effort; the extractor's read-failure handling is the backstop)
const STABILITY_DELAY: Duration = Duration::from_secs(1);

/// The reconciliation loop: tracks claimed paths, runs the extraction and
/// render pipeline per file and relocates processed sources.
pub struct Reconciler<'a> {
    settings: &'a Settings,
    watch_dir: PathBuf,
    output_dir: PathBuf,
    processed_dir: Option<PathBuf>,
    patterns: Vec<glob::Pattern>,
    in_progress: HashSet<PathBuf>,
    confirm: Box<dyn Confirm>,
    settle_delay: Duration,
    stability_delay: Duration,
}

impl<'a> Reconciler<'a> {
    /// Build a reconciler for the given watch directory, creating the
    /// output and processed directories if missing.
    pub fn new(
        settings: &'a Settings,
        watch_dir: PathBuf,
        confirm: Box<dyn Confirm>,
    ) -> Result<Reconciler<'a>> {
        let mut patterns = Vec::new();
        for pattern in &settings.watch.patterns {
            patterns.push(glob::Pattern::new(pattern).map_err(|e| {
                ConvertError::Config(format!("  - Invalid file pattern '{}': {}", pattern, e))
            })?);
        }

        let output_dir = settings.watch.output_directory.clone();
        fs::create_dir_all(&output_dir)?;

        let processed_dir = settings.watch.processed_directory.clone();
        if let Some(dir) = &processed_dir {
            fs::create_dir_all(dir)?;
        }

        println!("Watching directory: {}", watch_dir.display());
        println!("Output directory: {}", output_dir.display());
        if let Some(dir) = &processed_dir {
            println!("Processed files directory: {}", dir.display());
        }
        println!("File patterns: {}", settings.watch.patterns.join(", "));
        println!("{}", "-".repeat(50));

        Ok(Reconciler {
            settings,
            watch_dir,
            output_dir,
            processed_dir,
            patterns,
            in_progress: HashSet::new(),
            confirm,
            settle_delay: SETTLE_DELAY,
            stability_delay: STABILITY_DELAY,
        })
    }

    /// Override the settle and stability delays (used by tests)
    pub fn with_delays(mut self, settle: Duration, stability: Duration) -> Reconciler<'a> {
        self.settle_delay = settle;
        self.stability_delay = stability;
        self
    }

    /// A path is eligible when its name matches a configured pattern and is
    /// not an editor lock artifact.
    pub fn matches(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        if name.starts_with(LOCK_FILE_PREFIX) {
            return false;
        }
        self.patterns.iter().any(|p| p.matches(name))
    }

    /// Scan the watch directory for files present before the loop starts and
    /// offer them to the operator. Returns false if the operator quit.
    pub fn scan_existing(&mut self) -> Result<bool> {
        let mut existing: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(&self.watch_dir)? {
            let path = entry?.path();
            if path.is_file() && self.matches(&path) {
                existing.push(path);
            }
        }
        existing.sort();

        if existing.is_empty() {
            return Ok(true);
        }

        println!(
            "\nFound {} existing Excel file(s) in watch directory:",
            existing.len()
        );
        for (i, file) in existing.iter().enumerate() {
            println!(
                "  {}. {}",
                i + 1,
                file.file_name().unwrap_or_default().to_string_lossy()
            );
        }

        match self.confirm.confirm_batch(&existing) {
            ScanDecision::Quit => Ok(false),
            ScanDecision::Skip => Ok(true),
            ScanDecision::Process => {
                for file in &existing {
                    self.process_path(file);
                }
                println!("\n{}", "=".repeat(50));
                Ok(true)
            }
        }
    }

    /// Consume events until the channel closes or `stop` is raised. Any
    /// in-flight file finishes before this returns.
    pub fn run(&mut self, rx: &Receiver<FileEvent>, stop: &AtomicBool) {
        loop {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Dispatch one notification. Created, modified and moved-in paths are
    /// handled uniformly; the settle re-check inside the pipeline covers
    /// every notification kind.
    pub fn handle_event(&mut self, event: FileEvent) {
        match event {
            FileEvent::Created(path) | FileEvent::Modified(path) => self.process_path(&path),
            FileEvent::Moved { from, to } => {
                if let Some(from) = from {
                    println!(
                        "File moved into watch directory: {} -> {}",
                        from.display(),
                        to.display()
                    );
                }
                self.process_path(&to);
            }
        }
    }

    /// Claim a path and run the pipeline on it. Duplicate notifications for
    /// a path that is already in progress are ignored; the claim is released
    /// when the pipeline returns, on success and failure alike.
    pub fn process_path(&mut self, path: &Path) {
        if !self.matches(path) {
            return;
        }
        if !self.in_progress.insert(path.to_path_buf()) {
            return;
        }

        let name = path.file_name().unwrap_or_default().to_string_lossy().to_string();
        if let Err(e) = self.run_pipeline(path) {
            eprintln!("✗ Error processing {}: {}", name, e);
        }

        self.in_progress.remove(path);
    }

    /// The per-file pipeline: settle, re-check, extract, render, relocate.
    /// Returns Ok(None) when the file vanished or the operator declined.
    fn run_pipeline(&mut self, path: &Path) -> Result<Option<PathBuf>> {
        thread::sleep(self.settle_delay);
        if !path.exists() {
            // delete+recreate save pattern, or already relocated
            return Ok(None);
        }

        let name = path.file_name().unwrap_or_default().to_string_lossy().to_string();
        println!(
            "\n[{}] New Excel file detected: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            name
        );

        if !self.settings.watch.auto_process && !self.confirm.confirm_file(path) {
            println!("Skipping file.");
            return Ok(None);
        }

        let token = timestamp_token();
        let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
        let output_name = format!("{}_{}.docx", stem, token);
        let output_path = self.output_dir.join(&output_name);
        println!("Processing: {} -> {}", name, output_name);

        thread::sleep(self.stability_delay);

        let request = self.settings.request_for(path)?;
        let extraction = extract::extract(&request)?;
        for warning in &extraction.warnings {
            eprintln!("Warning: {}", warning);
        }
        println!(
            "✓ Extracted {} rows with {} columns",
            extraction.grid.row_count(),
            extraction.grid.col_count()
        );

        let title = format!("{} - {}", self.settings.document_title, stem);
        let options = RenderOptions::from_settings(self.settings, title, path);
        render::render(&extraction.grid, &output_path, &options)?;
        println!("✓ Created Word document: {}", output_name);

        if let Some(processed_dir) = &self.processed_dir {
            let processed_name = match path.extension().and_then(|e| e.to_str()) {
                Some(ext) => format!("{}_{}.{}", stem, token, ext),
                None => format!("{}_{}", stem, token),
            };
            let processed_path = processed_dir.join(&processed_name);
            // relocation failure is a warning, never a pipeline failure
            match fs::rename(path, &processed_path) {
                Ok(()) => println!("✓ Moved processed file to: {}", processed_name),
                Err(e) => eprintln!("Warning: Could not move file: {}", e),
            }
        }

        Ok(Some(output_path))
    }
}

/// Start the notification backend on `dir`, forwarding normalized events to
/// `tx`. The returned watcher must stay alive for events to flow; dropping
/// it halts the notification source.
pub fn spawn_watcher(dir: &Path, tx: Sender<FileEvent>) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                for file_event in map_event(&event) {
                    let _ = tx.send(file_event);
                }
            }
        },
        NotifyConfig::default(),
    )
    .map_err(|e| ConvertError::Watch(format!("failed to create watcher: {}", e)))?;

    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| ConvertError::Watch(format!("failed to watch '{}': {}", dir.display(), e)))?;

    Ok(watcher)
}

/// Normalize a backend notification into pipeline events. Removals and
/// rename sources are dropped; only paths that may now hold data matter.
fn map_event(event: &Event) -> Vec<FileEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.iter().cloned().map(FileEvent::Created).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if event.paths.len() >= 2 {
                vec![FileEvent::Moved {
                    from: Some(event.paths[0].clone()),
                    to: event.paths[1].clone(),
                }]
            } else {
                event
                    .paths
                    .iter()
                    .cloned()
                    .map(|to| FileEvent::Moved { from: None, to })
                    .collect()
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => event
            .paths
            .iter()
            .cloned()
            .map(|to| FileEvent::Moved { from: None, to })
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Vec::new(),
        EventKind::Modify(_) => event.paths.iter().cloned().map(FileEvent::Modified).collect(),
        _ => Vec::new(),
    }
}

/// Collision-resistant name token for output and relocated files
pub fn timestamp_token() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
