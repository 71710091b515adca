//! Batch runner
//!
//! Drives one run: validate paths, scan, transform every categorized file,
//! copy passthrough files, then produce the terminal event. Files are
//! processed one at a time so progress is deterministic; a failing file is
//! counted and reported, never fatal.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use webobf_core::{
    default_output_path, join_relative, relative_to, same_path, scan_and_classify, Category,
    FileEntry, FileSet, LevelSource, ObfuscateError, RunConfig, Transform,
};

use crate::protocol::{Envelope, Event, Message, StartArgs};
use crate::tracker::CompletionTracker;

/// Worker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Scanning,
    Processing,
    Terminated,
}

/// Sending half of the worker's event stream
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: &Event) {
        if self.tx.send(Envelope::encode(event)).is_err() {
            tracing::debug!("Orchestrator gone, dropping {} event", event.name());
        }
    }

    pub fn progress(&self, percent: u8, text: impl Into<String>) {
        self.send(&Event::progress(percent, text));
    }
}

/// Validated inputs of a run
#[derive(Debug, Clone)]
struct RunPlan {
    source: PathBuf,
    output: PathBuf,
    level: String,
    levels: LevelSource,
    config: RunConfig,
}

/// Executes one start command
pub struct BatchRunner {
    args: StartArgs,
    sink: EventSink,
    state: WorkerState,
}

impl BatchRunner {
    pub fn new(args: StartArgs, sink: EventSink) -> Self {
        Self {
            args,
            sink,
            state: WorkerState::Idle,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Run to completion, emitting progress, and return the terminal event
    ///
    /// The terminal event is returned rather than sent so the caller controls
    /// teardown ordering.
    pub async fn run(&mut self) -> Event {
        self.sink.progress(0, "Obfuscating...");

        let plan = match self.plan() {
            Ok(plan) => plan,
            Err(e) => return self.fatal(e, None),
        };
        tracing::info!(
            "Obfuscating {:?} -> {:?} (level {})",
            plan.source,
            plan.output,
            plan.level
        );

        self.state = WorkerState::Scanning;
        self.sink.progress(0, "Scanning files...");
        let files = match self.scan(&plan).await {
            Ok(files) => files,
            Err(e) => return self.fatal(e, None),
        };

        if let Err(e) = recreate_dir(&plan.output).await {
            return self.fatal(e, None);
        }

        self.state = WorkerState::Processing;
        let mut tracker = CompletionTracker::new(files.total());

        for category in Category::TRANSFORMED {
            if let Err(e) = self.process_category(&plan, &files, category, &mut tracker).await {
                return self.fatal(e, Some(&mut tracker));
            }
        }
        self.copy_passthrough(&plan, files.get(Category::Passthrough), &mut tracker)
            .await;

        let counters = tracker.counters();
        let terminal = tracker.complete().or_else(|| {
            tracker.abort(format!(
                "{} of {} files unaccounted",
                counters.total_files - counters.accounted(),
                counters.total_files
            ))
        });
        self.state = WorkerState::Terminated;
        match terminal {
            Some(event) => {
                tracing::info!(
                    "Run finished: {} succeeded, {} failed",
                    counters.success_count,
                    counters.fail_count
                );
                event
            }
            None => Event::fail("run already reported"),
        }
    }

    fn fatal(&mut self, error: ObfuscateError, tracker: Option<&mut CompletionTracker>) -> Event {
        tracing::error!("Run aborted: {}", error);
        self.state = WorkerState::Terminated;
        let message = error.describe();
        match tracker {
            Some(tracker) => tracker
                .abort(message.clone())
                .unwrap_or_else(|| Event::fail(message)),
            None => Event::fail(message),
        }
    }

    /// Check preconditions; nothing on disk is touched here
    fn plan(&self) -> Result<RunPlan, ObfuscateError> {
        let source = PathBuf::from(&self.args.source);
        if !source.is_dir() {
            return Err(ObfuscateError::SourceNotFound(source));
        }
        let output = match self.args.output.as_deref() {
            Some(output) if !output.is_empty() => PathBuf::from(output),
            _ => default_output_path(&source),
        };
        // The output root is wiped, so it must not be or contain the source
        if same_path(&source, &output) || relative_to(&output, &source).is_some() {
            return Err(ObfuscateError::InvalidOutputPath(output));
        }

        let config = RunConfig::discover(&source, self.args.config.as_deref().map(Path::new))?;
        // Validate category names up front so a typo fails before any writes
        config.skipped()?;

        Ok(RunPlan {
            source,
            output,
            level: self.args.level.clone(),
            levels: LevelSource::discover(self.args.config_dir.as_ref().map(PathBuf::from)),
            config,
        })
    }

    async fn scan(&self, plan: &RunPlan) -> Result<FileSet, ObfuscateError> {
        let source = plan.source.clone();
        let output = plan.output.clone();
        let config = plan.config.clone();
        let mut files = tokio::task::spawn_blocking(move || {
            scan_and_classify(&source, &config, Some(&output))
        })
        .await
        .map_err(|e| ObfuscateError::Io(std::io::Error::other(e)))??;

        for category in plan.config.skipped()? {
            files.demote(category);
        }
        for category in Category::TRANSFORMED {
            tracing::debug!("{}: {} files", category, files.get(category).len());
        }
        tracing::info!(
            "Found {} files ({} passthrough)",
            files.total(),
            files.get(Category::Passthrough).len()
        );
        Ok(files)
    }

    /// Transform every file of one category. Only run-fatal errors are returned.
    async fn process_category(
        &self,
        plan: &RunPlan,
        files: &FileSet,
        category: Category,
        tracker: &mut CompletionTracker,
    ) -> Result<(), ObfuscateError> {
        let entries = files.get(category);
        self.sink.progress(
            tracker.percent(),
            format!("Find {} {} files", entries.len(), category.label()),
        );
        if entries.is_empty() {
            return Ok(());
        }

        let transform = match Transform::for_category(category, &plan.levels, &plan.level) {
            Ok(transform) => transform,
            Err(e) if e.is_run_fatal() => return Err(e),
            Err(e) => {
                // Options could not be loaded: every file of the batch fails
                tracing::error!("{}", e);
                for _ in entries {
                    tracker.record_failure();
                }
                self.sink.progress(
                    tracker.percent(),
                    format!("Obfuscate {} files failed: {}", category.label(), e),
                );
                return Ok(());
            }
        };

        for entry in entries {
            self.sink
                .progress(tracker.percent(), format!("Obfuscating {}", entry.path));
            match transform_file(&transform, plan, entry).await {
                Ok(()) => tracker.record_success(),
                Err(e) => {
                    tracing::warn!("Obfuscate {} failed: {}", entry.path, e);
                    tracker.record_failure();
                    self.sink.progress(
                        tracker.percent(),
                        format!("Obfuscate {} failed: {}", entry.path, e),
                    );
                }
            }
        }
        Ok(())
    }

    /// Copy files byte for byte, awaiting each copy before the next
    async fn copy_passthrough(
        &self,
        plan: &RunPlan,
        entries: &[FileEntry],
        tracker: &mut CompletionTracker,
    ) {
        for entry in entries {
            self.sink
                .progress(tracker.percent(), format!("Copying {}", entry.path));
            match copy_file(plan, entry).await {
                Ok(()) => tracker.record_success(),
                Err(e) => {
                    tracing::warn!("Copy {} failed: {}", entry.path, e);
                    tracker.record_failure();
                    self.sink.progress(
                        tracker.percent(),
                        format!("Copy {} failed: {}", entry.path, e),
                    );
                }
            }
        }
    }
}

/// Delete `dir` if present and create it empty
async fn recreate_dir(dir: &Path) -> Result<(), ObfuscateError> {
    if tokio::fs::try_exists(dir).await? {
        tracing::debug!("Removing previous output {:?}", dir);
        if tokio::fs::metadata(dir).await?.is_dir() {
            tokio::fs::remove_dir_all(dir).await?;
        } else {
            tokio::fs::remove_file(dir).await?;
        }
    }
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Read, transform and write a single file
async fn transform_file(
    transform: &Transform,
    plan: &RunPlan,
    entry: &FileEntry,
) -> Result<(), ObfuscateError> {
    let io_err = |e: std::io::Error| ObfuscateError::transform(entry.path.clone(), e);
    let source_path = join_relative(&plan.source, &entry.path);
    let output_path = join_relative(&plan.output, &entry.path);

    let content = tokio::fs::read(&source_path).await.map_err(io_err)?;

    // CPU-bound; a panicking transform fails this file only
    let transform = transform.clone();
    let task_path = entry.path.clone();
    let transformed = tokio::task::spawn_blocking(move || transform.apply(&task_path, content))
        .await
        .map_err(|e| ObfuscateError::transform(entry.path.clone(), e))??;

    ensure_parent(&output_path).await.map_err(io_err)?;
    tokio::fs::write(&output_path, transformed)
        .await
        .map_err(io_err)?;
    Ok(())
}

async fn copy_file(plan: &RunPlan, entry: &FileEntry) -> Result<(), ObfuscateError> {
    let io_err = |e: std::io::Error| ObfuscateError::transform(entry.path.clone(), e);
    let source_path = join_relative(&plan.source, &entry.path);
    let output_path = join_relative(&plan.output, &entry.path);
    ensure_parent(&output_path).await.map_err(io_err)?;
    tokio::fs::copy(&source_path, &output_path)
        .await
        .map_err(io_err)?;
    Ok(())
}
