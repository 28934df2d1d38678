use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConversionError;

use super::RunPhase;

/// How bad a failed run is. Drives the alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionSeverity {
    /// The input could not be converted (bad cell, unreadable format, missing sheet).
    Error,
    /// The environment failed: I/O while reading, or the sink rejected a document.
    Critical,
}

impl ConversionSeverity {
    /// Severity of a run-aborting error.
    pub fn for_error(e: &ConversionError) -> Self {
        match e {
            ConversionError::Io(_) | ConversionError::Sink { .. } => Self::Critical,
            ConversionError::Csv(err) if matches!(err.kind(), ::csv::ErrorKind::Io(_)) => Self::Critical,
            _ => Self::Error,
        }
    }
}

/// What an observer knows about the run it is watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionContext {
    /// Caller-supplied label for the source (a path, a table name, ...).
    pub label: String,
    /// Source row count, header included.
    pub rows: usize,
    /// Source column count.
    pub columns: usize,
}

/// Stats reported on a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionStats {
    /// Number of documents handed to the sink.
    pub documents: usize,
}

/// Hooks into the lifecycle of a run. Every method defaults to doing nothing.
pub trait ConversionObserver: Send + Sync {
    /// Called on every phase transition of a run.
    fn on_phase(&self, _ctx: &ConversionContext, _phase: RunPhase) {}

    /// Called when a run completes.
    fn on_success(&self, _ctx: &ConversionContext, _stats: ConversionStats) {}

    /// Called when a run fails.
    fn on_failure(&self, _ctx: &ConversionContext, _severity: ConversionSeverity, _error: &ConversionError) {}

    /// Called after `on_failure` when the severity meets the alert threshold.
    fn on_alert(&self, _ctx: &ConversionContext, _severity: ConversionSeverity, _error: &ConversionError) {}
}

/// Forwards every callback to each inner observer, in the order they were added.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ConversionObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer to the end of the list.
    pub fn with(mut self, observer: Arc<dyn ConversionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ConversionObserver for CompositeObserver {
    fn on_phase(&self, ctx: &ConversionContext, phase: RunPhase) {
        self.observers.iter().for_each(|o| o.on_phase(ctx, phase));
    }

    fn on_success(&self, ctx: &ConversionContext, stats: ConversionStats) {
        self.observers.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        self.observers.iter().for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        self.observers.iter().for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Prints phase changes and outcomes to stderr, one line each.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl ConversionObserver for StdErrObserver {
    fn on_phase(&self, ctx: &ConversionContext, phase: RunPhase) {
        eprintln!("{}", phase_line(ctx, phase));
    }

    fn on_success(&self, ctx: &ConversionContext, stats: ConversionStats) {
        eprintln!("{}", success_line(ctx, stats));
    }

    fn on_failure(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        eprintln!("{}", failure_line("failed", ctx, severity, error));
    }

    fn on_alert(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        eprintln!("{}", failure_line("ALERT", ctx, severity, error));
    }
}

/// Appends timestamped run events to a log file.
///
/// Writes are best-effort; a log file that cannot be opened or written is skipped.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append(&self, line: String) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {line}", unix_ts());
        }
    }
}

impl ConversionObserver for FileObserver {
    fn on_phase(&self, ctx: &ConversionContext, phase: RunPhase) {
        self.append(phase_line(ctx, phase));
    }

    fn on_success(&self, ctx: &ConversionContext, stats: ConversionStats) {
        self.append(success_line(ctx, stats));
    }

    fn on_failure(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        self.append(failure_line("failed", ctx, severity, error));
    }

    fn on_alert(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        self.append(failure_line("ALERT", ctx, severity, error));
    }
}

fn phase_line(ctx: &ConversionContext, phase: RunPhase) -> String {
    format!("phase={phase:?} source={}", ctx.label)
}

fn success_line(ctx: &ConversionContext, stats: ConversionStats) -> String {
    format!(
        "ok source={} rows={} columns={} documents={}",
        ctx.label, ctx.rows, ctx.columns, stats.documents
    )
}

fn failure_line(kind: &str, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) -> String {
    let mut line = format!("{kind} severity={severity:?} source={}", ctx.label);
    match error {
        ConversionError::Parse { row, column, header, .. } => {
            line.push_str(&format!(" row={row} column={column} header='{header}'"));
        }
        ConversionError::Sink { row, id, .. } => {
            line.push_str(&format!(" row={row} id={id}"));
        }
        _ => {}
    }
    line.push_str(&format!(" err={error}"));
    line
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
