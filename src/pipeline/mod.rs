//! The two-pass conversion pipeline.
//!
//! A run reads a [`TabularSource`] twice:
//!
//! 1. **Infer**: for every column, collect the text of all data rows (row 2 onward) and decide
//!    one [`ColumnType`] with [`infer_type`]. This pass may run in parallel across columns.
//! 2. **Convert**: for every data row in order, convert each cell with its column's type, key
//!    it by the header text, append `_id = row - 1`, and hand the document to the
//!    [`DocumentSink`] before moving on.
//!
//! The first conversion or sink failure aborts the run. Nothing is buffered beyond the row
//! being built, and the pipeline keeps no state between runs.
//!
//! ```rust
//! use tabular_docs::pipeline::run;
//! use tabular_docs::sink::VecSink;
//! use tabular_docs::source::GridSource;
//! use tabular_docs::types::{ColumnType, Value};
//!
//! let source = GridSource::from_rows(["Name", "Age"], [["Ann", "30"], ["Bo", "25"]]);
//! let mut sink = VecSink::new();
//! let summary = run(&source, &mut sink).unwrap();
//!
//! assert_eq!(summary.documents, 2);
//! assert_eq!(summary.columns[1].column_type, ColumnType::Int);
//! assert_eq!(sink.documents[0].get("Age"), Some(&Value::Int(30)));
//! assert_eq!(sink.documents[1].id(), Some(2));
//! ```

mod observability;

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::convert::convert;
use crate::error::{ConversionError, ConversionResult};
use crate::inference::infer_type;
use crate::sink::DocumentSink;
use crate::source::{open_source, SourceOptions, TabularSource};
use crate::types::{ColumnSchema, ColumnType, Document, ID_FIELD};

pub use observability::{
    CompositeObserver, ConversionContext, ConversionObserver, ConversionSeverity, ConversionStats, FileObserver,
    StdErrObserver,
};

/// Label used for runs that were not given one.
pub const DEFAULT_LABEL: &str = "<memory>";

/// Lifecycle of a single run.
///
/// `Idle → InferringTypes → ConvertingRows → {Completed | Failed}`. Inference has no failure
/// path, so `Failed` is only reachable from `ConvertingRows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Not started. Observers never receive this phase.
    Idle,
    /// Pass 1: deciding one type per column.
    InferringTypes,
    /// Pass 2: converting rows and handing documents to the sink.
    ConvertingRows,
    /// Every data row reached the sink.
    Completed,
    /// A cell failed to convert or the sink rejected a document.
    Failed,
}

/// Options controlling a [`ConversionPipeline`].
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Label reported to observers and logs. `None` uses [`DEFAULT_LABEL`].
    pub label: Option<String>,
    /// Infer column types on the rayon thread pool instead of sequentially.
    pub parallel_inference: bool,
    /// Optional observer for phase changes, outcomes and alerts.
    pub observer: Option<Arc<dyn ConversionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ConversionSeverity,
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("label", &self.label)
            .field("parallel_inference", &self.parallel_inference)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            label: None,
            parallel_inference: false,
            observer: None,
            alert_at_or_above: ConversionSeverity::Critical,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Inferred schema, in column order.
    pub columns: Vec<ColumnSchema>,
    /// Number of documents handed to the sink.
    pub documents: usize,
}

impl RunSummary {
    /// Inferred types, in column order.
    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|c| c.column_type).collect()
    }
}

/// Infers column types and converts rows into documents.
#[derive(Debug, Clone, Default)]
pub struct ConversionPipeline {
    options: PipelineOptions,
}

impl ConversionPipeline {
    /// Create a pipeline with the given options.
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// The options this pipeline runs with.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Pass 1 only: infer the schema of `source` without converting anything.
    pub fn infer_schema<S>(&self, source: &S) -> Vec<ColumnSchema>
    where
        S: TabularSource + ?Sized,
    {
        let columns = source.column_count();
        if self.options.parallel_inference {
            (1..=columns)
                .into_par_iter()
                .map(|col| infer_column(source, col))
                .collect()
        } else {
            (1..=columns).map(|col| infer_column(source, col)).collect()
        }
    }

    /// Convert every data row of `source` and insert the documents into `sink`, in row order.
    ///
    /// When an observer is configured, this reports:
    ///
    /// - `on_phase` on every phase transition
    /// - `on_success` on success, with the document count
    /// - `on_failure` on failure, with a computed severity
    /// - `on_alert` on failure when the computed severity is >= `alert_at_or_above`
    pub fn run<S, K>(&self, source: &S, sink: &mut K) -> ConversionResult<RunSummary>
    where
        S: TabularSource + ?Sized,
        K: DocumentSink + ?Sized,
    {
        let label = self.options.label.as_deref().unwrap_or(DEFAULT_LABEL);
        self.execute(label, source, sink)
    }

    fn execute<S, K>(&self, label: &str, source: &S, sink: &mut K) -> ConversionResult<RunSummary>
    where
        S: TabularSource + ?Sized,
        K: DocumentSink + ?Sized,
    {
        let ctx = ConversionContext {
            label: label.to_string(),
            rows: source.row_count(),
            columns: source.column_count(),
        };
        let span = tracing::info_span!("convert", source = %ctx.label, rows = ctx.rows, columns = ctx.columns);
        let _entered = span.enter();
        let start = Instant::now();
        tracing::info!(parallel_inference = self.options.parallel_inference, "conversion started");

        self.enter_phase(&ctx, RunPhase::InferringTypes);
        let columns = self.infer_schema(source);
        for c in &columns {
            tracing::debug!(column = c.index, header = %c.name, column_type = %c.column_type, "inferred column type");
        }

        self.enter_phase(&ctx, RunPhase::ConvertingRows);
        match convert_rows(source, &columns, sink) {
            Ok(documents) => {
                self.enter_phase(&ctx, RunPhase::Completed);
                tracing::info!(documents, elapsed = ?start.elapsed(), "conversion completed");
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_success(&ctx, ConversionStats { documents });
                }
                Ok(RunSummary { columns, documents })
            }
            Err(e) => {
                self.enter_phase(&ctx, RunPhase::Failed);
                tracing::warn!(error = %e, "conversion failed");
                self.report_failure(&ctx, &e);
                Err(e)
            }
        }
    }

    fn enter_phase(&self, ctx: &ConversionContext, phase: RunPhase) {
        tracing::trace!(?phase, "run phase");
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_phase(ctx, phase);
        }
    }

    fn report_failure(&self, ctx: &ConversionContext, e: &ConversionError) {
        if let Some(obs) = self.options.observer.as_ref() {
            let sev = ConversionSeverity::for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= self.options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

fn infer_column<S>(source: &S, col: usize) -> ColumnSchema
where
    S: TabularSource + ?Sized,
{
    let values: Vec<Cow<'_, str>> = (2..=source.row_count())
        .map(|row| source.cell_text(row, col))
        .collect();
    let header = source.cell_text(1, col).into_owned();
    ColumnSchema::new(col, header, infer_type(&values))
}

fn convert_rows<S, K>(source: &S, columns: &[ColumnSchema], sink: &mut K) -> ConversionResult<usize>
where
    S: TabularSource + ?Sized,
    K: DocumentSink + ?Sized,
{
    let mut documents = 0;
    for row in 2..=source.row_count() {
        let id = (row - 1) as i64;
        let mut doc = Document::with_capacity(columns.len() + 1);
        for column in columns {
            let raw = source.cell_text(row, column.index);
            let value = convert(column.column_type, &raw).map_err(|e| ConversionError::Parse {
                row,
                column: column.index,
                header: column.name.clone(),
                expected: e.expected,
                raw: e.raw,
                message: e.message,
            })?;
            // Duplicate headers overwrite the earlier column's value in place.
            doc.insert(column.name.as_str(), value);
        }
        doc.insert(ID_FIELD, id);

        tracing::trace!(row, id, fields = doc.len(), "inserting document");
        sink.insert(doc).map_err(|e| ConversionError::Sink {
            row,
            id,
            source: Box::new(e),
        })?;
        documents += 1;
    }
    Ok(documents)
}

/// Run a pipeline with default options.
pub fn run<S, K>(source: &S, sink: &mut K) -> ConversionResult<RunSummary>
where
    S: TabularSource + ?Sized,
    K: DocumentSink + ?Sized,
{
    ConversionPipeline::default().run(source, sink)
}

/// Options for [`convert_path`].
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// How to open the input path.
    pub source: SourceOptions,
    /// How to run the pipeline. If no label is set, the path is used.
    pub pipeline: PipelineOptions,
}

/// Open `path` as a tabular source and convert it into `sink`.
///
/// Failures to open the source are reported to the configured observer like run failures.
///
/// ```no_run
/// use std::io::BufWriter;
///
/// use tabular_docs::pipeline::{convert_path, ConvertOptions};
/// use tabular_docs::sink::JsonLinesSink;
///
/// # fn main() -> Result<(), tabular_docs::ConversionError> {
/// let out = BufWriter::new(std::fs::File::create("people.ndjson")?);
/// let mut sink = JsonLinesSink::new(out);
/// let summary = convert_path("people.csv", &mut sink, &ConvertOptions::default())?;
/// sink.flush()?;
/// println!("documents={}", summary.documents);
/// # Ok(())
/// # }
/// ```
pub fn convert_path<K>(path: impl AsRef<Path>, sink: &mut K, options: &ConvertOptions) -> ConversionResult<RunSummary>
where
    K: DocumentSink + ?Sized,
{
    let path = path.as_ref();
    let pipeline = ConversionPipeline::new(options.pipeline.clone());
    let label = match options.pipeline.label.as_deref() {
        Some(label) => label.to_string(),
        None => path.display().to_string(),
    };

    let source = match open_source(path, &options.source) {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to open source");
            let ctx = ConversionContext {
                label,
                rows: 0,
                columns: 0,
            };
            pipeline.report_failure(&ctx, &e);
            return Err(e);
        }
    };

    pipeline.execute(&label, &*source, sink)
}
