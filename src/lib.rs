//! `tabular-docs` turns a header-first tabular dataset into a sequence of ordered, schema-less
//! documents suitable for a document store.
//!
//! Given only the text of each cell, a run decides one [`types::ColumnType`] per column, converts
//! every cell of that column to that type, and emits one [`types::Document`] per data row, keyed
//! by the header text plus a synthetic `_id`.
//!
//! The primary entrypoint is [`pipeline::ConversionPipeline::run`] (or the [`pipeline::run`]
//! shorthand), which reads from any [`source::TabularSource`] and writes to any
//! [`sink::DocumentSink`]. [`pipeline::convert_path`] opens a CSV or Excel file first.
//!
//! ## Type inference
//!
//! Per column, over every data-row value (header excluded):
//!
//! - every value made only of digits and `.` → [`types::ColumnType::Int`], or
//!   [`types::ColumnType::Double`] if any value contains a `.`
//! - every value equal to `true`/`false` (any case) → [`types::ColumnType::Bool`]; this check
//!   runs second and wins
//! - anything else → [`types::ColumnType::String`]
//!
//! Empty cells are ordinary text. An all-empty column infers as `Int` and then fails to convert;
//! see [`inference`] for the full list of sharp edges.
//!
//! ## Quick example
//!
//! ```rust
//! use tabular_docs::pipeline::run;
//! use tabular_docs::sink::JsonLinesSink;
//! use tabular_docs::source::GridSource;
//!
//! let source = GridSource::from_rows(
//!     ["Name", "Score", "Active"],
//!     [["Ann", "9.5", "TRUE"], ["Bo", "7", "false"]],
//! );
//! let mut sink = JsonLinesSink::new(Vec::new());
//! run(&source, &mut sink).unwrap();
//!
//! let out = String::from_utf8(sink.into_inner()).unwrap();
//! assert_eq!(
//!     out,
//!     "{\"Name\":\"Ann\",\"Score\":9.5,\"Active\":true,\"_id\":1}\n\
//!      {\"Name\":\"Bo\",\"Score\":7.0,\"Active\":false,\"_id\":2}\n"
//! );
//! ```
//!
//! ## Modules
//!
//! - [`types`]: column types, values, documents
//! - [`inference`]: per-column type inference
//! - [`convert`]: cell text → value conversion
//! - [`source`]: tabular sources (in-memory, CSV, Excel behind the `excel` feature)
//! - [`sink`]: document sinks (in-memory, NDJSON, closures)
//! - [`pipeline`]: the two-pass run, options and observer hooks
//! - [`error`]: error types

pub mod convert;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod types;

pub use error::{ConversionError, ConversionResult};
