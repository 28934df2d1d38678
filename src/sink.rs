//! Document sinks: where converted documents go.
//!
//! The pipeline hands each [`Document`] to [`DocumentSink::insert`] as soon as it is built, in
//! increasing row order. Sink errors are propagated unchanged (wrapped with row context) and
//! are never retried.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::io::{self, Write};

use crate::types::Document;

/// Destination for converted documents.
pub trait DocumentSink {
    /// Sink-defined failure.
    type Error: StdError + Send + Sync + 'static;

    /// Persist one document.
    fn insert(&mut self, document: Document) -> Result<(), Self::Error>;
}

impl<T: DocumentSink + ?Sized> DocumentSink for &mut T {
    type Error = T::Error;

    fn insert(&mut self, document: Document) -> Result<(), Self::Error> {
        (**self).insert(document)
    }
}

/// Collects documents in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VecSink {
    /// Documents in insertion order.
    pub documents: Vec<Document>,
}

impl VecSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the sink and return the collected documents.
    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

impl DocumentSink for VecSink {
    type Error = Infallible;

    fn insert(&mut self, document: Document) -> Result<(), Self::Error> {
        self.documents.push(document);
        Ok(())
    }
}

/// Writes each document as one JSON object per line (NDJSON).
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer. Callers writing to files should pass a buffered writer.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of documents written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentSink for JsonLinesSink<W> {
    type Error = serde_json::Error;

    fn insert(&mut self, document: Document) -> Result<(), Self::Error> {
        serde_json::to_writer(&mut self.writer, &document)?;
        self.writer.write_all(b"\n").map_err(serde_json::Error::io)?;
        self.written += 1;
        Ok(())
    }
}

/// Adapts a closure into a [`DocumentSink`].
///
/// ```
/// use std::convert::Infallible;
///
/// use tabular_docs::sink::FnSink;
///
/// let mut ids = Vec::new();
/// let mut sink = FnSink::new(|doc: tabular_docs::types::Document| {
///     ids.extend(doc.id());
///     Ok::<_, Infallible>(())
/// });
/// # let _ = &mut sink;
/// ```
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F> {
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, E> DocumentSink for FnSink<F>
where
    F: FnMut(Document) -> Result<(), E>,
    E: StdError + Send + Sync + 'static,
{
    type Error = E;

    fn insert(&mut self, document: Document) -> Result<(), Self::Error> {
        (self.f)(document)
    }
}
