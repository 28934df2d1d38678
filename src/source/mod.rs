//! Tabular sources: read-only 2-D grids of cell text with a header row.
//!
//! The pipeline only needs the narrow [`TabularSource`] view. Adapters are provided for:
//!
//! - in-memory rows ([`GridSource`])
//! - CSV ([`csv`])
//! - Excel workbooks ([`excel`], requires the Cargo feature `excel`)
//!
//! Most callers should use [`open_source`] (from [`unified`]), which picks an adapter from the
//! file extension.

use std::borrow::Cow;

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod unified;

pub use unified::{open_source, CsvOptions, SheetSelection, SourceFormat, SourceOptions};

/// Read-only grid of cell text.
///
/// Coordinates are 1-based and row 1 is always the header. A source must return the same text
/// for a given coordinate for the duration of a run.
pub trait TabularSource: Sync {
    /// Total number of rows, header included.
    fn row_count(&self) -> usize;

    /// Number of columns.
    fn column_count(&self) -> usize;

    /// Text of the cell at (`row`, `col`). Out-of-range coordinates yield `""`.
    fn cell_text(&self, row: usize, col: usize) -> Cow<'_, str>;
}

impl<T: TabularSource + ?Sized> TabularSource for &T {
    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn cell_text(&self, row: usize, col: usize) -> Cow<'_, str> {
        (**self).cell_text(row, col)
    }
}

impl<T: TabularSource + ?Sized> TabularSource for Box<T> {
    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn cell_text(&self, row: usize, col: usize) -> Cow<'_, str> {
        (**self).cell_text(row, col)
    }
}

/// In-memory tabular source.
///
/// Ragged rows are allowed; missing cells read as `""` and the column count is the width of
/// the widest row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSource {
    rows: Vec<Vec<String>>,
    columns: usize,
}

impl GridSource {
    /// Create a source from row-major cells. The first row is the header.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self { rows, columns }
    }

    /// Create a source from a header and data rows of anything string-like.
    pub fn from_rows<H, R, S>(header: H, data: impl IntoIterator<Item = R>) -> Self
    where
        H: IntoIterator<Item = S>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rows = vec![header.into_iter().map(Into::into).collect::<Vec<String>>()];
        rows.extend(
            data.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect::<Vec<String>>()),
        );
        Self::new(rows)
    }

    /// Header cells (row 1), if any.
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }
}

impl TabularSource for GridSource {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns
    }

    fn cell_text(&self, row: usize, col: usize) -> Cow<'_, str> {
        row.checked_sub(1)
            .zip(col.checked_sub(1))
            .and_then(|(r, c)| self.rows.get(r)?.get(c))
            .map(|s| Cow::Borrowed(s.as_str()))
            .unwrap_or(Cow::Borrowed(""))
    }
}
