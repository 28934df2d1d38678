//! Path-based source selection.
//!
//! [`open_source`] opens a file as a boxed [`TabularSource`]:
//!
//! - If [`SourceOptions::format`] is `None`, the format is inferred from the file extension.
//! - Excel input requires the Cargo feature `excel`.

use std::path::Path;

use crate::error::{ConversionError, ConversionResult};

use super::csv::csv_source_from_path;
use super::TabularSource;

pub use super::csv::CsvOptions;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimiter-separated text.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl SourceFormat {
    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Which sheet to read from a workbook. Only one sheet is read per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetSelection {
    /// The first sheet (default).
    #[default]
    First,
    /// A single named sheet.
    Named(String),
}

/// Options controlling how a path is opened as a source.
///
/// Use [`Default`] for common cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<SourceFormat>,
    /// Excel-specific sheet selection.
    pub sheet: SheetSelection,
    /// CSV-specific options. Without an explicit delimiter a `.tsv` path reads tab-separated.
    pub csv: CsvOptions,
}

/// Open `path` as a tabular source.
///
/// # Examples
///
/// ```no_run
/// use tabular_docs::source::{open_source, SourceOptions, TabularSource};
///
/// # fn main() -> Result<(), tabular_docs::ConversionError> {
/// let src = open_source("people.csv", &SourceOptions::default())?;
/// println!("rows={} cols={}", src.row_count(), src.column_count());
/// # Ok(())
/// # }
/// ```
pub fn open_source(path: impl AsRef<Path>, options: &SourceOptions) -> ConversionResult<Box<dyn TabularSource + Send>> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };
    tracing::debug!(path = %path.display(), ?format, "opening tabular source");

    match format {
        SourceFormat::Csv => Ok(Box::new(csv_source_from_path(path, &options.csv)?)),
        SourceFormat::Excel => open_excel(path, &options.sheet),
    }
}

fn infer_format_from_path(path: &Path) -> ConversionResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ConversionError::Source {
            message: format!("cannot infer format: path has no extension ({})", path.display()),
        })?;

    SourceFormat::from_extension(ext).ok_or_else(|| ConversionError::Source {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn open_excel(path: &Path, sheet: &SheetSelection) -> ConversionResult<Box<dyn TabularSource + Send>> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, sheet);

    #[cfg(feature = "excel")]
    {
        use super::excel::excel_source_from_path;

        let name = match sheet {
            SheetSelection::First => None,
            SheetSelection::Named(name) => Some(name.as_str()),
        };
        Ok(Box::new(excel_source_from_path(path, name)?))
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(ConversionError::Source {
            message: "excel input not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
