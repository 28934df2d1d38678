#![cfg(feature = "excel")]

use std::borrow::Cow;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::{ConversionError, ConversionResult};

use super::TabularSource;

/// Tabular source over the used range of one workbook sheet (`.xlsx`, `.xls`, `.ods`, etc.).
///
/// Row 1 is the first row of the used range. Cells render as the spreadsheet's raw value text:
///
/// - whole-number floats print without a fraction (`30`, not `30.0`)
/// - booleans print as `True` / `False`
/// - date-times print as their serial number
/// - empty cells print as `""`
#[derive(Debug, Clone)]
pub struct ExcelSource {
    sheet: String,
    range: Range<Data>,
}

impl ExcelSource {
    /// Wrap an already-loaded sheet range.
    pub fn new(sheet: impl Into<String>, range: Range<Data>) -> Self {
        Self {
            sheet: sheet.into(),
            range,
        }
    }

    /// Name of the sheet this source reads.
    pub fn sheet(&self) -> &str {
        &self.sheet
    }
}

impl TabularSource for ExcelSource {
    fn row_count(&self) -> usize {
        self.range.get_size().0
    }

    fn column_count(&self) -> usize {
        self.range.get_size().1
    }

    fn cell_text(&self, row: usize, col: usize) -> Cow<'_, str> {
        let Some((r, c)) = row.checked_sub(1).zip(col.checked_sub(1)) else {
            return Cow::Borrowed("");
        };
        match self.range.get((r, c)) {
            Some(Data::String(s)) => Cow::Borrowed(s.as_str()),
            Some(cell) => Cow::Owned(cell_to_text(cell)),
            None => Cow::Borrowed(""),
        }
    }
}

/// Open a workbook and load one sheet as a tabular source.
///
/// Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook.
pub fn excel_source_from_path(path: impl AsRef<Path>, sheet_name: Option<&str>) -> ConversionResult<ExcelSource> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ConversionError::Source {
                message: "workbook has no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    tracing::debug!(sheet = %sheet, size = ?range.get_size(), "loaded worksheet range");
    Ok(ExcelSource::new(sheet, range))
}

fn cell_to_text(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_to_text(*f),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => float_to_text(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

fn float_to_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}
