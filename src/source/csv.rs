//! CSV-backed tabular source.

use std::io::Read;
use std::path::Path;

use crate::error::ConversionResult;

use super::GridSource;

/// Options for reading CSV input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter. `None` picks one from the input: tab for `.tsv` paths, `,` otherwise.
    pub delimiter: Option<u8>,
}

impl CsvOptions {
    /// Options with an explicit delimiter.
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }
}

/// Read a CSV file into a [`GridSource`].
///
/// Rules:
///
/// - The first record is the header row (row 1 of the grid).
/// - Records may have different lengths; missing cells read as `""`.
/// - Cell text is kept exactly as written (no trimming).
/// - In a single-column file a blank line between records is an empty cell and keeps its row.
pub fn csv_source_from_path(path: impl AsRef<Path>, options: &CsvOptions) -> ConversionResult<GridSource> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(csv::Error::from)?;
    let mut options = *options;
    if options.delimiter.is_none() && is_tsv(path) {
        options.delimiter = Some(b'\t');
    }
    csv_source_from_bytes(&data, &options)
}

/// Read CSV data from any byte reader into a [`GridSource`].
pub fn csv_source_from_reader<R: Read>(mut reader: R, options: &CsvOptions) -> ConversionResult<GridSource> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data).map_err(csv::Error::from)?;
    csv_source_from_bytes(&data, options)
}

fn csv_source_from_bytes(data: &[u8], options: &CsvOptions) -> ConversionResult<GridSource> {
    let mut rdr = reader_builder(options).from_reader(data);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut blank_before: Vec<usize> = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        let start = usize::try_from(rdr.position().byte()).unwrap_or(data.len());
        if !rdr.read_record(&mut record)? {
            break;
        }
        blank_before.push(blank_lines_at(data, start));
        rows.push(record.iter().map(str::to_owned).collect());
    }

    // A blank line only reads as a cell when the file has a single column.
    if rows.iter().all(|r| r.len() <= 1) && blank_before.iter().skip(1).any(|&n| n > 0) {
        rows = restore_blank_rows(rows, &blank_before);
    }
    tracing::debug!(rows = rows.len(), "read csv records");
    Ok(GridSource::new(rows))
}

/// Counts the blank lines the reader skipped before the record whose bytes start at `start`.
///
/// With CRLF input the previous record stops after `\r`, so a leading `\n` that completes that
/// terminator is not a blank line.
fn blank_lines_at(data: &[u8], start: usize) -> usize {
    let rest = data.get(start..).unwrap_or_default();
    let newlines = rest
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .filter(|&&b| b == b'\n')
        .count();
    let completes_crlf = start > 0 && data[start - 1] == b'\r' && rest.first() == Some(&b'\n');
    newlines - usize::from(completes_crlf)
}

// Lines skipped before the header or after the last record do not become rows.
fn restore_blank_rows(rows: Vec<Vec<String>>, blank_before: &[usize]) -> Vec<Vec<String>> {
    let mut out = Vec::with_capacity(rows.len() + blank_before.iter().sum::<usize>());
    for (i, (row, &blanks)) in rows.into_iter().zip(blank_before).enumerate() {
        if i > 0 {
            out.extend(std::iter::repeat_with(|| vec![String::new()]).take(blanks));
        }
        out.push(row);
    }
    out
}

fn is_tsv(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("tsv"))
}

fn reader_builder(options: &CsvOptions) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::None)
        .delimiter(options.delimiter.unwrap_or(b','));
    builder
}
