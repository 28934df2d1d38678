use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tabular_docs::pipeline::{convert_path, run, ConvertOptions};
use tabular_docs::sink::{JsonLinesSink, VecSink};
use tabular_docs::source::csv::{csv_source_from_path, csv_source_from_reader};
use tabular_docs::source::{CsvOptions, SourceFormat, SourceOptions, TabularSource};
use tabular_docs::types::{ColumnType, Value};
use tabular_docs::ConversionError;

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabular-docs-csv-{nanos}.{ext}"))
}

#[test]
fn csv_header_is_row_one() {
    let src = csv_source_from_path("tests/fixtures/people.csv", &CsvOptions::default()).unwrap();
    assert_eq!(src.row_count(), 3);
    assert_eq!(src.column_count(), 4);
    assert_eq!(src.cell_text(1, 1), "Name");
    assert_eq!(src.cell_text(3, 4), "FALSE");
}

#[test]
fn csv_fixture_converts_with_inferred_types() {
    let src = csv_source_from_path("tests/fixtures/people.csv", &CsvOptions::default()).unwrap();
    let mut sink = VecSink::new();
    let summary = run(&src, &mut sink).unwrap();

    assert_eq!(
        summary.column_types(),
        vec![ColumnType::String, ColumnType::Int, ColumnType::Double, ColumnType::Bool]
    );
    let grace = &sink.documents[1];
    assert_eq!(grace.get("Name"), Some(&Value::from("Grace")));
    assert_eq!(grace.get("Age"), Some(&Value::Int(45)));
    assert_eq!(grace.get("Score"), Some(&Value::Double(87.0)));
    assert_eq!(grace.get("Active"), Some(&Value::Bool(false)));
    assert_eq!(grace.id(), Some(2));
}

#[test]
fn csv_cells_are_not_trimmed() {
    let input = "a,b\n 1 ,x\n2, y\n";
    let src = csv_source_from_reader(input.as_bytes(), &CsvOptions::default()).unwrap();
    let mut sink = VecSink::new();
    let summary = run(&src, &mut sink).unwrap();

    // " 1 " is outside the numeric alphabet, so the column stays text.
    assert_eq!(summary.column_types(), vec![ColumnType::String, ColumnType::String]);
    assert_eq!(sink.documents[0].get("a"), Some(&Value::from(" 1 ")));
    assert_eq!(sink.documents[1].get("b"), Some(&Value::from(" y")));
}

#[test]
fn csv_ragged_rows_read_missing_cells_as_empty() {
    let input = "a,b,c\n1,2\n3,4,5\n";
    let src = csv_source_from_reader(input.as_bytes(), &CsvOptions::default()).unwrap();
    assert_eq!(src.column_count(), 3);
    assert_eq!(src.cell_text(2, 3), "");
    assert_eq!(src.cell_text(3, 3), "5");
}

#[test]
fn csv_custom_delimiter() {
    let input = "a;b\n1;true\n";
    let src = csv_source_from_reader(input.as_bytes(), &CsvOptions::with_delimiter(b';')).unwrap();
    let mut sink = VecSink::new();
    run(&src, &mut sink).unwrap();
    assert_eq!(sink.documents[0].get("b"), Some(&Value::Bool(true)));
}

#[test]
fn blank_line_in_single_column_csv_is_an_empty_cell() {
    let src = csv_source_from_reader("n\n1\n\n2\n".as_bytes(), &CsvOptions::default()).unwrap();
    assert_eq!(src.row_count(), 4);
    assert_eq!(src.cell_text(3, 1), "");

    let mut sink = VecSink::new();
    let err = run(&src, &mut sink).unwrap_err();
    match err {
        ConversionError::Parse { row, raw, expected, .. } => {
            assert_eq!(row, 3);
            assert_eq!(raw, "");
            assert_eq!(expected, ColumnType::Int);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    assert_eq!(sink.documents.len(), 1);
}

#[test]
fn blank_line_keeps_later_ids_tied_to_their_rows() {
    let src = csv_source_from_reader("word\nalpha\n\nbeta\n".as_bytes(), &CsvOptions::default()).unwrap();
    let mut sink = VecSink::new();
    run(&src, &mut sink).unwrap();

    let beta = &sink.documents[2];
    assert_eq!(beta.get("word"), Some(&Value::from("beta")));
    assert_eq!(beta.id(), Some(3));
    assert_eq!(sink.documents[1].get("word"), Some(&Value::from("")));
}

#[test]
fn blank_csv_column_fails_the_run() {
    let mut sink = VecSink::new();
    let err = convert_path(
        "tests/fixtures/blank_column.csv",
        &mut sink,
        &ConvertOptions::default(),
    )
    .unwrap_err();

    match err {
        ConversionError::Parse { header, expected, .. } => {
            assert_eq!(header, "Zip");
            assert_eq!(expected, ColumnType::Int);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn tsv_extension_switches_to_tab_delimiter() {
    let mut sink = VecSink::new();
    let summary = convert_path("tests/fixtures/people.tsv", &mut sink, &ConvertOptions::default()).unwrap();
    assert_eq!(summary.column_types(), vec![ColumnType::String, ColumnType::Int]);
    assert_eq!(sink.documents[1].get("Age"), Some(&Value::Int(25)));
}

#[test]
fn explicit_delimiter_wins_over_tsv_extension() {
    let path = tmp_file("tsv");
    std::fs::write(&path, "k,v\na,1\n").unwrap();

    let opts = ConvertOptions {
        source: SourceOptions {
            csv: CsvOptions::with_delimiter(b','),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut sink = VecSink::new();
    let summary = convert_path(&path, &mut sink, &opts).unwrap();
    assert_eq!(summary.column_types(), vec![ColumnType::String, ColumnType::Int]);
    assert_eq!(sink.documents[0].get("v"), Some(&Value::Int(1)));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn forced_format_overrides_extension() {
    let path = tmp_file("txt");
    std::fs::write(&path, "k,v\na,1\n").unwrap();

    let opts = ConvertOptions {
        source: SourceOptions {
            format: Some(SourceFormat::Csv),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut sink = VecSink::new();
    let summary = convert_path(&path, &mut sink, &opts).unwrap();
    assert_eq!(summary.documents, 1);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn convert_path_writes_json_lines() {
    let mut sink = JsonLinesSink::new(Vec::new());
    convert_path("tests/fixtures/people.csv", &mut sink, &ConvertOptions::default()).unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"Name":"Ada","Age":36,"Score":98.5,"Active":true,"_id":1}"#,
            r#"{"Name":"Grace","Age":45,"Score":87.0,"Active":false,"_id":2}"#,
        ]
    );
}

#[test]
fn missing_csv_file_is_an_io_error() {
    let mut sink = VecSink::new();
    let err = convert_path("tests/fixtures/does_not_exist.csv", &mut sink, &ConvertOptions::default())
        .unwrap_err();
    match err {
        ConversionError::Csv(e) => assert!(matches!(e.kind(), csv::ErrorKind::Io(_))),
        other => panic!("expected csv io error, got {other:?}"),
    }
}
