//! Integration tests for reading and writing tables.

use std::io::Write;

use polars::prelude::*;
use riskprep_ingest::{IngestError, read_table, write_csv};
use tempfile::{Builder, TempDir};

fn temp_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{content}").unwrap();
    file
}

#[test]
fn test_read_csv() {
    let file = temp_file(".csv", "loan_id,balance,grade\n1,100.5,A\n2,?,B\n");
    let df = read_table(file.path()).unwrap();

    assert_eq!(df.shape(), (2, 3));
    assert_eq!(df.column("loan_id").unwrap().dtype(), &DataType::Int64);
    // A non-numeric marker keeps the column as text.
    assert_eq!(df.column("balance").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_read_tsv() {
    let file = temp_file(".tsv", "a\tb\nx\t1\ny\t2\n");
    let df = read_table(file.path()).unwrap();

    assert_eq!(df.shape(), (2, 2));
    assert_eq!(df.column("a").unwrap().get(1).unwrap(), AnyValue::String("y"));
}

#[test]
fn test_read_json_lines() {
    let file = temp_file(
        ".jsonl",
        "{\"a\": 1, \"b\": \"x\"}\n{\"a\": 2, \"b\": null}\n",
    );
    let df = read_table(file.path()).unwrap();

    assert_eq!(df.shape(), (2, 2));
    assert_eq!(df.column("b").unwrap().null_count(), 1);
}

#[test]
fn test_read_json_array() {
    let file = temp_file(".json", "[{\"a\": 1}, {\"a\": 2}, {\"a\": 3}]");
    let df = read_table(file.path()).unwrap();

    assert_eq!(df.height(), 3);
}

#[test]
fn test_unsupported_extension() {
    let file = temp_file(".xlsx", "not a spreadsheet");
    let err = read_table(file.path()).unwrap_err();

    assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
}

#[test]
fn test_write_csv_creates_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("output_20240101_000000").join("output.csv");
    let mut df = df! {
        "a" => [1i64, 2],
        "b" => [Some("x"), None],
    }
    .unwrap();

    write_csv(&mut df, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, "a,b\n1,x\n2,\n");

    let reread = read_table(&path).unwrap();
    assert_eq!(reread.shape(), (2, 2));
    assert_eq!(reread.column("b").unwrap().null_count(), 1);
}
