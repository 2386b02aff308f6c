//! End-to-end tests for the preprocessing pipeline and its stages.

use polars::prelude::*;
use riskprep_model::{DuplicatePolicy, KeepStrategy, PipelineConfig};
use riskprep_normalization::{
    DUPLICATE_FLAG_COLUMN, DuplicateOptions, coerce_types, impute_missing_values, preprocess,
    preprocess_with_report, resolve_duplicates,
};
use serde_json::json;

fn functions(value: serde_json::Value) -> PipelineConfig {
    PipelineConfig::from_value(json!({
        "configuration": { "data_specific_functions": value }
    }))
    .expect("config")
}

/// A `missing_values` record with every key present and only `overrides` active.
fn missing_values(overrides: serde_json::Value) -> PipelineConfig {
    let mut record = json!({
        "method": null,
        "subset": null,
        "drop_all_nulls": false,
        "null_threshold": false
    });
    if let (Some(base), Some(overrides)) = (record.as_object_mut(), overrides.as_object()) {
        base.extend(overrides.clone());
    }
    functions(json!({ "missing_values": record }))
}

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

fn loan_table() -> DataFrame {
    df! {
        "loan_id" => ["1", "2", "2", "3", "4"],
        "balance" => ["100.5", "200", "200", "?", "50"],
        "as_of" => [Some("12/31/2023"), Some("01/15/2024"), Some("01/15/2024"), None, Some("02/29/2024")],
        "origination" => ["12/2023", "1/2024", "1/2024", "3/2023", "11/2022"],
        "notes" => [None::<&str>, None, None, None, None],
        "grade" => [Some("A"), None, None, Some("B"), Some("A")],
    }
    .expect("df")
}

fn loan_config() -> PipelineConfig {
    PipelineConfig::from_value(json!({
        "configuration": {
            "attributes": {
                "dtype": { "loan_id": "int", "balance": "float", "as_of": "date" }
            },
            "data_specific_functions": {
                "date_columns": {
                    "as_of": { "date_format": "%m/%d/%Y" },
                    "origination": { "date_format": "XMYYYY", "separator": "/" }
                },
                "replace_values": [
                    { "column_name": "balance", "values_to_replace": ["?"], "values_to_replace_with": [null] }
                ],
                "missing_values": {
                    "method": "mean",
                    "subset": ["grade"],
                    "drop_all_nulls": true,
                    "null_threshold": 40
                }
            }
        }
    }))
    .expect("config")
}

#[test]
fn full_pipeline_produces_canonical_table() {
    let (out, report) =
        preprocess_with_report(loan_table(), Some(&loan_config())).expect("preprocess");

    assert_eq!(
        names(&out),
        vec!["loan_id", "balance", "as_of", "origination", "grade"]
    );
    assert_eq!(out.height(), 4);

    let loan_id = out.column("loan_id").expect("loan_id");
    assert_eq!(loan_id.dtype(), &DataType::Int64);
    assert_eq!(loan_id.get(3).expect("value"), AnyValue::Int64(4));

    let balance = out.column("balance").expect("balance");
    assert_eq!(balance.dtype(), &DataType::Float64);
    assert_eq!(balance.null_count(), 0);
    match balance.get(2).expect("value") {
        AnyValue::Float64(fill) => assert!((fill - 350.5 / 3.0).abs() < 1e-9),
        other => panic!("unexpected fill {other:?}"),
    }

    let as_of = out.column("as_of").expect("as_of");
    assert_eq!(as_of.dtype(), &DataType::Date);
    assert_eq!(as_of.null_count(), 1);

    let origination = out.column("origination").expect("origination");
    assert_eq!(origination.get(1).expect("value"), AnyValue::String("2024-01-28"));
    assert_eq!(origination.get(3).expect("value"), AnyValue::String("2022-11-28"));

    let grade = out.column("grade").expect("grade");
    assert_eq!(grade.null_count(), 0);
    assert_eq!(grade.get(1).expect("value"), AnyValue::String("A"));

    insta::assert_snapshot!(serde_json::to_string_pretty(&report).expect("json"), @r#"
    {
      "rows_before": 5,
      "rows_after": 4,
      "columns_before": 6,
      "columns_after": 5,
      "columns_dropped": [
        "notes"
      ],
      "columns_added": []
    }
    "#);
}

#[test]
fn absent_config_only_removes_duplicates() {
    let df = loan_table();
    let out = preprocess(df.clone(), None).expect("preprocess");

    let expected = df
        .filter(&BooleanChunked::from_slice(
            "keep".into(),
            &[true, true, false, true, true],
        ))
        .expect("filter");
    assert!(out.equals_missing(&expected));
}

#[test]
fn removing_duplicates_is_idempotent() {
    let options = DuplicateOptions::default();
    let once = resolve_duplicates(loan_table(), &options).expect("first pass");
    let twice = resolve_duplicates(once.clone(), &options).expect("second pass");
    assert_eq!(once.height(), 4);
    assert!(once.equals_missing(&twice));
}

#[test]
fn unique_table_is_untouched_by_every_policy() {
    let df = df! {
        "a" => [1i64, 2, 3],
        "b" => ["x", "y", "z"],
    }
    .expect("df");
    for policy in [
        DuplicatePolicy::Remove,
        DuplicatePolicy::Mark,
        DuplicatePolicy::KeepLast,
        DuplicatePolicy::Count,
    ] {
        let out = resolve_duplicates(df.clone(), &DuplicateOptions::new(policy)).expect("resolve");
        assert!(out.equals_missing(&df));
        assert!(out.column(DUPLICATE_FLAG_COLUMN).is_err());
    }
}

#[test]
fn mark_flags_subset_duplicates() {
    let df = df! {
        "id" => [1i64, 1, 2],
        "amount" => [10i64, 20, 30],
    }
    .expect("df");
    let options = DuplicateOptions::new(DuplicatePolicy::Mark)
        .with_subset(["id"])
        .with_keep(KeepStrategy::None);
    let out = resolve_duplicates(df, &options).expect("resolve");
    let flags: Vec<AnyValue<'_>> = (0..out.height())
        .map(|idx| out.column(DUPLICATE_FLAG_COLUMN).expect("flag").get(idx).expect("value"))
        .collect();
    assert_eq!(
        flags,
        vec![
            AnyValue::Boolean(true),
            AnyValue::Boolean(true),
            AnyValue::Boolean(false)
        ]
    );
}

#[test]
fn coercion_falls_back_per_column() {
    let df = df! {
        "a" => ["1", "2"],
        "b" => ["3", "x"],
    }
    .expect("df");
    let config = PipelineConfig::from_value(json!({
        "configuration": { "attributes": { "dtype": { "a": "int", "b": "int" } } }
    }))
    .expect("config");

    let out = coerce_types(df, &config).expect("coerce");
    assert_eq!(out.column("a").expect("a").dtype(), &DataType::Int64);
    assert_eq!(out.column("b").expect("b").dtype(), &DataType::String);
    assert_eq!(out.column("b").expect("b").get(1).expect("value"), AnyValue::String("x"));
}

#[test]
fn null_threshold_is_exclusive() {
    let df = df! {
        "quarter" => [Some(1.0f64), None, Some(3.0), Some(4.0)],
        "half" => [Some(1.0f64), None, None, Some(4.0)],
    }
    .expect("df");
    let out = impute_missing_values(df, &missing_values(json!({ "null_threshold": 25 })));
    assert_eq!(names(&out), vec!["quarter"]);
    assert_eq!(out.column("quarter").expect("quarter").null_count(), 1);
}

#[test]
fn integer_mean_rounds_half_to_even() {
    let df = df! { "n" => [Some(1i64), Some(4), None] }.expect("df");
    let out = impute_missing_values(df, &missing_values(json!({ "method": "mean" })));
    let n = out.column("n").expect("n");
    assert_eq!(n.dtype(), &DataType::Int64);
    assert_eq!(n.get(2).expect("value"), AnyValue::Int64(2));
}

#[test]
fn subset_fill_runs_after_directional_fill() {
    let df = df! { "rate" => [None, Some(2.0f64), Some(4.0)] }.expect("df");
    let config = missing_values(json!({ "method": "ffill", "subset": ["rate"] }));
    let out = impute_missing_values(df, &config);
    let rate = out.column("rate").expect("rate");
    assert_eq!(rate.null_count(), 0);
    assert_eq!(rate.get(0).expect("value"), AnyValue::Float64(3.0));
}

#[test]
fn empty_replacement_list_aborts_the_run() {
    let config = functions(json!({ "replace_values": [] }));
    let err = preprocess(loan_table(), Some(&config)).expect_err("empty list");
    assert!(err.to_string().contains("replace_values"));
}

#[test]
fn missing_dtype_path_leaves_dates_as_normalized_text() {
    let df = df! {
        "as_of" => ["12/31/2023", "01/15/2024"],
        "count" => ["1", "2"],
    }
    .expect("df");
    let config = functions(json!({
        "date_columns": { "as_of": { "date_format": "%m/%d/%Y" } }
    }));

    let out = preprocess(df, Some(&config)).expect("preprocess");
    let as_of = out.column("as_of").expect("as_of");
    assert_eq!(as_of.dtype(), &DataType::String);
    assert_eq!(as_of.get(0).expect("value"), AnyValue::String("2023-12-31"));
    assert_eq!(out.column("count").expect("count").dtype(), &DataType::String);
}

#[test]
fn missing_dtype_path_is_a_no_op_for_coercion() {
    let df = df! { "a" => ["1", "2"] }.expect("df");
    let out = coerce_types(df.clone(), &PipelineConfig::default()).expect("coerce");
    assert!(out.equals_missing(&df));
}

#[test]
fn replace_directive_missing_a_key_is_skipped() {
    let directives = [
        json!({ "values_to_replace": ["?"], "values_to_replace_with": ["0"] }),
        json!({ "column_name": "balance", "values_to_replace_with": ["0"] }),
        json!({ "column_name": "balance", "values_to_replace": ["?"] }),
    ];
    let expected = preprocess(loan_table(), None).expect("baseline");
    for directive in directives {
        let config = functions(json!({ "replace_values": [directive] }));
        let out = preprocess(loan_table(), Some(&config)).expect("soft skip");
        assert!(out.equals_missing(&expected));
    }
}

#[test]
fn partial_missing_values_record_leaves_table_unchanged() {
    let df = df! {
        "empty" => [None::<f64>, None, None],
        "rate" => [Some(1.0f64), None, Some(3.0)],
    }
    .expect("df");
    let config = functions(json!({
        "missing_values": { "method": "mean", "drop_all_nulls": true, "null_threshold": 10 }
    }));
    let out = impute_missing_values(df.clone(), &config);
    assert!(out.equals_missing(&df));
}
