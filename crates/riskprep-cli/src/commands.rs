use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::Local;
use comfy_table::{Cell, Table};
use tracing::{info, info_span, warn};

use riskprep_cli::output::run_output_path;
use riskprep_ingest::{read_table, write_csv};
use riskprep_model::{ConfigIssue, IssueSeverity, PipelineConfig, has_errors, load_config};
use riskprep_normalization::{FormatRegistry, is_known_date_format, preprocess_with_report};

use crate::cli::{CheckConfigArgs, RunArgs};
use crate::summary::{apply_table_style, dim_cell, header_cell, print_issue_table};
use crate::types::RunResult;

pub fn run_formats() -> Result<()> {
    let registry = FormatRegistry::global();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Code"),
        header_cell("Kind"),
        header_cell("Example"),
        header_cell("Notes"),
    ]);
    apply_table_style(&mut table);
    for format in registry.stock_formats() {
        table.add_row(vec![
            Cell::new(format.code),
            Cell::new("stock"),
            Cell::new(format.example),
            dim_cell("-"),
        ]);
    }
    for format in registry.custom_formats() {
        table.add_row(vec![
            Cell::new(format.code),
            Cell::new("custom"),
            Cell::new(format.example),
            Cell::new(format.description),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_check_config(args: &CheckConfigArgs) -> Result<Vec<ConfigIssue>> {
    let path = &args.config;
    let Some(config) =
        load_config(path).with_context(|| format!("load config {}", path.display()))?
    else {
        bail!("configuration file not found: {}", path.display());
    };
    Ok(config.validate(is_known_date_format))
}

pub fn run_pipeline(args: &RunArgs) -> Result<RunResult> {
    let span = info_span!("run", data = %args.data.display());
    let _guard = span.enter();
    let start = Instant::now();

    let config = load_run_config(args)?;
    let issues = config
        .as_ref()
        .map(|config| config.validate(is_known_date_format))
        .unwrap_or_default();
    for issue in &issues {
        match issue.severity {
            IssueSeverity::Error => warn!(path = %issue.path, "configuration error: {}", issue.message),
            IssueSeverity::Warning => info!(path = %issue.path, "configuration warning: {}", issue.message),
        }
    }
    if args.strict_config && has_errors(&issues) {
        print_issue_table(&issues);
        let errors = issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count();
        bail!("configuration has {errors} error(s); refusing to run with --strict-config");
    }

    let df = read_table(&args.data).with_context(|| format!("read {}", args.data.display()))?;
    let (mut df, report) =
        preprocess_with_report(df, config.as_ref()).context("preprocess table")?;

    let output = if args.dry_run {
        info!("dry run; skipping output");
        None
    } else {
        let path = args.output.clone().unwrap_or_else(|| {
            run_output_path(
                &args.output_dir,
                &args.output_file,
                Local::now().naive_local(),
            )
        });
        write_csv(&mut df, &path).with_context(|| format!("write {}", path.display()))?;
        Some(path)
    };

    Ok(RunResult {
        data: args.data.clone(),
        config: args.config.clone(),
        configured: config.is_some(),
        report,
        issues,
        output,
        elapsed: start.elapsed(),
    })
}

fn load_run_config(args: &RunArgs) -> Result<Option<PipelineConfig>> {
    let Some(path) = &args.config else {
        info!("no configuration given; only duplicate removal will run");
        return Ok(None);
    };
    let config = load_config(path).with_context(|| format!("load config {}", path.display()))?;
    if config.is_none() {
        warn!(
            path = %path.display(),
            "configuration file not found; only duplicate removal will run"
        );
    }
    Ok(config)
}
