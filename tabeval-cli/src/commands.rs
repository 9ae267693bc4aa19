use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tabeval_eval::{
    EvalConfig, EvalError, LlmJudge, MetricSpec, ResultAggregator, Table, render_table,
};
use tabeval_session::{CreateRequest, GetRequest, InMemorySessionService, SessionService};

use crate::cli::{ModelArgs, OutputFormat};
use crate::config::{apply_overrides, build_model};

/// Extensions read as workbooks; everything else is read as CSV.
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

fn is_workbook(file: &Path) -> bool {
    file.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WORKBOOK_EXTENSIONS.iter().any(|w| ext.eq_ignore_ascii_case(w)))
}

pub fn load_table(file: &Path) -> Result<Table> {
    let table =
        if is_workbook(file) { Table::from_xlsx_path(file) } else { Table::from_csv_path(file) };
    table.with_context(|| format!("failed to load {}", file.display()))
}

/// Print a table's schema and its first rows.
pub fn inspect(file: &Path, rows: usize) -> Result<()> {
    let table = load_table(file)?;

    println!("Schema: {}", table.schema());
    println!("Rows: {}", table.len());
    println!("Columns: {}", table.columns().join(", "));
    println!("\nPreview of Uploaded Data:");
    for record in table.preview(rows) {
        println!("[{}]", record.index());
        for (name, value) in record.fields() {
            println!("  {}: {}", name, value.to_string().replace('\n', " / "));
        }
    }
    Ok(())
}

/// Print validation messages per metric. Returns whether every metric is valid.
pub fn report_validation(specs: &[MetricSpec]) -> bool {
    let mut all_valid = true;
    for spec in specs {
        let errors = spec.validate();
        if errors.is_empty() {
            println!("{}: System prompt is valid.", spec.label());
        } else {
            all_valid = false;
            println!("{}: {}", spec.label(), EvalError::InstructionValidation(errors));
        }
    }
    all_valid
}

pub fn validate(file: &Path, config: &Path) -> Result<()> {
    let table = load_table(file)?;
    let config = EvalConfig::load(config)?;
    let specs = config.metric_specs(table.schema())?;
    report_validation(&specs);
    Ok(())
}

/// Print the combined view, or the warning when there is nothing to combine.
pub fn print_overall(report: &ResultAggregator) {
    match report.overall() {
        Ok(results) => {
            println!("\n## Overall Results\n");
            print!("{}", render_table(results));
            println!("\n{}", report.format_summary());
        }
        Err(e) => println!("Warning: {}", e),
    }
}

pub fn write_report(report: &ResultAggregator, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            report.write_csv(file)?;
        }
        OutputFormat::Json => std::fs::write(path, report.to_json()?)?,
    }
    tracing::debug!(path = %path.display(), rows = report.len(), "report written");
    println!("Report written to {}", path.display());
    Ok(())
}

pub async fn run(
    file: &Path,
    config_path: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    strict: bool,
    model_args: &ModelArgs,
) -> Result<()> {
    let table = load_table(file)?;
    let mut config = EvalConfig::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    apply_overrides(&mut config.model, model_args);

    let specs = config.metric_specs(table.schema())?;
    if !report_validation(&specs) && strict {
        anyhow::bail!("instruction validation failed; fix the system prompts or drop --strict");
    }

    let judge = LlmJudge::with_config(build_model(&config.model)?, config.model.judge_config());
    let runner = config.runner();
    tracing::info!(
        file = %file.display(),
        schema = %table.schema(),
        rows = table.len(),
        metrics = specs.len(),
        "starting evaluation"
    );

    let sessions = InMemorySessionService::new();
    let session = sessions
        .create(CreateRequest {
            user_id: "cli".to_string(),
            session_id: None,
            source: file.display().to_string(),
            schema: table.schema(),
        })
        .await?;

    for spec in &specs {
        let results = runner.run(spec, table.records(), &judge).await;
        println!("\n## Results for {}\n", spec.label());
        print!("{}", render_table(&results));
        sessions.append_results(session.id(), results).await?;
    }

    let session = sessions.get(GetRequest { session_id: session.id().to_string() }).await?;
    let report = session.report();
    tracing::info!(
        session.id = session.id(),
        user = session.user_id(),
        source = session.source(),
        schema = %session.schema(),
        runs = session.runs(),
        started = %session.created_at(),
        results = report.len(),
        "evaluation session complete"
    );
    if specs.len() > 1 {
        print_overall(report);
    } else {
        println!("\n{}", report.format_summary());
    }

    if let Some(path) = output {
        write_report(report, path, format)?;
    }
    Ok(())
}
