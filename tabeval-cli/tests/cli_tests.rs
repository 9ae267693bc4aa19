use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const QA_CSV: &str = "\
Index,Question,Context,Answer,Reference Context,Reference Answer
1,What is Rust?,Rust is a language.,A systems language.,Rust book,A programming language.
2,Is Rust fast?,Benchmarks.,Yes.,Benchmarks game,Yes.
";

const MOCK_CONFIG: &str = r#"
[model]
provider = "mock"
mock_replies = [
    "Criteria: relevance\nSupporting Evidence: on topic\nScore: 8",
    "I cannot evaluate this.",
]

[[metrics]]
fields = ["Question", "Answer"]
instruction = "Grade how well the answer addresses the question"

[[metrics]]
fields = ["Answer", "Reference Answer"]
auto = true
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn tabeval() -> Command {
    let mut cmd = Command::cargo_bin("tabeval").unwrap();
    cmd.env_remove("TABEVAL_MODEL").env_remove("TABEVAL_BASE_URL").env("RUST_LOG", "error");
    cmd
}

#[test]
fn inspect_shows_schema_and_preview() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv = write(dir.path(), "qa.csv", QA_CSV);

    tabeval()
        .arg("inspect")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema: QA"))
        .stdout(predicate::str::contains("Rows: 2"))
        .stdout(predicate::str::contains("Question: What is Rust?"));
    Ok(())
}

#[test]
fn inspect_reads_excel_workbooks() {
    let workbook = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tabeval-eval/tests/fixtures/qa.xlsx");

    tabeval()
        .arg("inspect")
        .arg(&workbook)
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema: QA"))
        .stdout(predicate::str::contains("Rows: 3"))
        .stdout(predicate::str::contains("[007]"));
}

#[test]
fn inspect_rejects_unknown_schema() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv = write(dir.path(), "bad.csv", "Index,Question,Answer\n1,q,a\n");

    tabeval()
        .arg("inspect")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing: Context, Reference Context, Reference Answer"));
    Ok(())
}

#[test]
fn validate_reports_missing_terms() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv = write(dir.path(), "qa.csv", QA_CSV);
    let config = write(
        dir.path(),
        "eval.toml",
        "[[metrics]]\nfields = [\"Question\", \"Context\"]\ninstruction = \"Grade the question\"\n",
    );

    tabeval()
        .args(["validate"])
        .arg(&csv)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "'Context' needs to be included as 'context' in the system prompt.",
        ));
    Ok(())
}

#[test]
fn run_with_mock_provider_prints_and_exports() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv = write(dir.path(), "qa.csv", QA_CSV);
    let config = write(dir.path(), "eval.toml", MOCK_CONFIG);
    let output = dir.path().join("results.csv");

    tabeval()
        .arg("run")
        .arg(&csv)
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("## Results for Metric 1"))
        .stdout(predicate::str::contains("## Results for Metric 2"))
        .stdout(predicate::str::contains("## Overall Results"))
        .stdout(predicate::str::contains("Metric 1: 2 evaluated, 1 failed"));

    let written = fs::read_to_string(&output)?;
    let mut lines = written.lines();
    assert!(
        lines
            .next()
            .unwrap()
            .starts_with("Index,Metric,Selected Columns,Score,Criteria,Supporting Evidence,Question")
    );
    assert_eq!(lines.count(), 4);
    Ok(())
}

#[test]
fn run_json_export() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv = write(dir.path(), "qa.csv", QA_CSV);
    let config = write(dir.path(), "eval.toml", MOCK_CONFIG);
    let output = dir.path().join("results.json");

    tabeval()
        .arg("run")
        .arg(&csv)
        .args(["--config", config.to_str().unwrap(), "--format", "json", "--output"])
        .arg(&output)
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["Score"], "8");
    assert_eq!(rows[1]["Score"], "N/A");
    assert_eq!(rows[1]["Criteria"], "Error");
    Ok(())
}

#[test]
fn strict_run_blocks_invalid_instruction() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv = write(dir.path(), "qa.csv", QA_CSV);
    let config = write(
        dir.path(),
        "eval.toml",
        "[model]\nprovider = \"mock\"\n\n[[metrics]]\nfields = [\"Context\"]\ninstruction = \"Grade it\"\n",
    );

    tabeval()
        .arg("run")
        .arg(&csv)
        .arg("--config")
        .arg(&config)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("instruction validation failed"));
    Ok(())
}

#[test]
fn openai_provider_needs_api_key() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let csv = write(dir.path(), "qa.csv", QA_CSV);
    let config = write(
        dir.path(),
        "eval.toml",
        "[model]\napi_key_env = \"TABEVAL_CLI_TEST_MISSING_KEY\"\n\n[[metrics]]\nauto = true\n",
    );

    tabeval()
        .current_dir(dir.path())
        .arg("run")
        .arg(&csv)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("TABEVAL_CLI_TEST_MISSING_KEY environment variable not set"));
    Ok(())
}

#[test]
fn no_args_shows_help() {
    tabeval().assert().failure().stderr(predicate::str::contains("Usage: tabeval [OPTIONS] <COMMAND>"));
}
