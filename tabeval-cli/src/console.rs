use std::path::Path;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tabeval_eval::{
    AutoRubric, EvalConfig, EvalError, LlmJudge, MetricSpec, Schema, default_label, render_table,
};
use tabeval_session::{CreateRequest, GetRequest, InMemorySessionService, SessionService};

use crate::cli::ModelArgs;
use crate::commands::{load_table, print_overall};
use crate::config::{apply_overrides, build_model};

/// Resolve a comma-separated column selection. Entries are column names (any
/// case) or 1-based positions in the selectable list. Blank selects nothing.
pub fn parse_field_selection(input: &str, schema: Schema) -> Result<Vec<String>, String> {
    let selectable = schema.selectable_fields();
    let mut fields = Vec::new();

    for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let field = match entry.parse::<usize>() {
            Ok(n) if (1..=selectable.len()).contains(&n) => selectable[n - 1],
            Ok(n) => return Err(format!("No column number {} (choose 1-{})", n, selectable.len())),
            Err(_) => selectable
                .iter()
                .find(|f| f.eq_ignore_ascii_case(entry))
                .copied()
                .ok_or_else(|| format!("Unknown column '{}'", entry))?,
        };
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    }
    Ok(fields)
}

/// Read a yes/no answer, falling back to `default` on anything else.
pub fn parse_yes_no(input: &str, default: bool) -> bool {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}

/// A line of input, or `None` once the user interrupts or closes stdin.
fn read(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                rl.add_history_entry(&line)?;
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Ask for one metric definition until it builds. `None` when input ends.
fn define_metric(
    rl: &mut DefaultEditor,
    position: usize,
    schema: Schema,
) -> Result<Option<MetricSpec>> {
    let label = default_label(position);
    println!("\n## {}", label);
    for (i, field) in schema.selectable_fields().iter().enumerate() {
        println!("  {}. {}", i + 1, field);
    }

    let fields = loop {
        let Some(line) = read(rl, "Columns (names or numbers, comma-separated): ")? else {
            return Ok(None);
        };
        match parse_field_selection(&line, schema) {
            Ok(fields) => break fields,
            Err(message) => println!("{}", message),
        }
    };

    let Some(line) = read(rl, "Auto-generate the system prompt? [y/N] ")? else {
        return Ok(None);
    };
    if parse_yes_no(&line, false) {
        let rubric = AutoRubric::for_position(position);
        println!("Using the {} rubric:\n{}", rubric.name(), rubric.text());
        return Ok(Some(MetricSpec::for_slot(position, None, schema, &fields, None, true)?));
    }

    loop {
        let Some(line) = read(rl, "System prompt (use \\n for line breaks): ")? else {
            return Ok(None);
        };
        let instruction = line.replace("\\n", "\n");
        match MetricSpec::for_slot(position, None, schema, &fields, Some(instruction), false) {
            Ok(spec) => return Ok(Some(spec)),
            Err(EvalError::EmptyInstruction) => println!("{}", EvalError::EmptyInstruction),
            Err(e) => return Err(e.into()),
        }
    }
}

pub async fn run_console(file: &Path, config: Option<&Path>, model_args: &ModelArgs) -> Result<()> {
    let table = load_table(file)?;
    let mut config = match config {
        Some(path) => EvalConfig::load(path)?,
        None => EvalConfig::default(),
    };
    apply_overrides(&mut config.model, model_args);

    let judge = LlmJudge::with_config(build_model(&config.model)?, config.model.judge_config());
    let runner = config.runner();
    let schema = table.schema();

    let sessions = InMemorySessionService::new();
    let session = sessions
        .create(CreateRequest {
            user_id: "console".to_string(),
            session_id: None,
            source: file.display().to_string(),
            schema,
        })
        .await?;

    let mut rl = DefaultEditor::new()?;

    println!("tabeval console");
    println!("Schema: {} ({} rows)", schema, table.len());
    print!("\nPreview of Uploaded Data:\n");
    for record in table.preview(5) {
        println!("  [{}] {}", record.index(), record.text(schema.selectable_fields()[0]).replace('\n', " / "));
    }
    println!("Ctrl+C to exit.\n");

    let count = loop {
        let Some(line) = read(&mut rl, "Number of metrics [1]: ")? else {
            return Ok(());
        };
        if line.trim().is_empty() {
            break 1;
        }
        match line.trim().parse::<usize>() {
            Ok(n) if n > 0 => break n,
            _ => println!("Enter a positive whole number."),
        }
    };

    for position in 0..count {
        let Some(spec) = define_metric(&mut rl, position, schema)? else {
            break;
        };

        if !spec.instruction().is_auto() {
            let Some(line) = read(&mut rl, "Validate the system prompt? [Y/n] ")? else {
                break;
            };
            if parse_yes_no(&line, true) {
                let errors = spec.validate();
                if errors.is_empty() {
                    println!("System prompt is valid.");
                } else {
                    println!("{}", EvalError::InstructionValidation(errors));
                }
            }
        }

        let prompt = format!("Generate results for {}? [Y/n] ", spec.label());
        let Some(line) = read(&mut rl, &prompt)? else {
            break;
        };
        if !parse_yes_no(&line, true) {
            continue;
        }

        let results = runner.run(&spec, table.records(), &judge).await;
        println!("\n## Results for {}\n", spec.label());
        print!("{}", render_table(&results));
        sessions.append_results(session.id(), results).await?;
    }

    if count > 1 {
        let session = sessions.get(GetRequest { session_id: session.id().to_string() }).await?;
        print_overall(session.report());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_by_name_and_number() {
        let fields = parse_field_selection("answer, 1", Schema::Qa).unwrap();
        assert_eq!(fields, vec!["Answer".to_string(), "Question".to_string()]);
    }

    #[test]
    fn test_selection_blank_and_duplicates() {
        assert!(parse_field_selection("  ", Schema::Qa).unwrap().is_empty());
        assert_eq!(parse_field_selection("2, Agent Prompt", Schema::Conversation).unwrap().len(), 1);
    }

    #[test]
    fn test_selection_rejects_unknown() {
        assert!(parse_field_selection("Index", Schema::Qa).is_err());
        assert!(parse_field_selection("9", Schema::Conversation).is_err());
        assert!(parse_field_selection("Question", Schema::Conversation).is_err());
    }

    #[test]
    fn test_yes_no() {
        assert!(parse_yes_no("Y", false));
        assert!(!parse_yes_no("no", true));
        assert!(parse_yes_no("", true));
        assert!(!parse_yes_no("maybe", false));
    }
}
