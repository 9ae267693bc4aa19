use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tabeval")]
#[command(version, about = "Grade spreadsheet rows with an LLM judge", long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the detected schema and the first rows of a table
    Inspect {
        /// CSV file with a header row
        file: PathBuf,

        /// Number of rows to preview
        #[arg(short, long, default_value = "5")]
        rows: usize,
    },

    /// Check that each metric's instruction names its selected columns
    Validate {
        /// CSV file with a header row
        file: PathBuf,

        /// Evaluation config (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Evaluate every configured metric over a table
    Run {
        /// CSV file with a header row
        file: PathBuf,

        /// Evaluation config (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Write the combined report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format of the written report
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Refuse to run when an instruction fails validation
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Define and run metrics interactively
    Console {
        /// CSV file with a header row
        file: PathBuf,

        /// Take model and prompt settings from this config
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        model: ModelArgs,
    },
}

/// Model settings that override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Judge provider
    #[arg(long, value_parser = ["openai", "mock"])]
    pub provider: Option<String>,

    /// Judge model name
    #[arg(long, env = "TABEVAL_MODEL")]
    pub model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "TABEVAL_BASE_URL")]
    pub base_url: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}
