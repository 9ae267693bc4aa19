use anyhow::Result;
use clap::Parser;
use tabeval_cli::cli::{Cli, Commands};
use tabeval_cli::{commands, console};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let logging = if cli.json_logs {
        tabeval_telemetry::init_json_telemetry("tabeval")
    } else {
        tabeval_telemetry::init_telemetry("tabeval")
    };
    logging.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Inspect { file, rows } => commands::inspect(&file, rows),
        Commands::Validate { file, config } => commands::validate(&file, &config),
        Commands::Run { file, config, output, format, strict, model } => {
            commands::run(&file, &config, output.as_deref(), format, strict, &model).await
        }
        Commands::Console { file, config, model } => {
            console::run_console(&file, config.as_deref(), &model).await
        }
    }
}
