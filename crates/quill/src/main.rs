//! quill CLI binary.
//!
//! This binary provides command-line access to quill's functionality:
//! - Print assembled prompts for a story context file
//! - Stream generations and idea output from a local server
//! - Evaluate dynamic prompts, extract idea fields, manage settings

use clap::Parser;
use quill::{ObservabilityConfig, Settings, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands};

    // Parse command-line arguments
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    init_observability(
        &ObservabilityConfig::new()
            .with_log_level(log_level)
            .with_json_logs(cli.json_logs),
    )?;

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Commands::Prompt {
            context,
            idea,
            fast,
        } => {
            cli::print_prompt(settings, &context, idea, fast)?;
        }

        Commands::Generate { context, repeat } => {
            cli::run_generation(settings, &context, quill::Target::Generate, repeat).await?;
        }

        Commands::Idea {
            context,
            field,
            strategy,
            repeat,
        } => {
            let target = quill::Target::Idea {
                selection: field,
                strategy,
            };
            cli::run_generation(settings, &context, target, repeat).await?;
        }

        Commands::Eval { text, times } => {
            cli::evaluate_text(&text, times);
        }

        Commands::Extract {
            field,
            input,
            context,
        } => {
            cli::extract(field, input.as_deref(), context.as_deref())?;
        }

        Commands::Settings(settings_cmd) => {
            cli::handle_settings_command(settings_cmd, &settings)?;
        }

        Commands::Health => {
            cli::health(&settings).await?;
        }
    }

    Ok(())
}
