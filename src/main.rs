use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::process::ExitCode;

use fixit::capture;
use fixit::cli::Cli;
use fixit::config::{generate_default_config, Config};
use fixit::failure::FailureRecord;
use fixit::logging;
use fixit::output;
use fixit::service::ExplanationService;

fn format_error(message: &str, tip: Option<&str>) -> String {
    let mut output = format!("{} {}", "Error:".red().bold(), message);
    if let Some(tip) = tip {
        output.push('\n');
        output.push_str(&format!("{} {}", "Tip:".blue().bold(), tip));
    }
    output
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "fixit", &mut io::stdout());
}

/// The failure to explain, or `None` when a captured command succeeded
async fn get_failure(cli: &Cli) -> Result<Option<FailureRecord>> {
    if cli.capture {
        let Some(command) = cli.captured_command() else {
            bail!(format_error(
                "No command given to --capture.",
                Some("fixit --capture npm run build")
            ));
        };
        let record = capture::capture(&command)
            .await
            .context("failed to capture command")?;
        if record.is_successful() {
            return Ok(None);
        }
        return Ok(Some(record));
    }

    match (&cli.command, &cli.error) {
        (Some(command), Some(error)) => {
            let record = FailureRecord::new(command.as_str(), cli.exit_code).stderr(error.as_str());
            Ok(Some(capture::current_context(record)))
        }
        _ => bail!(format_error(
            "No failure provided. Usage: fixit --command <CMD> --error <TEXT>",
            Some("Or run the command through fixit: fixit --capture <CMD>")
        )),
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.default_config {
        print!("{}", generate_default_config());
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load();

    if cli.show_config {
        output::print_config(&config);
        return Ok(ExitCode::SUCCESS);
    }

    let errors = config.validate();
    if !errors.is_empty() {
        output::print_config_errors(&errors);
        return Ok(ExitCode::FAILURE);
    }

    let Some(record) = get_failure(&cli).await? else {
        println!("{} {}", "✓".green(), "Command succeeded, nothing to explain".green().bold());
        return Ok(ExitCode::SUCCESS);
    };

    let service = ExplanationService::from_config(&config).map_err(|e| {
        anyhow::anyhow!(format_error(
            &e.to_string(),
            Some("Set OPENAI_API_KEY or add api_key to the config file")
        ))
    })?;

    let records = vec![record];
    let explanations = service.explain_all(&records).await;
    tracing::debug!(stats = ?service.cache_stats(), "done");

    if cli.json {
        println!("{}", output::format_json(&records, &explanations)?);
    } else if cli.raw {
        println!("{}", output::format_plain(&explanations));
    } else {
        for (record, explanation) in records.iter().zip(&explanations) {
            output::print_colored(record, explanation);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        print_completions(shell);
        return Ok(ExitCode::SUCCESS);
    }

    logging::init(cli.verbose);

    run(cli).await
}
