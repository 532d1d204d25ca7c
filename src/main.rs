mod config;
mod error;
mod executor;
mod openai;
mod patterns;
mod planner;
mod session;
mod types;
mod ui;

use clap::Parser;
use std::{io, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

use crate::config::{get_config_path, load_config};
use crate::executor::ShellExecutor;
use crate::openai::OpenAiClient;
use crate::session::Session;
use crate::ui::TerminalPrompter;

/// Turn plain-English instructions into shell commands.
#[derive(Parser)]
#[command(name = "shellmate", version, about)]
struct Cli {
    /// What you want to do, e.g. "delete the log folder".
    #[arg(short, long)]
    instruction: Option<String>,

    /// Show the selected command without running it.
    #[arg(short, long)]
    dry: bool,

    /// Config file to use instead of the default location.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase logging verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(get_config_path);
    let config = load_config(&config_path);

    let api_key = config.api_key();
    if api_key.is_none() {
        tracing::info!(
            "{} is not set; using built-in patterns only",
            config.llm.api_key_env
        );
    }

    let translator = OpenAiClient::new(&config.llm, api_key);
    let runner = ShellExecutor::new(config.output.max_output_lines);
    let mut prompter = TerminalPrompter::new();
    let mut stdout = io::stdout();

    let outcome = Session {
        translator: &translator,
        runner: &runner,
        prompter: &mut prompter,
        out: &mut stdout,
        dry_run: cli.dry,
    }
    .run(cli.instruction)?;

    tracing::debug!(?outcome, "session finished");
    Ok(())
}
