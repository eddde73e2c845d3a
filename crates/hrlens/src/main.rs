#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use hrlens::cli::app::{Cli, Command, RuntimeArgs};
use hrlens::cli::commands;
use hrlens::config::RuntimeSettings;
use hrlens::models::EnvelopeFailure;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    let command_name = command_name(&cli.command);
    tracing::debug!(command = command_name, "starting");

    match execute(cli) {
        Ok(()) => {
            tracing::debug!(command = command_name, exit_code = EXIT_SUCCESS, "completed");
            EXIT_SUCCESS
        }
        Err(error) => {
            report_failure(command_name, &error);
            EXIT_RUNTIME_FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    if let Command::Contract(args) = &cli.command {
        return commands::contract::run(args);
    }

    let settings = resolve_runtime_settings(&cli.runtime)?;
    match &cli.command {
        Command::Init(args) => commands::init::run(args, &settings),
        Command::Seed(args) => commands::seed::run(args, &settings),
        Command::Schema(args) => commands::schema::run(args, &settings),
        Command::Ask(args) => commands::ask::run(args, &settings),
        Command::Chat(args) => commands::chat::run(args, &settings),
        Command::Contract(args) => commands::contract::run(args),
    }
}

/// Envelope failures go to stdout as JSON like successful output; anything else is plain stderr.
fn report_failure(command_name: &str, error: &anyhow::Error) {
    tracing::error!(command = command_name, exit_code = EXIT_RUNTIME_FAILURE, "failed");
    match error.downcast_ref::<EnvelopeFailure>() {
        Some(failure) => println!("{failure}"),
        None => {
            eprintln!("hrlens: failed `{command_name}` (exit_code={EXIT_RUNTIME_FAILURE})");
            eprintln!("{error:#}");
        }
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Init(_) => "init",
        Command::Seed(_) => "seed",
        Command::Schema(_) => "schema",
        Command::Ask(_) => "ask",
        Command::Chat(_) => "chat",
        Command::Contract(_) => "contract",
    }
}

fn resolve_runtime_settings(args: &RuntimeArgs) -> Result<RuntimeSettings> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    hrlens::config::resolve_runtime_settings(&home_dir, &cwd, args.database.as_deref(), |key| {
        std::env::var(key).ok()
    })
}
