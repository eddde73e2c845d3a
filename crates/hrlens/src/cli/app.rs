use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    ask::AskArgs, chat::ChatArgs, contract::ContractArgs, init::InitArgs, schema::SchemaArgs,
    seed::SeedArgs,
};

#[derive(Debug, Parser)]
#[command(
    name = "hrlens",
    version,
    about = "Natural-language analytics over HR workforce data"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    /// SQLite file holding the `hr_data` table.
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database file and `hr_data` schema.
    Init(InitArgs),
    /// Populate the database with synthetic demo records.
    Seed(SeedArgs),
    /// Print the table and column description the engine sees.
    Schema(SchemaArgs),
    /// Answer one question and print the response envelope.
    Ask(AskArgs),
    /// Interactive question loop with conversation memory.
    Chat(ChatArgs),
    /// Print JSON Schemas for the engine request and response.
    Contract(ContractArgs),
}
