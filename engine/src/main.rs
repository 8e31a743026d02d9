//! CLI entry point for modelsync.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use modelsync::DefinitionKind;
use modelsync_engine::config::Config;
use modelsync_engine::connect;
use modelsync_engine::error::{Error, Result};
use modelsync_engine::execution::{self, SyncRunOptions};

#[derive(Parser)]
#[command(name = "modelsync")]
#[command(about = "Sync Eclipse security sets and models from definition files")]
#[command(version)]
struct Cli {
    /// Path to modelsync.toml (defaults apply when it is missing)
    #[arg(long, default_value = "modelsync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    SecuritySet,
    Model,
}

impl From<Kind> for DefinitionKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::SecuritySet => DefinitionKind::SecuritySet,
            Kind::Model => DefinitionKind::Model,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Parse a definition file offline and print it in canonical form
    Parse {
        file: PathBuf,
    },

    /// Show what a sync would change, without writing
    Preview {
        file: PathBuf,
    },

    /// Preview, confirm, and write a definition file to Eclipse
    Sync {
        file: PathBuf,

        /// Update this id instead of matching by name
        #[arg(long)]
        id: Option<i64>,

        /// Show plan without writing
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Write a server security set or model to a definition file
    Export {
        #[arg(value_enum)]
        kind: Kind,
        id: i64,
        path: PathBuf,
    },

    /// Find the account best matching an account number and name
    FindAccount {
        number: String,
        name: String,
    },

    /// Run an Orion custom query and print the result as JSON
    Query {
        id: i64,

        /// Prompt value as code=value (repeatable)
        #[arg(long = "param")]
        params: Vec<String>,
    },

    /// Check Eclipse credentials and connection
    Status,
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        command,
    } = cli;
    let load = || Config::load_or_default(&config_path);

    match command {
        Command::Parse { file } => execution::run_parse(&file),
        Command::Preview { file } => {
            let config = load()?;
            let client = connect::connect_eclipse(&config)?;
            execution::run_preview(&config, &client, &file)
        }
        Command::Sync {
            file,
            id,
            dry_run,
            force,
        } => {
            let config = load()?;
            let client = connect::connect_eclipse(&config)?;
            let opts = SyncRunOptions {
                file,
                existing_id: id,
                dry_run,
                force,
            };
            execution::run_sync(&config, &client, &opts).map(|_| ())
        }
        Command::Export { kind, id, path } => {
            let config = load()?;
            let client = connect::connect_eclipse(&config)?;
            execution::run_export(&config, &client, kind.into(), id, &path)
        }
        Command::FindAccount { number, name } => {
            let config = load()?;
            let client = connect::connect_eclipse(&config)?;
            execution::run_find_account(&client, &number, &name)
        }
        Command::Query { id, params } => {
            let params = execution::parse_query_params(&params)?;
            let config = load()?;
            let client = connect::connect_orion(&config)?;
            execution::run_query(&client, id, &params)
        }
        Command::Status => {
            let config = load()?;
            let client = connect::connect_eclipse(&config)?;
            execution::check_status(&client)
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match &e {
            Error::Aborted(msg) => eprintln!("{msg}"),
            _ => eprintln!("Error: {e}"),
        }
        process::exit(e.exit_code());
    }
}
