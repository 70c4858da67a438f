use clap::{Parser, Subcommand};
use rowstore::database::Database;
use rowstore::{OutputFormat, StoreConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::comment::CommentCommands;
use commands::customer::CustomerCommands;
use commands::database::InitArgs;
use commands::user::UserCommands;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.rowstore/rowstore.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty, json-line
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the tables (optionally dropping existing ones first)
    Init(InitArgs),

    /// Show configuration, schema status and row counts
    Status,

    /// Manage customers
    Customer {
        #[clap(subcommand)]
        command: CustomerCommands,
    },

    /// Manage users
    User {
        #[clap(subcommand)]
        command: UserCommands,
    },

    /// Manage comments
    Comment {
        #[clap(subcommand)]
        command: CommentCommands,
    },
}

fn open_database(config: &StoreConfig) -> anyhow::Result<Database> {
    commands::prepare_data_dir(config)?;
    Ok(Database::open(config)?)
}

fn run(cli: Cli, config: StoreConfig) -> anyhow::Result<()> {
    let format = cli.format;

    match cli.command {
        Commands::Init(args) => commands::database::run_init(&config, args),
        Commands::Status => {
            let db = open_database(&config)?;
            commands::database::run_status(&config, &db, format)
        }
        Commands::Customer { command } => {
            let db = open_database(&config)?;
            commands::customer::run(&db, command, format)
        }
        Commands::User { command } => {
            let db = open_database(&config)?;
            commands::user::run(&db, command, format)
        }
        Commands::Comment { command } => {
            let db = open_database(&config)?;
            commands::comment::run(&db, command, format)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::DEBUG.into())
                    .from_env_lossy(),
            )
            .init();
    }

    let config = match StoreConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, config) {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}
