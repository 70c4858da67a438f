use anyhow::anyhow;
use clap::Args;
use rowstore::database::{Database, DatabaseConn, SchemaManager, TableCounts};
use rowstore::{OutputFormat, SchemaStatus, StoreConfig};
use serde::Serialize;

/// Arguments for the Init command
#[derive(Args)]
pub struct InitArgs {
    /// Drop existing tables (and their rows) before creating them
    #[clap(long)]
    pub reset: bool,

    /// Skip confirmation for --reset
    #[clap(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    database_path: String,
    schema: String,
    counts: TableCounts,
}

fn describe_schema(status: &SchemaStatus) -> String {
    match status {
        SchemaStatus::Current => "current".to_string(),
        SchemaStatus::NotInitialized => "not initialized".to_string(),
        SchemaStatus::Incomplete { missing } => format!("missing {}", missing.join(", ")),
    }
}

pub fn run_init(config: &StoreConfig, args: InitArgs) -> anyhow::Result<()> {
    if args.reset && !args.yes {
        return Err(anyhow!("refusing to drop tables without --yes"));
    }

    super::prepare_data_dir(config)?;

    let db = DatabaseConn::open(config)?;
    let schema = SchemaManager::new(&db.conn);
    if args.reset {
        schema.reset()?;
    }
    schema.initialize()?;

    println!(
        "Database at {} is {}",
        db.display_path(),
        describe_schema(&schema.check_status()?)
    );
    db.close()?;
    Ok(())
}

pub fn run_status(config: &StoreConfig, db: &Database, format: OutputFormat) -> anyhow::Result<()> {
    let report = StatusReport {
        database_path: db.path().to_string(),
        schema: describe_schema(&db.schema_status()?),
        counts: db.counts()?,
    };

    match format {
        OutputFormat::Json | OutputFormat::JsonLine => {
            println!("{}", serde_json::to_string(&report)?)
        }
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table | OutputFormat::Markdown => {
            println!("{}", config.summary());
            println!("Schema:             {}", report.schema);
            println!("Customers:          {}", report.counts.customers);
            println!("Users:              {}", report.counts.users);
            println!("Comments:           {}", report.counts.comments);
        }
    }
    Ok(())
}
