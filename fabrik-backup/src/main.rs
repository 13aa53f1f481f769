mod cli;

use std::process;

use clap::Parser;
use fabrik_backup::{Result, catalog::BackupCatalog, logging, services::ServiceContainer};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::cli::{Args, Commands};

/// Exit status for failures a retry may fix (sysexits `EX_TEMPFAIL`).
const EXIT_TEMPFAIL: i32 = 75;

#[tokio::main]
async fn main() {
    // Load .env before clap reads the environment.
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Err(e) = logging::init_logging(&args.config.log) {
        eprintln!("Error: {}", e);
        process::exit(2);
    }

    if let Err(e) = run(args).await {
        error!(transient = e.is_transient(), "Application error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(if e.is_transient() { EXIT_TEMPFAIL } else { 1 });
    }
}

async fn run(args: Args) -> Result<()> {
    let services = ServiceContainer::new(&args.config).await?;

    let result = execute(&services.catalog, args.command).await;
    services.shutdown();

    let output = result?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn execute(catalog: &BackupCatalog, command: Commands) -> Result<Value> {
    match command {
        Commands::List { scope } => {
            let records = catalog
                .list(&scope.space_guid, scope.platform.as_deref())
                .await?;
            Ok(serde_json::to_value(records)?)
        }
        Commands::Get { backup_guid, scope } => {
            let record = catalog
                .get(&scope.space_guid, &backup_guid, scope.platform.as_deref())
                .await?;
            Ok(serde_json::to_value(record)?)
        }
        Commands::Delete { backup_guid, scope } => {
            catalog
                .delete(&scope.space_guid, &backup_guid, scope.platform.as_deref())
                .await?;
            info!(backup_guid = %backup_guid, "Backup deleted");
            Ok(json!({}))
        }
    }
}
