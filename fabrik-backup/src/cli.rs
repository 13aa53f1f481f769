use clap::{Args as ClapArgs, Parser, Subcommand};
use fabrik_backup::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "fabrik-backup", version, about = "Inspect and remove tenant backups")]
pub struct Args {
    #[command(flatten)]
    pub config: AppConfig,

    #[command(subcommand)]
    pub command: Commands,
}

/// Tenant scope shared by every command.
#[derive(ClapArgs, Debug, Clone)]
pub struct Scope {
    /// Space (tenant) owning the backups.
    #[arg(long = "space-guid")]
    pub space_guid: String,

    /// Platform hint; unrecognized values fall back to cloudfoundry.
    #[arg(long)]
    pub platform: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List backups of a space without their logs
    List {
        #[command(flatten)]
        scope: Scope,
    },

    /// Show one backup including its logs
    Get {
        backup_guid: String,

        #[command(flatten)]
        scope: Scope,
    },

    /// Delete a backup's metadata and archives
    Delete {
        backup_guid: String,

        #[command(flatten)]
        scope: Scope,
    },
}
