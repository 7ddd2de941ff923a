use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sbsync", version)]
#[command(about = "Keep a Git working tree and a Supabase project in sync")]
pub struct Cli {
    /// Config file path (defaults to supabase-sync.yaml, searched upwards)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show what would run without changing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Commit and push local changes, then push schema and data to Supabase
    Push,
    /// Pull remote changes, rebuild the local database and copy remote data down
    Pull,
    /// Show branch, local stack health, ports and backups
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Snapshot the Git state and the local database
    Backup,
    /// Replay a backup file into the local database
    Restore {
        /// Backup file; bare names are looked up in the backup directory
        file: PathBuf,
    },
    /// Rebuild the local stack from the remote schema (local data is lost)
    Reset,
    /// Print the resolved configuration with secrets masked
    Config,
    /// Check the configuration and required tools
    Validate,
    /// Write a starter config, create the backup directory and link the project
    Setup,
}
