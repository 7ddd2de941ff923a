mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use supabase_git_sync::{Error as SyncError, Parser as ConfigParser, SyncEngine, SyncSession, Verb};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        if let Some(sync_error) = e.downcast_ref::<SyncError>() {
            eprintln!("Error: {}", sync_error);
            if let Some(suggestion) = sync_error.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let out = &output::CliOutput;

    // ── Tier 1: Commands that work without a valid config ─────────────
    match &cli.command {
        Commands::Setup => {
            return commands::run_setup(cli.config.clone(), cli.force, cli.dry_run, out).await;
        }
        Commands::Validate => {
            return commands::run_validate(cli.config.clone(), out).await;
        }
        _ => {} // fall through to config-loading path
    }

    // ── Load config ─────────────────────────────────────────────────
    let parser = ConfigParser::new();
    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => parser.find_config_file()?,
    };

    // ── Tier 2: Commands that need config but not a sync engine ──────
    if let Commands::Config = cli.command {
        let config = parser.load_config(&config_path)?;
        return commands::run_config(&config, &config_path, out);
    }

    // ── Tier 3: Commands that drive the sync engine ──────────────────
    // Status is read-only and useful for diagnosing a broken setup, so it
    // skips validation.
    let config = match cli.command {
        Commands::Status { .. } => parser.load_config(&config_path)?,
        _ => parser.load(&config_path)?,
    };
    tracing::debug!("Loaded {}", config_path.display());

    let verb = match &cli.command {
        Commands::Push => Verb::Push,
        Commands::Pull => Verb::Pull,
        Commands::Status { .. } => Verb::Status,
        Commands::Backup => Verb::Backup,
        Commands::Restore { .. } => Verb::Restore,
        Commands::Reset => Verb::Reset,
        Commands::Config | Commands::Validate | Commands::Setup => {
            unreachable!("handled in earlier dispatch tiers");
        }
    };
    let mut session = SyncSession::new(verb)
        .dry_run(cli.dry_run)
        .force(cli.force);
    if let Commands::Restore { file } = &cli.command {
        session = session.restore_target(file.clone());
    }

    let engine = SyncEngine::builder(Arc::new(config), session).build()?;

    match cli.command {
        Commands::Push => commands::run_push(&engine, out).await,
        Commands::Pull => commands::run_pull(&engine, out).await,
        Commands::Status { json } => commands::run_status(&engine, json, out).await,
        Commands::Backup => commands::run_backup(&engine, out).await,
        Commands::Restore { .. } => commands::run_restore(&engine, out).await,
        Commands::Reset => commands::run_reset(&engine, out).await,
        Commands::Config | Commands::Validate | Commands::Setup => {
            unreachable!("handled in earlier dispatch tiers");
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
