#![allow(unused_assignments)]

//! # supabase-git-sync
//!
//! Keeps a Git working tree and a Supabase project in step: code and
//! migrations travel through Git, schema through `supabase db push/pull`, and
//! row data through data-only dumps.
//!
//! ## Features
//!
//! - **Push / pull / reset** state machines with a per-step report and dry-run
//! - **Backups** before every destructive action, with restore
//! - **Conflict resolution** from ordered glob rules (`local`, `remote`, `manual`)
//! - **Local stack lifecycle**: bounded readiness polling, port cleanup, forced restart
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use supabase_git_sync::{Parser, SyncEngine, SyncSession, Verb};
//!
//! # async fn example() -> Result<(), supabase_git_sync::Error> {
//! let parser = Parser::new();
//! let path = parser.find_config_file()?;
//! let config = Arc::new(parser.load(&path)?);
//!
//! let engine = SyncEngine::builder(config, SyncSession::new(Verb::Push)).build()?;
//! let outcome = engine.push().await?;
//! for record in &outcome.report().steps {
//!     println!("{}: {}", record.step, record.status);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Execution model
//!
//! Everything runs sequentially: each external command is awaited before the
//! next starts, and the only waits are bounded [`retry::RetryPolicy`] loops.
//! The loaded [`ProjectConfig`] is immutable and shared by `Arc`.

pub mod backend;
pub mod backup;
pub mod config;
pub mod conflict;
pub mod error;
pub mod exec;
pub mod health;
pub mod retry;
pub mod session;
pub mod sync;
pub mod vcs;

// Re-export commonly used types
pub use backup::{BackupKind, BackupManager, BackupRecord, BackupSource};
pub use config::{Parser, ProjectConfig};
pub use conflict::{ConflictPolicy, ConflictResolver, ConflictRule, RuleSet};
pub use error::{Error, Result};
pub use exec::{CommandOutput, CommandRunner, CommandSpec, ExecError, SystemRunner};
pub use health::{HealthMonitor, PortResolution, RuntimeState, ServiceHealthStatus};
pub use session::{SyncSession, Verb};
pub use sync::{Step, StepStatus, SyncEngine, SyncOutcome, SyncReport};
