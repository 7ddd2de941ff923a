//! Cleanup of leftover containers from this project's local stack.
//!
//! The Supabase CLI names its containers `supabase_<service>_<project>`. After
//! a crashed or interrupted run some of them can outlive `supabase stop` and
//! keep ports bound. Only containers carrying this project's suffix are
//! touched.

use crate::error::Result;
use crate::exec::{CommandRunner, CommandSpec};
use std::sync::Arc;
use std::time::Duration;

/// Timeout for Docker list/remove operations during orphan cleanup.
const DOCKER_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OrphanCleaner {
    runner: Arc<dyn CommandRunner>,
    stack_id: String,
}

impl OrphanCleaner {
    pub fn new(runner: Arc<dyn CommandRunner>, stack_id: impl Into<String>) -> Self {
        Self {
            runner,
            stack_id: stack_id.into(),
        }
    }

    /// True when `name` belongs to this project's local stack.
    pub fn owns(&self, name: &str) -> bool {
        let suffix = format!("_{}", self.stack_id);
        name.starts_with("supabase_")
            && name.ends_with(&suffix)
            && name.len() > "supabase_".len() + suffix.len()
    }

    /// Names of existing containers (running or not) that belong to this project.
    pub async fn detect(&self) -> Result<Vec<String>> {
        let spec = CommandSpec::new(
            "docker",
            [
                "ps",
                "-a",
                "--filter",
                "name=^supabase_",
                "--format",
                "{{.Names}}",
            ],
        )
        .timeout(DOCKER_TIMEOUT);
        let output = self.runner.run_checked(&spec).await?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|name| self.owns(name))
            .map(str::to_string)
            .collect())
    }

    /// Remove orphaned containers with `docker rm -f`.
    ///
    /// Returns the number of containers removed.
    pub async fn remove_orphans(&self) -> Result<usize> {
        let orphans = self.detect().await?;
        let mut removed = 0;

        for container in &orphans {
            tracing::info!("Removing orphaned container: {}", container);
            let spec = CommandSpec::new("docker", ["rm", "-f", container.as_str()])
                .timeout(DOCKER_TIMEOUT);
            let output = self.runner.run(&spec).await?;

            if output.success() {
                removed += 1;
            } else if !output.stderr.contains("No such container") {
                tracing::warn!(
                    "Failed to remove orphaned container '{}': {}",
                    container,
                    output.stderr.trim()
                );
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::SystemRunner;

    #[test]
    fn ownership_requires_prefix_and_project_suffix() {
        let cleaner = OrphanCleaner::new(Arc::new(SystemRunner::new()), "shop");
        assert!(cleaner.owns("supabase_db_shop"));
        assert!(cleaner.owns("supabase_kong_shop"));
        assert!(!cleaner.owns("supabase_db_workshop"));
        assert!(!cleaner.owns("supabase_db_shop_old"));
        assert!(!cleaner.owns("postgres_shop"));
        assert!(!cleaner.owns("supabase__shop"));
    }
}
