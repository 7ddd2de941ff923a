//! Git operations for the working tree.
//!
//! Mutating verbs go through the [`CommandRunner`] so that tests can record
//! them. Read-only repository discovery uses `git2` directly.

use crate::error::Result;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use git2::Repository;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Side of a merge conflict to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Ours,
    Theirs,
}

impl Side {
    fn flag(self) -> &'static str {
        match self {
            Side::Ours => "--ours",
            Side::Theirs => "--theirs",
        }
    }
}

/// `git` over a [`CommandRunner`], rooted at the project working tree.
#[derive(Clone)]
pub struct Git {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
}

impl Git {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }

    fn spec<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new("git", args).current_dir(&self.root)
    }

    async fn checked<I, S>(&self, args: I) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.runner.run_checked(&self.spec(args)).await?)
    }

    /// `git --version`, used as a tool precondition.
    pub async fn version(&self) -> Result<String> {
        let out = self
            .runner
            .run_checked(&CommandSpec::new("git", ["--version"]))
            .await?;
        Ok(out.stdout.trim().to_string())
    }

    /// Lines of `git status --porcelain`.
    pub async fn status_porcelain(&self) -> Result<Vec<String>> {
        let out = self.checked(["status", "--porcelain"]).await?;
        Ok(non_empty_lines(&out.stdout))
    }

    pub async fn add_all(&self) -> Result<()> {
        self.checked(["add", "-A"]).await?;
        Ok(())
    }

    pub async fn commit(&self, message: &str) -> Result<()> {
        self.checked(["commit", "-m", message]).await?;
        Ok(())
    }

    /// Commit with a subject line and a body paragraph.
    pub async fn commit_with_body(&self, subject: &str, body: &str) -> Result<()> {
        self.checked(["commit", "-m", subject, "-m", body]).await?;
        Ok(())
    }

    pub async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.checked(["push", remote, branch]).await?;
        Ok(())
    }

    /// `git pull --no-rebase`. Returns the raw output so callers can inspect
    /// a conflicted merge instead of treating it as an error.
    pub async fn pull(&self, remote: &str, branch: &str) -> Result<CommandOutput> {
        Ok(self
            .runner
            .run(&self.spec(["pull", "--no-rebase", remote, branch]))
            .await?)
    }

    /// Paths left unmerged by the last merge.
    pub async fn conflicted_paths(&self) -> Result<Vec<String>> {
        let out = self
            .checked(["diff", "--name-only", "--diff-filter=U"])
            .await?;
        Ok(non_empty_lines(&out.stdout))
    }

    pub async fn checkout_side(&self, side: Side, path: &str) -> Result<()> {
        self.checked(["checkout", side.flag(), "--", path]).await?;
        Ok(())
    }

    pub async fn add_path(&self, path: &str) -> Result<()> {
        self.checked(["add", "--", path]).await?;
        Ok(())
    }

    /// Stash tracked and untracked changes.
    pub async fn stash_push(&self, message: &str) -> Result<()> {
        self.checked(["stash", "push", "-u", "-m", message]).await?;
        Ok(())
    }

    pub async fn stash_pop(&self) -> Result<()> {
        self.checked(["stash", "pop"]).await?;
        Ok(())
    }

    /// Up to `depth` one-line commit summaries, newest first.
    pub async fn log_oneline(&self, depth: usize) -> Result<Vec<String>> {
        let out = self
            .checked(["log".to_string(), "--oneline".into(), "-n".into(), depth.to_string()])
            .await?;
        Ok(non_empty_lines(&out.stdout))
    }

    /// Summary of HEAD, or `None` in a repository without commits.
    pub async fn last_commit(&self) -> Result<Option<String>> {
        let out = self
            .runner
            .run(&self.spec(["log", "-1", "--oneline"]))
            .await?;
        if !out.success() {
            return Ok(None);
        }
        Ok(non_empty_lines(&out.stdout).into_iter().next())
    }

    pub async fn current_branch(&self) -> Result<String> {
        let out = self
            .checked(["rev-parse", "--abbrev-ref", "HEAD"])
            .await?;
        Ok(out.stdout.trim().to_string())
    }

    /// Commits ahead of and behind `<remote>/<branch>`, if the tracking ref exists.
    pub async fn ahead_behind(&self, remote: &str, branch: &str) -> Result<Option<(u32, u32)>> {
        let range = format!("HEAD...{}/{}", remote, branch);
        let out = self
            .runner
            .run(&self.spec(["rev-list", "--left-right", "--count", range.as_str()]))
            .await?;
        if !out.success() {
            return Ok(None);
        }
        Ok(parse_ahead_behind(&out.stdout))
    }
}

/// True if `path` is inside a Git repository.
pub fn is_repository(path: &Path) -> bool {
    Repository::discover(path).is_ok()
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_ahead_behind(text: &str) -> Option<(u32, u32)> {
    let mut parts = text.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some((ahead, behind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rev_list_counts() {
        assert_eq!(parse_ahead_behind("2\t5\n"), Some((2, 5)));
        assert_eq!(parse_ahead_behind("0 0"), Some((0, 0)));
        assert_eq!(parse_ahead_behind("fatal"), None);
    }

    #[test]
    fn porcelain_lines_keep_leading_status_columns() {
        let lines = non_empty_lines(" M src/lib.rs\n?? notes.txt\n\n");
        assert_eq!(lines, vec![" M src/lib.rs", "?? notes.txt"]);
    }

    #[test]
    fn discovers_repository_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("supabase");
        std::fs::create_dir(&nested).unwrap();
        assert!(is_repository(&nested));
    }
}
