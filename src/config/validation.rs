use super::{parse_duration, ProjectConfig};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// One configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Markers of values copied from a template and never filled in.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "change-me",
    "xxxx",
    "example.com",
    "username/repo",
    "replace-me",
];

/// True for empty values, `<angle-bracketed>` values, and common template markers.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }
    if value.starts_with('<') && value.ends_with('>') {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m))
}

/// Accepts `https://`, `ssh://`, `git://`, `file://` URLs and scp-style `user@host:path`.
fn looks_like_git_url(value: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(value) {
        return matches!(parsed.scheme(), "https" | "http" | "ssh" | "git" | "file")
            && (parsed.scheme() == "file" || parsed.host_str().is_some());
    }
    // scp-like syntax: git@github.com:org/repo.git
    match value.split_once(':') {
        Some((host, path)) => {
            !host.is_empty() && !path.is_empty() && !host.contains('/') && host.contains('@')
        }
        None => false,
    }
}

impl ProjectConfig {
    /// Validate the configuration, returning every issue found.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let repo = self.git.repository.trim();
        if is_placeholder(repo) {
            issues.push(ValidationIssue::new(
                "git.repository",
                "remote URL is missing or still a placeholder",
            ));
        } else if !looks_like_git_url(repo) {
            issues.push(ValidationIssue::new(
                "git.repository",
                format!("'{}' is not a recognizable Git remote URL", repo),
            ));
        }

        if self.git.branch.trim().is_empty() {
            issues.push(ValidationIssue::new("git.branch", "branch name is empty"));
        }

        match self.credential() {
            None => issues.push(ValidationIssue::new(
                "supabase.access_token",
                "credential is missing; export SUPABASE_ACCESS_TOKEN",
            )),
            Some(token) if is_placeholder(token) => issues.push(ValidationIssue::new(
                "supabase.access_token",
                "credential is still a placeholder",
            )),
            Some(_) => {}
        }

        if is_placeholder(&self.supabase.project_id) {
            issues.push(ValidationIssue::new(
                "supabase.project_id",
                "project reference is missing or still a placeholder",
            ));
        }

        if let Some(url) = self.remote_db_url() {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                issues.push(ValidationIssue::new(
                    "supabase.remote_db_url",
                    "must be a postgres:// or postgresql:// connection string",
                ));
            }
        }

        if !self.project_root.is_dir() {
            issues.push(ValidationIssue::new(
                "project_root",
                format!(
                    "working directory '{}' does not exist",
                    self.project_root.display()
                ),
            ));
        } else {
            let backend_dir = self.backend_dir();
            if !backend_dir.is_dir() {
                issues.push(ValidationIssue::new(
                    "supabase.project_path",
                    format!(
                        "backend project directory '{}' does not exist (run `supabase init`)",
                        backend_dir.display()
                    ),
                ));
            }
            if git2::Repository::discover(&self.project_root).is_err() {
                issues.push(ValidationIssue::new(
                    "project_root",
                    format!(
                        "'{}' is not inside a Git repository",
                        self.project_root.display()
                    ),
                ));
            }
        }

        let mut seen: HashMap<u16, &str> = HashMap::new();
        for (role, port) in self.ports.all() {
            if port == 0 {
                issues.push(ValidationIssue::new(
                    format!("ports.{}", role),
                    "port must be non-zero",
                ));
                continue;
            }
            if let Some(other) = seen.insert(port, role) {
                issues.push(ValidationIssue::new(
                    format!("ports.{}", role),
                    format!("port {} is already used by ports.{}", port, other),
                ));
            }
        }

        if self.health.retries == 0 {
            issues.push(ValidationIssue::new(
                "health.retries",
                "must be at least 1",
            ));
        }
        for (field, value) in [
            ("health.timeout", &self.health.timeout),
            ("health.interval", &self.health.interval),
            ("health.settle_delay", &self.health.settle_delay),
            ("health.start_timeout", &self.health.start_timeout),
        ] {
            if parse_duration(value).is_none() {
                issues.push(ValidationIssue::new(
                    field,
                    format!(
                        "invalid duration '{}'. Use formats like '2s', '500ms', '10m'",
                        value
                    ),
                ));
            }
        }

        for (index, rule) in self.conflicts.rules.iter().enumerate() {
            if let Err(e) = glob::Pattern::new(&rule.pattern) {
                issues.push(ValidationIssue::new(
                    format!("conflicts.rules[{}]", index),
                    format!("invalid pattern '{}': {}", rule.pattern, e),
                ));
            }
        }

        issues
    }

    /// Fail with [`Error::InvalidConfig`] listing every issue, if any.
    pub fn ensure_valid(&self) -> Result<()> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(
                issues.iter().map(ToString::to_string).collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parser;
    use std::path::Path;

    fn valid_project() -> (tempfile::TempDir, ProjectConfig) {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        std::fs::create_dir(dir.path().join("supabase")).unwrap();
        let yaml = r#"
git:
  repository: git@github.com:acme/app.git
supabase:
  project_id: abcdefghijklmnopqrst
  access_token: sbp_0123456789
"#;
        let config = Parser::new().parse_config(yaml, dir.path()).unwrap();
        (dir, config)
    }

    #[test]
    fn valid_config_has_no_issues() {
        let (_dir, config) = valid_project();
        assert_eq!(config.validate(), Vec::new());
        assert!(config.ensure_valid().is_ok());
    }

    #[test]
    fn reports_every_issue_in_one_pass() {
        let yaml = r#"
git:
  repository: https://github.com/username/repo.git
supabase:
  project_id: your-project-ref
  access_token: "<token>"
ports:
  api: 54321
  db: 54321
health:
  retries: 0
  interval: soon
"#;
        let config = Parser::new()
            .parse_config(yaml, Path::new("/definitely/not/here"))
            .unwrap();
        let fields: Vec<String> = config.validate().into_iter().map(|i| i.field).collect();
        for expected in [
            "git.repository",
            "supabase.access_token",
            "supabase.project_id",
            "project_root",
            "ports.db",
            "health.retries",
            "health.interval",
        ] {
            assert!(
                fields.iter().any(|f| f == expected),
                "missing issue for {} in {:?}",
                expected,
                fields
            );
        }
    }

    #[test]
    fn missing_backend_dir_is_reported() {
        let (dir, config) = valid_project();
        std::fs::remove_dir(dir.path().join("supabase")).unwrap();
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "supabase.project_path");
    }

    #[test]
    fn ensure_valid_aggregates_into_one_error() {
        let (_dir, mut config) = valid_project();
        config.supabase.access_token = None;
        config.git.repository = String::new();
        match config.ensure_valid() {
            Err(Error::InvalidConfig(list)) => assert_eq!(list.len(), 2),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("<PROJECT_ID>"));
        assert!(is_placeholder("YOUR-ACCESS-TOKEN"));
        assert!(is_placeholder("https://github.com/username/repo.git"));
        assert!(!is_placeholder("sbp_a1b2c3"));
    }

    #[test]
    fn git_url_forms() {
        assert!(looks_like_git_url("https://github.com/acme/app.git"));
        assert!(looks_like_git_url("ssh://git@github.com/acme/app.git"));
        assert!(looks_like_git_url("git@github.com:acme/app.git"));
        assert!(!looks_like_git_url("acme/app"));
        assert!(!looks_like_git_url("ftp://host/repo"));
    }
}
