use super::ProjectConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "supabase-sync.yaml";
const ALT_CONFIG_FILE_NAME: &str = "supabase-sync.yml";

/// Environment variables that override file values.
pub const ENV_ACCESS_TOKEN: &str = "SUPABASE_ACCESS_TOKEN";
pub const ENV_PROJECT_ID: &str = "SUPABASE_PROJECT_ID";
pub const ENV_DB_URL: &str = "SUPABASE_DB_URL";
pub const ENV_BRANCH: &str = "SUPABASE_SYNC_BRANCH";

pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Find config file starting from current directory
    pub fn find_config_file(&self) -> Result<PathBuf> {
        let current_dir = std::env::current_dir()?;
        Self::find_config_in_dir(&current_dir)
    }

    pub fn find_config_in_dir(dir: &Path) -> Result<PathBuf> {
        for name in [CONFIG_FILE_NAME, ALT_CONFIG_FILE_NAME] {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        match dir.parent() {
            Some(parent) => Self::find_config_in_dir(parent),
            None => Err(Error::Config(format!(
                "Could not find {} in current directory or any parent",
                CONFIG_FILE_NAME
            ))),
        }
    }

    /// Load config from a file, resolve paths against its directory and apply
    /// process environment overrides. The result is not yet validated.
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<ProjectConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()?,
        };

        let mut config = self.parse_config(&content, &base_dir)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load and validate in one step. Every validation issue is reported.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ProjectConfig> {
        let config = self.load_config(path)?;
        config.ensure_valid()?;
        Ok(config)
    }

    /// Parse config from a YAML string, resolving `project_root` against `base_dir`.
    pub fn parse_config(&self, content: &str, base_dir: &Path) -> Result<ProjectConfig> {
        let mut config: ProjectConfig = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML config: {}", e)))?;

        if config.project_root.is_relative() {
            config.project_root = normalize(&base_dir.join(&config.project_root));
        }
        Ok(config)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectConfig {
    /// Overlay values supplied out-of-band. Non-empty environment values win.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_ACCESS_TOKEN) {
            self.supabase.access_token = Some(token);
        }
        if let Some(project_id) = get(ENV_PROJECT_ID) {
            self.supabase.project_id = project_id;
        }
        if let Some(url) = get(ENV_DB_URL) {
            self.supabase.remote_db_url = Some(url);
        }
        if let Some(branch) = get(ENV_BRANCH) {
            self.git.branch = branch;
        }
    }
}

/// Drop `.` components so displayed paths stay readable.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

/// Starter configuration written by `sbsync setup`.
pub const STARTER_CONFIG: &str = r#"# supabase-sync.yaml
git:
  repository: git@github.com:your-org/your-repo.git
  branch: main

supabase:
  project_id: your-project-ref
  # Prefer the SUPABASE_ACCESS_TOKEN environment variable over storing it here.
  # remote_db_url comes from SUPABASE_DB_URL when set.
  project_path: supabase

ports:
  api: 54321
  db: 54322
  studio: 54323
  inbucket: 54324

health:
  retries: 30
  interval: 2s

backup:
  directory: backups
  strategy: full
  retention_days: 7

sync:
  conflict_strategy: smart
  migration_strategy: auto
  data_strategy: full

conflicts:
  default: manual
  rules:
    "supabase/migrations/*": remote
    "supabase/seed.sql": remote
    ".env*": local
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parse_resolves_root_against_base_dir() {
        let yaml = r#"
project_root: app
git:
  repository: https://github.com/acme/app.git
supabase:
  project_id: abcdefghijklmnop
"#;
        let config = Parser::new()
            .parse_config(yaml, Path::new("/work/checkout"))
            .unwrap();
        assert_eq!(config.project_root, PathBuf::from("/work/checkout/app"));
        assert_eq!(
            config.backend_dir(),
            PathBuf::from("/work/checkout/app/supabase")
        );
    }

    #[test]
    fn default_root_is_config_directory() {
        let config = Parser::new()
            .parse_config("git: {}\nsupabase: {}\n", Path::new("/srv/project"))
            .unwrap();
        assert_eq!(config.project_root, PathBuf::from("/srv/project"));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let yaml = r#"
git:
  repository: https://github.com/acme/app.git
supabase:
  project_id: from-file
  access_token: file-token
"#;
        let mut config = Parser::new().parse_config(yaml, Path::new("/tmp")).unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_ACCESS_TOKEN, "sbp_env"),
            (ENV_PROJECT_ID, ""),
            (ENV_BRANCH, "develop"),
        ]
        .into_iter()
        .collect();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.credential(), Some("sbp_env"));
        // Empty values do not clobber file values.
        assert_eq!(config.supabase.project_id, "from-file");
        assert_eq!(config.git.branch, "develop");
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let err = Parser::new()
            .parse_config("git: [unclosed", Path::new("/tmp"))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn starter_config_parses() {
        let config = Parser::new()
            .parse_config(STARTER_CONFIG, Path::new("/tmp"))
            .unwrap();
        assert_eq!(config.conflicts.rules.len(), 3);
    }

    #[test]
    fn finds_config_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "git: {}\nsupabase: {}\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let found = Parser::find_config_in_dir(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
    }
}
