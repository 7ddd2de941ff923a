//! Merge conflict resolution driven by ordered glob rules.
//!
//! After `git pull` leaves unmerged paths, every path is classified against
//! the configured [`RuleSet`]: the first matching rule decides whether the
//! local side, the remote side, or the user resolves it. Paths resolved
//! automatically are staged and, when nothing is left for the user, the merge
//! is concluded with a single commit listing every decision.

use crate::error::{Error, Result};
use crate::vcs::{Git, Side};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a conflict wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Keep the working tree's version (`--ours`).
    Local,
    /// Take the incoming version (`--theirs`).
    Remote,
    /// Leave the path for the user.
    Manual,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictPolicy::Local => "local",
            ConflictPolicy::Remote => "remote",
            ConflictPolicy::Manual => "manual",
        })
    }
}

/// A glob pattern mapped to a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRule {
    pub pattern: String,
    pub policy: ConflictPolicy,
}

impl ConflictRule {
    pub fn new(pattern: impl Into<String>, policy: ConflictPolicy) -> Self {
        Self {
            pattern: pattern.into(),
            policy,
        }
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Pattern,
    /// Patterns without a `/` also match the bare file name.
    name_only: bool,
    policy: ConflictPolicy,
}

/// Ordered rules plus the fallback policy. First match wins.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    default: ConflictPolicy,
}

impl RuleSet {
    /// Compile rules in order. Patterns that fail to compile are skipped;
    /// config validation reports them before a resolver is ever built.
    pub fn new(rules: Vec<ConflictRule>, default: ConflictPolicy) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|rule| match Pattern::new(&rule.pattern) {
                Ok(pattern) => Some(CompiledRule {
                    name_only: !rule.pattern.contains('/'),
                    pattern,
                    policy: rule.policy,
                }),
                Err(e) => {
                    tracing::warn!("Ignoring invalid conflict pattern '{}': {}", rule.pattern, e);
                    None
                }
            })
            .collect();
        Self { rules, default }
    }

    /// Apply `policy` to every path.
    pub fn uniform(policy: ConflictPolicy) -> Self {
        Self {
            rules: Vec::new(),
            default: policy,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn classify(&self, path: &str) -> ConflictPolicy {
        let path = path.trim_start_matches("./");
        let file_name = path.rsplit('/').next().unwrap_or(path);
        self.rules
            .iter()
            .find(|rule| {
                rule.pattern.matches_with(path, MATCH_OPTIONS)
                    || (rule.name_only && rule.pattern.matches_with(file_name, MATCH_OPTIONS))
            })
            .map(|rule| rule.policy)
            .unwrap_or(self.default)
    }

    /// Classify every path, preserving input order.
    pub fn plan<'a>(&self, paths: &'a [String]) -> Vec<(&'a str, ConflictPolicy)> {
        paths
            .iter()
            .map(|p| (p.as_str(), self.classify(p)))
            .collect()
    }
}

/// What happened to each conflicted path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub local: Vec<String>,
    pub remote: Vec<String>,
    pub manual: Vec<String>,
    /// Subject of the synthetic merge commit, when one was made.
    pub commit: Option<String>,
}

impl ResolutionSummary {
    pub fn resolved_count(&self) -> usize {
        self.local.len() + self.remote.len()
    }

    fn commit_subject(&self) -> String {
        format!(
            "Resolve merge conflicts ({} local, {} remote)",
            self.local.len(),
            self.remote.len()
        )
    }

    fn commit_body(&self) -> String {
        self.local
            .iter()
            .map(|p| format!("- {} (local)", p))
            .chain(self.remote.iter().map(|p| format!("- {} (remote)", p)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Resolves conflicted paths through `git checkout --ours/--theirs`.
pub struct ConflictResolver {
    git: Git,
    rules: RuleSet,
}

impl ConflictResolver {
    pub fn new(git: Git, rules: RuleSet) -> Self {
        Self { git, rules }
    }

    /// Resolve `paths` and conclude the merge if no path needs the user.
    ///
    /// Any path left for manual resolution produces
    /// [`Error::UnresolvedConflict`]; automatic resolutions stay staged and
    /// no commit is made.
    pub async fn resolve(&self, paths: &[String]) -> Result<ResolutionSummary> {
        let mut summary = ResolutionSummary::default();

        for (path, policy) in self.rules.plan(paths) {
            let side = match policy {
                ConflictPolicy::Local => Side::Ours,
                ConflictPolicy::Remote => Side::Theirs,
                ConflictPolicy::Manual => {
                    tracing::info!("Conflict in {} left for manual resolution", path);
                    summary.manual.push(path.to_string());
                    continue;
                }
            };

            match self.take_side(side, path).await {
                Ok(()) => {
                    tracing::info!("Resolved {} using {} version", path, policy);
                    match policy {
                        ConflictPolicy::Local => summary.local.push(path.to_string()),
                        _ => summary.remote.push(path.to_string()),
                    }
                }
                Err(e) => {
                    tracing::warn!("Could not resolve {} as {}: {}", path, policy, e);
                    summary.manual.push(path.to_string());
                }
            }
        }

        if !summary.manual.is_empty() {
            return Err(Error::UnresolvedConflict {
                paths: summary.manual,
            });
        }

        if summary.resolved_count() > 0 {
            let subject = summary.commit_subject();
            self.git
                .commit_with_body(&subject, &summary.commit_body())
                .await?;
            summary.commit = Some(subject);
        }
        Ok(summary)
    }

    async fn take_side(&self, side: Side, path: &str) -> Result<()> {
        self.git.checkout_side(side, path).await?;
        self.git.add_path(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::new(
            vec![
                ConflictRule::new("supabase/migrations/*", ConflictPolicy::Remote),
                ConflictRule::new("*.env", ConflictPolicy::Local),
                ConflictRule::new("supabase/*", ConflictPolicy::Manual),
            ],
            ConflictPolicy::Manual,
        )
    }

    #[test]
    fn first_match_wins() {
        let rules = rules();
        // Matches both the migrations rule and the later `supabase/*` rule.
        assert_eq!(
            rules.classify("supabase/migrations/20240101_init.sql"),
            ConflictPolicy::Remote
        );
        assert_eq!(rules.classify("supabase/config.toml"), ConflictPolicy::Manual);
    }

    #[test]
    fn star_crosses_directories() {
        let rules = RuleSet::new(
            vec![ConflictRule::new("src/*.ts", ConflictPolicy::Local)],
            ConflictPolicy::Remote,
        );
        assert_eq!(rules.classify("src/lib/deep/util.ts"), ConflictPolicy::Local);
        assert_eq!(rules.classify("lib/util.ts"), ConflictPolicy::Remote);
    }

    #[test]
    fn slashless_pattern_matches_file_name() {
        let rules = rules();
        assert_eq!(rules.classify("apps/web/.env"), ConflictPolicy::Local);
        assert_eq!(rules.classify("./prod.env"), ConflictPolicy::Local);
    }

    #[test]
    fn unmatched_paths_use_default() {
        assert_eq!(rules().classify("README.md"), ConflictPolicy::Manual);
        assert_eq!(
            RuleSet::uniform(ConflictPolicy::Remote).classify("supabase/seed.sql"),
            ConflictPolicy::Remote
        );
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let rules = RuleSet::new(
            vec![
                ConflictRule::new("[unclosed", ConflictPolicy::Local),
                ConflictRule::new("*.sql", ConflictPolicy::Remote),
            ],
            ConflictPolicy::Manual,
        );
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.classify("seed.sql"), ConflictPolicy::Remote);
    }

    #[test]
    fn plan_preserves_input_order() {
        let paths = vec!["b.env".to_string(), "a.md".to_string()];
        let plan = rules().plan(&paths);
        assert_eq!(
            plan,
            vec![("b.env", ConflictPolicy::Local), ("a.md", ConflictPolicy::Manual)]
        );
    }

    #[test]
    fn commit_message_lists_every_path() {
        let summary = ResolutionSummary {
            local: vec![".env".into()],
            remote: vec!["supabase/seed.sql".into(), "package-lock.json".into()],
            ..Default::default()
        };
        assert_eq!(
            summary.commit_subject(),
            "Resolve merge conflicts (1 local, 2 remote)"
        );
        assert_eq!(
            summary.commit_body(),
            "- .env (local)\n- supabase/seed.sql (remote)\n- package-lock.json (remote)"
        );
    }

    #[test]
    fn policy_serde_is_lowercase() {
        let rule: ConflictRule =
            serde_yaml::from_str("pattern: '*.lock'\npolicy: remote\n").unwrap();
        assert_eq!(rule.policy, ConflictPolicy::Remote);
        assert_eq!(serde_yaml::to_string(&ConflictPolicy::Local).unwrap().trim(), "local");
    }
}
