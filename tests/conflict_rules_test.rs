//! Rule-driven conflict resolution.
//!
//! Property tests cover classification (deterministic, first match wins);
//! the scripted tests cover the git commands a resolution issues.

mod common;

use common::FakeRunner;
use proptest::prelude::*;
use supabase_git_sync::vcs::Git;
use supabase_git_sync::{ConflictPolicy, ConflictResolver, ConflictRule, Error, RuleSet};

fn policy_strategy() -> impl Strategy<Value = ConflictPolicy> {
    prop_oneof![
        Just(ConflictPolicy::Local),
        Just(ConflictPolicy::Remote),
        Just(ConflictPolicy::Manual),
    ]
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(|parts| {
        let mut path = parts.join("/");
        path.push_str(".sql");
        path
    })
}

proptest! {
    #[test]
    fn classification_is_deterministic(
        path in path_strategy(),
        first in policy_strategy(),
        default in policy_strategy(),
    ) {
        let rules = RuleSet::new(
            vec![ConflictRule::new("migrations/*", first)],
            default,
        );
        prop_assert_eq!(rules.classify(&path), rules.classify(&path));
    }

    #[test]
    fn first_matching_rule_wins(
        path in path_strategy(),
        first in policy_strategy(),
        second in policy_strategy(),
        default in policy_strategy(),
    ) {
        // Both rules match every generated path.
        let rules = RuleSet::new(
            vec![
                ConflictRule::new("*.sql", first),
                ConflictRule::new("*", second),
            ],
            default,
        );
        prop_assert_eq!(rules.classify(&path), first);
    }

    #[test]
    fn unmatched_paths_take_the_default(
        path in path_strategy(),
        rule in policy_strategy(),
        default in policy_strategy(),
    ) {
        let rules = RuleSet::new(vec![ConflictRule::new("*.toml", rule)], default);
        prop_assert_eq!(rules.classify(&path), default);
    }

    #[test]
    fn plan_keeps_every_path_once(paths in prop::collection::vec(path_strategy(), 0..12)) {
        let rules = RuleSet::new(
            vec![ConflictRule::new("a*/**", ConflictPolicy::Remote)],
            ConflictPolicy::Local,
        );
        let plan = rules.plan(&paths);
        prop_assert_eq!(plan.len(), paths.len());
        for ((planned, _), original) in plan.iter().zip(&paths) {
            prop_assert_eq!(*planned, original.as_str());
        }
    }
}

fn resolver(runner: &std::sync::Arc<FakeRunner>, rules: RuleSet) -> ConflictResolver {
    let dir = std::env::temp_dir();
    ConflictResolver::new(Git::new(runner.clone(), dir), rules)
}

#[tokio::test]
async fn test_resolution_stages_each_path_then_commits_once() {
    let runner = FakeRunner::new();
    let rules = RuleSet::new(
        vec![
            ConflictRule::new("supabase/migrations/*", ConflictPolicy::Remote),
            ConflictRule::new("src/**", ConflictPolicy::Local),
        ],
        ConflictPolicy::Manual,
    );
    let paths = vec![
        "src/lib/db.ts".to_string(),
        "supabase/migrations/002_add_users.sql".to_string(),
    ];

    let summary = resolver(&runner, rules).resolve(&paths).await.unwrap();

    assert_eq!(summary.local, vec!["src/lib/db.ts"]);
    assert_eq!(summary.remote, vec!["supabase/migrations/002_add_users.sql"]);
    assert_eq!(
        runner.lines(),
        vec![
            "git checkout --ours -- src/lib/db.ts",
            "git add -- src/lib/db.ts",
            "git checkout --theirs -- supabase/migrations/002_add_users.sql",
            "git add -- supabase/migrations/002_add_users.sql",
            "git commit -m Resolve merge conflicts (1 local, 1 remote) -m - src/lib/db.ts (local)\n- supabase/migrations/002_add_users.sql (remote)",
        ]
    );
}

#[tokio::test]
async fn test_manual_path_blocks_the_commit() {
    let runner = FakeRunner::new();
    let rules = RuleSet::new(
        vec![ConflictRule::new("*.lock", ConflictPolicy::Remote)],
        ConflictPolicy::Manual,
    );
    let paths = vec!["package.lock".to_string(), "README.md".to_string()];

    let err = resolver(&runner, rules).resolve(&paths).await.unwrap_err();

    match err {
        Error::UnresolvedConflict { paths } => assert_eq!(paths, vec!["README.md"]),
        other => panic!("expected UnresolvedConflict, got {:?}", other),
    }
    // The automatic resolution stays staged.
    assert!(runner.ran(&["git", "checkout", "--theirs", "--", "package.lock"]));
    assert!(!runner.ran(&["git", "commit"]));
}

#[tokio::test]
async fn test_failed_checkout_falls_back_to_manual() {
    let runner = FakeRunner::new();
    runner.respond(
        &["git", "checkout", "--ours", "--", "deleted.sql"],
        common::failure("error: path 'deleted.sql' does not have our version"),
    );
    let rules = RuleSet::uniform(ConflictPolicy::Local);

    let err = resolver(&runner, rules)
        .resolve(&["deleted.sql".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnresolvedConflict { ref paths } if paths == &vec!["deleted.sql".to_string()]));
}

#[tokio::test]
async fn test_no_conflicts_means_no_commands() {
    let runner = FakeRunner::new();
    let summary = resolver(&runner, RuleSet::uniform(ConflictPolicy::Remote))
        .resolve(&[])
        .await
        .unwrap();

    assert_eq!(summary.resolved_count(), 0);
    assert!(summary.commit.is_none());
    assert!(runner.calls().is_empty());
}
