//! Data types for GitHub GraphQL responses
//!
//! These structs mirror the shape of the repository query. Every nested
//! object is optional because GitHub returns `null` for empty repositories,
//! missing licenses and non-commit branch targets.

use chrono::{DateTime, Utc};
use repo_metrics::{RepositoryAttributes, SCHEMA_VERSION};
use serde::Deserialize;

/// Top-level GraphQL envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    /// e.g. `NOT_FOUND`, absent for syntax and validation errors
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// `data` of the repository query
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryNode {
    pub owner: Option<Login>,
    pub name: String,
    pub description: Option<String>,
    pub stargazer_count: u64,
    pub fork_count: u64,
    pub is_archived: bool,
    pub is_security_policy_enabled: Option<bool>,
    pub primary_language: Option<Named>,
    pub watchers: Option<Counted>,
    pub issues: Option<Counted>,
    pub pull_requests: Option<Counted>,
    pub default_branch_ref: Option<BranchRef>,
    pub license_info: Option<LicenseInfo>,
    pub code_of_conduct: Option<Named>,
    pub object: Option<TreeObject>,
    pub releases: Option<Releases>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Login {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counted {
    pub total_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    pub target: Option<CommitTarget>,
}

/// Only populated when the branch target is a commit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommitTarget {
    pub history: Option<CommitHistory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitHistory {
    pub nodes: Vec<CommitNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitNode {
    pub committed_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LicenseInfo {
    pub key: String,
}

/// Root tree, only populated when `HEAD:` resolves to a tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TreeObject {
    pub entries: Vec<TreeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Releases {
    pub total_count: u64,
    #[serde(default)]
    pub nodes: Vec<ReleaseNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNode {
    pub published_at: Option<DateTime<Utc>>,
}

/// Root entries that indicate a CI configuration
const CI_PREFIXES: [&str; 3] = [".github", ".gitlab", ".circleci"];
const CI_FILES: [&str; 2] = [".travis.yml", "jenkinsfile"];

#[derive(Debug, Default, PartialEq, Eq)]
struct TreeIndicators {
    cicd: bool,
    contributing: bool,
    readme: bool,
    code_of_conduct: bool,
    security_policy: bool,
}

fn scan_tree(entries: &[TreeEntry]) -> TreeIndicators {
    let mut found = TreeIndicators::default();
    for entry in entries {
        let name = entry.name.to_lowercase();
        if CI_PREFIXES.iter().any(|p| name.starts_with(p)) || CI_FILES.contains(&name.as_str()) {
            found.cicd = true;
        }
        if name == "contributing" || name == "contributing.md" {
            found.contributing = true;
        }
        if name.starts_with("readme") {
            found.readme = true;
        }
        if name.starts_with("code_of_conduct") {
            found.code_of_conduct = true;
        }
        if name == "security.md" {
            found.security_policy = true;
        }
    }
    found
}

impl RepositoryNode {
    /// Flatten the GraphQL shape into the canonical attribute bundle
    pub fn into_attributes(self) -> RepositoryAttributes {
        let tree = self
            .object
            .as_ref()
            .map(|o| scan_tree(&o.entries))
            .unwrap_or_default();

        let last_commit_at = self
            .default_branch_ref
            .and_then(|r| r.target)
            .and_then(|t| t.history)
            .and_then(|h| h.nodes.into_iter().next())
            .map(|n| n.committed_date);

        let (release_count, last_release_at) = match self.releases {
            Some(r) => (
                r.total_count,
                r.nodes.into_iter().find_map(|n| n.published_at),
            ),
            None => (0, None),
        };

        RepositoryAttributes {
            schema_version: SCHEMA_VERSION,
            owner: self.owner.map(|o| o.login).unwrap_or_default(),
            name: self.name,
            description: self.description.unwrap_or_default(),
            stars: self.stargazer_count,
            forks: self.fork_count,
            watchers: self.watchers.map(|w| w.total_count).unwrap_or(0),
            open_issues: self.issues.map(|i| i.total_count).unwrap_or(0),
            open_prs: self.pull_requests.map(|p| p.total_count).unwrap_or(0),
            last_commit_at,
            is_archived: self.is_archived,
            primary_language: self.primary_language.map(|l| l.name).unwrap_or_default(),
            has_license: self.license_info.is_some(),
            has_cicd: tree.cicd,
            has_contributing: tree.contributing,
            has_readme: tree.readme,
            has_code_of_conduct: self.code_of_conduct.is_some() || tree.code_of_conduct,
            has_security_policy: self.is_security_policy_enabled.unwrap_or(false)
                || tree.security_policy,
            release_count,
            last_release_at,
            score: None,
        }
    }
}
