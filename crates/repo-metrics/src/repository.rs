//! The canonical repository attribute bundle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current layout of [`RepositoryAttributes`]. Bump when fields change meaning.
pub const SCHEMA_VERSION: u32 = 2;

/// Everything known about one repository, plus its score once computed.
///
/// Every field is optional on the wire so older and newer payloads both
/// decode. `score` stays `None` until a scorer has run; a fresh analysis is
/// the only thing that replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryAttributes {
    /// Absent in a payload means it predates versioning
    #[serde(default)]
    pub schema_version: u32,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub open_prs: u64,
    pub last_commit_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub primary_language: String,
    pub has_license: bool,
    pub has_cicd: bool,
    pub has_contributing: bool,
    pub has_readme: bool,
    pub has_code_of_conduct: bool,
    pub has_security_policy: bool,
    pub release_count: u64,
    pub last_release_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
}

impl Default for RepositoryAttributes {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            owner: String::new(),
            name: String::new(),
            description: String::new(),
            stars: 0,
            forks: 0,
            watchers: 0,
            open_issues: 0,
            open_prs: 0,
            last_commit_at: None,
            is_archived: false,
            primary_language: String::new(),
            has_license: false,
            has_cicd: false,
            has_contributing: false,
            has_readme: false,
            has_code_of_conduct: false,
            has_security_policy: false,
            release_count: 0,
            last_release_at: None,
            score: None,
        }
    }
}

impl RepositoryAttributes {
    /// Empty bundle for `owner/name`
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Whole days since the last commit, `None` when unknown
    pub fn days_since_last_commit(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_commit_at.map(|at| (now - at).num_days())
    }

    /// Attach a computed score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn is_current_schema(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}
