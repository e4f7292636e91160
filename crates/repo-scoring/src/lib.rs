//! Repository health scoring
//!
//! Maps a [`repo_metrics::RepositoryAttributes`] bundle and a set of
//! [`Weights`] to a score in `[0, 100]`. Scoring is pure: the same
//! attributes, weights and reference time always produce the same value.
//!
//! ```
//! use chrono::Utc;
//! use repo_metrics::RepositoryAttributes;
//! use repo_scoring::Scorer;
//!
//! let mut attrs = RepositoryAttributes::new("rust-lang", "rust");
//! attrs.stars = 95_000;
//! attrs.last_commit_at = Some(Utc::now());
//!
//! let score = Scorer::default().score(&attrs);
//! assert!((0.0..=100.0).contains(&score));
//! ```

mod scorer;
mod weights;

pub use scorer::{ScoreBreakdown, Scorer};
pub use weights::{ScoringConfig, Weights};
