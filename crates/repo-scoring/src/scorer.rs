//! The scoring algorithm

use crate::weights::Weights;
use chrono::{DateTime, Utc};
use repo_metrics::RepositoryAttributes;

const STARS_LOG_CEILING: f64 = 5.0;
const FORKS_LOG_CEILING: f64 = 4.5;
const WATCHERS_LOG_CEILING: f64 = 4.0;
const ISSUES_LOG_DECAY: f64 = 5.0;
const PRS_LOG_DECAY: f64 = 4.0;
const RELEASE_COUNT_CEILING: f64 = 10.0;

/// (max days since last commit, credit), first match wins
const ACTIVITY_PLATEAUS: [(f64, f64); 5] = [
    (7.0, 1.0),
    (30.0, 0.8),
    (90.0, 0.6),
    (180.0, 0.4),
    (365.0, 0.2),
];

/// (max days since last release, credit); anything older still earns 0.2
const RELEASE_PLATEAUS: [(f64, f64); 4] = [(30.0, 1.0), (90.0, 0.8), (180.0, 0.6), (365.0, 0.4)];
const STALE_RELEASE_CREDIT: f64 = 0.2;

/// Per-dimension sub-scores behind a final score
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub stars: f64,
    pub forks: f64,
    pub watchers: f64,
    pub recent_activity: f64,
    pub open_issues: f64,
    pub open_prs: f64,
    pub release_frequency: f64,
    /// Sum of the flat weights of every indicator present
    pub indicator_bonus: f64,
}

/// Weighted scorer. Stateless apart from its weights, so it can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: Weights,
}

impl Scorer {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Score relative to the current time
    pub fn score(&self, attrs: &RepositoryAttributes) -> f64 {
        self.score_at(attrs, Utc::now())
    }

    /// Score relative to `now`. Archived repositories always score exactly 0.
    pub fn score_at(&self, attrs: &RepositoryAttributes, now: DateTime<Utc>) -> f64 {
        if attrs.is_archived {
            return 0.0;
        }

        let b = self.breakdown_at(attrs, now);
        let w = &self.weights;
        let raw = b.stars * w.stars
            + b.forks * w.forks
            + b.watchers * w.watchers
            + b.recent_activity * w.recent_activity
            + b.open_issues * w.open_issues
            + b.open_prs * w.open_prs
            + b.release_frequency * w.release_frequency
            + b.indicator_bonus;

        // max() first so a NaN collapses to 0 rather than 100
        (raw * 100.0).max(0.0).min(100.0)
    }

    /// Sub-scores for every dimension, ignoring the archived short-circuit
    pub fn breakdown_at(&self, attrs: &RepositoryAttributes, now: DateTime<Utc>) -> ScoreBreakdown {
        let w = &self.weights;
        let indicators = [
            (attrs.has_license, w.has_license),
            (attrs.has_cicd, w.has_cicd),
            (attrs.has_contributing, w.has_contributing),
            (attrs.has_readme, w.has_readme),
            (attrs.has_code_of_conduct, w.has_code_of_conduct),
            (attrs.has_security_policy, w.has_security),
        ];

        ScoreBreakdown {
            stars: popularity(attrs.stars, STARS_LOG_CEILING),
            forks: popularity(attrs.forks, FORKS_LOG_CEILING),
            watchers: popularity(attrs.watchers, WATCHERS_LOG_CEILING),
            recent_activity: activity_score(attrs.last_commit_at, now),
            open_issues: backlog_score(attrs.open_issues, ISSUES_LOG_DECAY),
            open_prs: backlog_score(attrs.open_prs, PRS_LOG_DECAY),
            release_frequency: release_score(attrs.release_count, attrs.last_release_at, now),
            indicator_bonus: indicators
                .iter()
                .filter(|(present, _)| *present)
                .map(|(_, weight)| weight)
                .sum(),
        }
    }
}

/// `log10(count + 1) / ceiling`, capped at 1
fn popularity(count: u64, ceiling: f64) -> f64 {
    ((count as f64 + 1.0).log10() / ceiling).min(1.0)
}

/// Full credit with nothing open, decaying logarithmically to a floor of 0
fn backlog_score(open: u64, decay: f64) -> f64 {
    if open == 0 {
        return 1.0;
    }
    (1.0 - (open as f64 + 1.0).log10() / decay).max(0.0)
}

fn days_between(earlier: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - earlier).num_milliseconds() as f64 / 86_400_000.0
}

fn plateau(days: f64, steps: &[(f64, f64)]) -> Option<f64> {
    steps
        .iter()
        .find(|(max_days, _)| days <= *max_days)
        .map(|(_, credit)| *credit)
}

fn activity_score(last_commit: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match last_commit {
        Some(at) => plateau(days_between(at, now), &ACTIVITY_PLATEAUS).unwrap_or(0.0),
        None => 0.0,
    }
}

/// Mean of release recency and release count, 0 without a dated release
fn release_score(count: u64, last_release: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let last_release = match last_release {
        Some(at) if count > 0 => at,
        _ => return 0.0,
    };

    let recency =
        plateau(days_between(last_release, now), &RELEASE_PLATEAUS).unwrap_or(STALE_RELEASE_CREDIT);
    let frequency = (count as f64 / RELEASE_COUNT_CEILING).min(1.0);

    (recency + frequency) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn healthy(now: DateTime<Utc>) -> RepositoryAttributes {
        let mut attrs = RepositoryAttributes::new("kubernetes", "kubernetes");
        attrs.stars = 10_000;
        attrs.forks = 1_000;
        attrs.open_issues = 0;
        attrs.open_prs = 0;
        attrs.last_commit_at = Some(now);
        attrs.has_license = true;
        attrs.has_cicd = true;
        attrs.has_contributing = true;
        attrs
    }

    fn inactive(now: DateTime<Utc>) -> RepositoryAttributes {
        let mut attrs = RepositoryAttributes::new("someone", "abandoned");
        attrs.stars = 100;
        attrs.forks = 10;
        attrs.open_issues = 50;
        attrs.open_prs = 20;
        attrs.last_commit_at = Some(now - Duration::days(730));
        attrs
    }

    #[test]
    fn test_healthy_repository_scores_high() {
        let now = Utc::now();
        let score = Scorer::default().score_at(&healthy(now), now);
        assert!(score >= 85.0, "score was {score}");
        assert!(score <= 100.0);
    }

    #[test]
    fn test_archived_is_exactly_zero() {
        let now = Utc::now();
        let mut attrs = healthy(now);
        attrs.is_archived = true;
        attrs.watchers = 50_000;
        attrs.release_count = 100;
        attrs.last_release_at = Some(now);
        attrs.has_readme = true;
        attrs.has_code_of_conduct = true;
        attrs.has_security_policy = true;

        assert_eq!(Scorer::default().score_at(&attrs, now), 0.0);
        assert_eq!(Scorer::default().score(&attrs), 0.0);
    }

    #[test]
    fn test_inactive_repository_scores_low() {
        let now = Utc::now();
        let score = Scorer::default().score_at(&inactive(now), now);
        assert!(score <= 30.0, "score was {score}");
        assert!(score >= 0.0);
    }

    #[test]
    fn test_medium_repository_lands_mid_range() {
        let now = Utc::now();
        let mut attrs = RepositoryAttributes::new("medium", "repo");
        attrs.stars = 1_000;
        attrs.forks = 100;
        attrs.open_issues = 10;
        attrs.open_prs = 5;
        attrs.last_commit_at = Some(now - Duration::days(45));
        attrs.has_license = true;
        attrs.has_cicd = true;

        let score = Scorer::default().score_at(&attrs, now);
        assert!((40.0..=70.0).contains(&score), "score was {score}");
    }

    #[test]
    fn test_score_is_deterministic() {
        let now = Utc::now();
        let attrs = inactive(now);
        let scorer = Scorer::default();

        let first = scorer.score_at(&attrs, now);
        let second = scorer.score_at(&attrs, now);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_score_stays_in_bounds_for_extremes() {
        let now = Utc::now();
        let mut maxed = healthy(now);
        maxed.stars = u64::MAX;
        maxed.forks = u64::MAX;
        maxed.watchers = u64::MAX;
        maxed.release_count = u64::MAX;
        maxed.last_release_at = Some(now);
        maxed.has_readme = true;
        maxed.has_code_of_conduct = true;
        maxed.has_security_policy = true;

        let mut drowning = RepositoryAttributes::new("x", "y");
        drowning.open_issues = u64::MAX;
        drowning.open_prs = u64::MAX;
        drowning.last_commit_at = Some(now + Duration::days(3));

        let heavy = Scorer::new(Weights {
            stars: 5.0,
            has_license: 5.0,
            ..Weights::default()
        });

        for scorer in [Scorer::default(), heavy] {
            for attrs in [&maxed, &drowning, &RepositoryAttributes::default()] {
                let score = scorer.score_at(attrs, now);
                assert!((0.0..=100.0).contains(&score), "score was {score}");
            }
        }
    }

    #[test]
    fn test_oversized_weights_clamp_to_hundred() {
        let now = Utc::now();
        let scorer = Scorer::new(Weights {
            has_license: 2.0,
            ..Weights::default()
        });
        assert_eq!(scorer.score_at(&healthy(now), now), 100.0);
    }

    #[test]
    fn test_unknown_everything_scores_from_backlog_only() {
        let now = Utc::now();
        let attrs = RepositoryAttributes::default();
        let w = Weights::default();

        let expected = (w.open_issues + w.open_prs) * 100.0;
        let score = Scorer::default().score_at(&attrs, now);
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_activity_plateaus() {
        let now = Utc::now();
        let cases = [
            (0, 1.0),
            (5, 1.0),
            (20, 0.8),
            (60, 0.6),
            (120, 0.4),
            (200, 0.2),
            (400, 0.0),
        ];
        for (days_ago, want) in cases {
            let got = activity_score(Some(now - Duration::days(days_ago)), now);
            assert_eq!(got, want, "{days_ago} days ago");
        }
        assert_eq!(activity_score(None, now), 0.0);
    }

    #[test]
    fn test_backlog_decay() {
        assert_eq!(backlog_score(0, ISSUES_LOG_DECAY), 1.0);
        assert_eq!(backlog_score(3, ISSUES_LOG_DECAY), 1.0 - 4f64.log10() / 5.0);
        assert_eq!(backlog_score(200, ISSUES_LOG_DECAY), 1.0 - 201f64.log10() / 5.0);
        assert_eq!(backlog_score(2, PRS_LOG_DECAY), 1.0 - 3f64.log10() / 4.0);
        assert_eq!(backlog_score(30, PRS_LOG_DECAY), 1.0 - 31f64.log10() / 4.0);
        assert_eq!(backlog_score(1_000_000, PRS_LOG_DECAY), 0.0);
    }

    #[test]
    fn test_popularity_compresses_outliers() {
        let one = popularity(1, STARS_LOG_CEILING) - popularity(0, STARS_LOG_CEILING);
        // 0 -> 10 is worth about 0.208, 10k -> 100k only 0.2 (capped at 1.0)
        let first_ten = popularity(10, STARS_LOG_CEILING) - popularity(0, STARS_LOG_CEILING);
        let huge = popularity(100_000, STARS_LOG_CEILING) - popularity(10_000, STARS_LOG_CEILING);

        assert!(one > 0.0);
        assert!(first_ten > huge);
        assert!(first_ten / 10.0 > huge / 90_000.0);
        assert_eq!(popularity(100_000, STARS_LOG_CEILING), 1.0);
        assert_eq!(popularity(0, FORKS_LOG_CEILING), 0.0);
        assert_eq!(popularity(10_000_000, WATCHERS_LOG_CEILING), 1.0);
    }

    #[test]
    fn test_release_score() {
        let now = Utc::now();

        assert_eq!(release_score(0, Some(now), now), 0.0);
        assert_eq!(release_score(5, None, now), 0.0);
        assert_eq!(release_score(5, Some(now - Duration::days(10)), now), (1.0 + 0.5) / 2.0);
        assert_eq!(release_score(20, Some(now - Duration::days(100)), now), (0.6 + 1.0) / 2.0);
        assert_eq!(release_score(1, Some(now - Duration::days(1000)), now), (0.2 + 0.1) / 2.0);
    }

    #[test]
    fn test_indicator_adds_its_flat_weight() {
        let now = Utc::now();
        let scorer = Scorer::default();
        let mut attrs = inactive(now);

        let without = scorer.score_at(&attrs, now);
        attrs.has_security_policy = true;
        let with = scorer.score_at(&attrs, now);

        let expected = scorer.weights().has_security * 100.0;
        assert!((with - without - expected).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_matches_components() {
        let now = Utc::now();
        let b = Scorer::default().breakdown_at(&healthy(now), now);

        assert_eq!(b.recent_activity, 1.0);
        assert_eq!(b.open_issues, 1.0);
        assert_eq!(b.open_prs, 1.0);
        assert_eq!(b.watchers, 0.0);
        assert_eq!(b.release_frequency, 0.0);
        assert_eq!(b.stars, (10_001f64).log10() / 5.0);

        let w = Weights::default();
        assert!((b.indicator_bonus - (w.has_license + w.has_cicd + w.has_contributing)).abs() < 1e-12);
    }
}
