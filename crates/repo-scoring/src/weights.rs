//! Weight configuration

use serde::{Deserialize, Serialize};

/// `scoring:` section of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
}

/// One coefficient per scoring dimension.
///
/// Continuous dimensions multiply a sub-score in `[0, 1]`; the `has_*`
/// weights are flat bonuses added when the indicator is present. Nothing
/// forces the weights to sum to one, the defaults just do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub stars: f64,
    pub forks: f64,
    pub watchers: f64,
    pub recent_activity: f64,
    pub open_issues: f64,
    pub open_prs: f64,
    pub release_frequency: f64,
    pub has_license: f64,
    pub has_cicd: f64,
    pub has_contributing: f64,
    pub has_readme: f64,
    pub has_code_of_conduct: f64,
    pub has_security: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            stars: 0.20,
            forks: 0.08,
            watchers: 0.01,
            recent_activity: 0.25,
            open_issues: 0.12,
            open_prs: 0.06,
            release_frequency: 0.03,
            has_license: 0.08,
            has_cicd: 0.08,
            has_contributing: 0.07,
            has_readme: 0.01,
            has_code_of_conduct: 0.005,
            has_security: 0.005,
        }
    }
}

impl Weights {
    /// Replace every zero, negative or non-finite weight with its default
    pub fn or_defaults(self) -> Self {
        let d = Self::default();
        let pick = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };

        Self {
            stars: pick(self.stars, d.stars),
            forks: pick(self.forks, d.forks),
            watchers: pick(self.watchers, d.watchers),
            recent_activity: pick(self.recent_activity, d.recent_activity),
            open_issues: pick(self.open_issues, d.open_issues),
            open_prs: pick(self.open_prs, d.open_prs),
            release_frequency: pick(self.release_frequency, d.release_frequency),
            has_license: pick(self.has_license, d.has_license),
            has_cicd: pick(self.has_cicd, d.has_cicd),
            has_contributing: pick(self.has_contributing, d.has_contributing),
            has_readme: pick(self.has_readme, d.has_readme),
            has_code_of_conduct: pick(self.has_code_of_conduct, d.has_code_of_conduct),
            has_security: pick(self.has_security, d.has_security),
        }
    }

    /// Sum of all coefficients
    pub fn total(&self) -> f64 {
        self.stars
            + self.forks
            + self.watchers
            + self.recent_activity
            + self.open_issues
            + self.open_prs
            + self.release_frequency
            + self.has_license
            + self.has_cicd
            + self.has_contributing
            + self.has_readme
            + self.has_code_of_conduct
            + self.has_security
    }
}
