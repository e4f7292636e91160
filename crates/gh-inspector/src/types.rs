//! HTTP API request and response bodies

use crate::formatter::{OutputFormat, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest batch accepted by `POST /api/v1/score`
pub const MAX_REPOSITORIES_PER_REQUEST: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub repositories: Vec<String>,
    /// Accepted for compatibility; responses are always JSON
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

impl ScoreRequest {
    /// The requested format when it is something other than JSON
    pub fn ignored_output_format(&self) -> Option<OutputFormat> {
        self.output_format
            .filter(|format| !matches!(format, OutputFormat::Json))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub repositories: Vec<Record>,
    pub timestamp: DateTime<Utc>,
    pub total_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<RepositoryError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryError {
    pub repository: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

impl ServiceInfo {
    pub fn current() -> Self {
        let endpoints = [
            ("score", "/api/v1/score"),
            ("health", "/health"),
            ("metrics", "/metrics"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints,
        }
    }
}
