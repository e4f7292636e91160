//! Error types for gh-inspector

use repo_metrics::FetchError;
use std::fmt;

/// Failure analyzing a single repository
#[derive(Debug)]
pub enum AnalyzeError {
    /// Identifier is not exactly `owner/name`
    InvalidIdentifier(String),
    /// The remote fetch failed; the source is left opaque
    Fetch {
        repository: String,
        source: FetchError,
    },
    /// The caller cancelled before the fetch completed
    Cancelled { repository: String },
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzeError::InvalidIdentifier(id) => write!(
                f,
                "Invalid repository format '{}', expected owner/name",
                id
            ),
            AnalyzeError::Fetch { repository, source } => {
                write!(f, "Failed to fetch {}: {}", repository, source)
            }
            AnalyzeError::Cancelled { repository } => {
                write!(f, "Analysis of {} was cancelled", repository)
            }
        }
    }
}

impl std::error::Error for AnalyzeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalyzeError::Fetch { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Top-level errors for the CLI and server
#[derive(Debug)]
pub enum InspectorError {
    Config(String),
    Io(Box<std::io::Error>),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    Cache(ttl_kv_cache::CacheError),
    Github(github_client::GithubError),
    Metrics(prometheus::Error),
    Server(String),
}

impl fmt::Display for InspectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectorError::Config(msg) => write!(f, "Configuration error: {}", msg),
            InspectorError::Io(err) => write!(f, "IO error: {}", err),
            InspectorError::Yaml(err) => write!(f, "Config file error: {}", err),
            InspectorError::Json(err) => write!(f, "JSON error: {}", err),
            InspectorError::Cache(err) => write!(f, "{}", err),
            InspectorError::Github(err) => write!(f, "{}", err),
            InspectorError::Metrics(err) => write!(f, "Metrics error: {}", err),
            InspectorError::Server(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for InspectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InspectorError::Io(err) => Some(err.as_ref()),
            InspectorError::Yaml(err) => Some(err),
            InspectorError::Json(err) => Some(err),
            InspectorError::Cache(err) => Some(err),
            InspectorError::Github(err) => Some(err),
            InspectorError::Metrics(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InspectorError {
    fn from(err: std::io::Error) -> Self {
        InspectorError::Io(Box::new(err))
    }
}

impl From<serde_yaml::Error> for InspectorError {
    fn from(err: serde_yaml::Error) -> Self {
        InspectorError::Yaml(err)
    }
}

impl From<serde_json::Error> for InspectorError {
    fn from(err: serde_json::Error) -> Self {
        InspectorError::Json(err)
    }
}

impl From<ttl_kv_cache::CacheError> for InspectorError {
    fn from(err: ttl_kv_cache::CacheError) -> Self {
        InspectorError::Cache(err)
    }
}

impl From<github_client::GithubError> for InspectorError {
    fn from(err: github_client::GithubError) -> Self {
        InspectorError::Github(err)
    }
}

impl From<prometheus::Error> for InspectorError {
    fn from(err: prometheus::Error) -> Self {
        InspectorError::Metrics(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for InspectorError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        InspectorError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InspectorError>;
