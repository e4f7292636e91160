//! Error types for the GitHub client

use std::fmt;

/// Errors that can occur when talking to the GitHub GraphQL API
#[derive(Debug)]
pub enum GithubError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// Failed to parse JSON response
    Json(serde_json::Error),
    /// Non-success HTTP status
    Api { status: u16, message: String },
    /// The query ran but GraphQL reported errors
    GraphQl(Vec<String>),
    /// Repository does not exist or is not visible to the token
    NotFound(String),
    /// Identifier is not of the form `owner/name`
    InvalidRepository(String),
    /// Caller cancelled before the response arrived
    Cancelled,
}

impl fmt::Display for GithubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "GitHub HTTP error: {}", e),
            Self::Json(e) => write!(f, "GitHub JSON parse error: {}", e),
            Self::Api { status, message } => write!(f, "GitHub API error ({}): {}", status, message),
            Self::GraphQl(messages) => write!(f, "GitHub GraphQL error: {}", messages.join("; ")),
            Self::NotFound(repo) => write!(f, "Repository not found: {}", repo),
            Self::InvalidRepository(repo) => {
                write!(f, "Invalid repository format, expected owner/name: {}", repo)
            }
            Self::Cancelled => write!(f, "GitHub request cancelled"),
        }
    }
}

impl std::error::Error for GithubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GithubError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for GithubError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for GitHub client operations
pub type Result<T> = std::result::Result<T, GithubError>;
