//! GitHub GraphQL HTTP client

use crate::error::{GithubError, Result};
use crate::types::{GraphQlResponse, RepositoryData};
use async_trait::async_trait;
use repo_metrics::{CancellationToken, FetchError, RepositoryAttributes, RepositoryFetcher};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const REPOSITORY_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    owner { login }
    name
    description
    stargazerCount
    forkCount
    isArchived
    isSecurityPolicyEnabled
    primaryLanguage { name }
    watchers { totalCount }
    issues(states: OPEN) { totalCount }
    pullRequests(states: OPEN) { totalCount }
    defaultBranchRef {
      target {
        ... on Commit {
          history(first: 1) { nodes { committedDate } }
        }
      }
    }
    licenseInfo { key }
    codeOfConduct { name }
    object(expression: "HEAD:") {
      ... on Tree { entries { name } }
    }
    releases(first: 1, orderBy: {field: CREATED_AT, direction: DESC}) {
      totalCount
      nodes { publishedAt }
    }
  }
}
"#;

/// Client for the GitHub GraphQL API
///
/// Every request carries the configured token as a bearer credential. The
/// client is cheap to clone and safe to share between tasks.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl GithubClient {
    /// Public GitHub GraphQL endpoint
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.github.com/graphql";
    /// Per-request timeout used by [`GithubClient::new`]
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client for api.github.com with the default timeout
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(Self::DEFAULT_ENDPOINT, token, Self::DEFAULT_TIMEOUT)
    }

    /// Create a client against a custom endpoint (GitHub Enterprise, tests)
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gh-inspector/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch attributes for `owner/name`
    pub async fn repository(&self, full_name: &str) -> Result<RepositoryAttributes> {
        let (owner, name) = full_name
            .split_once('/')
            .filter(|(o, n)| !o.is_empty() && !n.is_empty() && !n.contains('/'))
            .ok_or_else(|| GithubError::InvalidRepository(full_name.to_string()))?;

        let body = json!({
            "query": REPOSITORY_QUERY,
            "variables": { "owner": owner, "name": name },
        });

        debug!(repository = %full_name, endpoint = %self.endpoint, "Querying GitHub");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GithubError::Api {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let parsed: GraphQlResponse<RepositoryData> = serde_json::from_slice(&bytes)?;

        if parsed
            .errors
            .iter()
            .any(|e| e.kind.as_deref() == Some("NOT_FOUND"))
        {
            return Err(GithubError::NotFound(full_name.to_string()));
        }
        if !parsed.errors.is_empty() {
            return Err(GithubError::GraphQl(
                parsed.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        parsed
            .data
            .and_then(|d| d.repository)
            .map(|node| node.into_attributes())
            .ok_or_else(|| GithubError::NotFound(full_name.to_string()))
    }
}

#[async_trait]
impl RepositoryFetcher for GithubClient {
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        full_name: &str,
    ) -> std::result::Result<RepositoryAttributes, FetchError> {
        if cancel.is_cancelled() {
            return Err(GithubError::Cancelled.into());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GithubError::Cancelled.into()),
            result = self.repository(full_name) => result.map_err(Into::into),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/graphql", addr)
    }

    fn client(endpoint: String) -> GithubClient {
        GithubClient::with_endpoint(endpoint, "test-token", Duration::from_secs(5)).unwrap()
    }

    async fn echo_repository(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer test-token") {
            return (StatusCode::UNAUTHORIZED, "Bad credentials").into_response();
        }
        let owner = body["variables"]["owner"].clone();
        let name = body["variables"]["name"].clone();
        Json(json!({
            "data": {
                "repository": {
                    "owner": { "login": owner },
                    "name": name,
                    "stargazerCount": 42,
                    "forkCount": 7,
                    "isArchived": false,
                    "licenseInfo": { "key": "apache-2.0" },
                    "object": { "entries": [{ "name": ".travis.yml" }] }
                }
            }
        }))
        .into_response()
    }

    #[tokio::test]
    async fn test_fetch_sends_token_and_variables() {
        let endpoint = serve(Router::new().route("/graphql", post(echo_repository))).await;
        let attrs = client(endpoint)
            .fetch(&CancellationToken::new(), "octo/widgets")
            .await
            .unwrap();

        assert_eq!(attrs.full_name(), "octo/widgets");
        assert_eq!(attrs.stars, 42);
        assert_eq!(attrs.forks, 7);
        assert!(attrs.has_license);
        assert!(attrs.has_cicd);
        assert!(attrs.last_commit_at.is_none());
    }

    #[tokio::test]
    async fn test_bad_credentials_is_api_error() {
        let endpoint = serve(Router::new().route("/graphql", post(echo_repository))).await;
        let client =
            GithubClient::with_endpoint(endpoint, "wrong", Duration::from_secs(5)).unwrap();

        match client.repository("octo/widgets").await {
            Err(GithubError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_repository_is_not_found() {
        let router = Router::new().route(
            "/graphql",
            post(|| async {
                Json(json!({
                    "data": { "repository": null },
                    "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve" }]
                }))
            }),
        );
        let endpoint = serve(router).await;

        let err = client(endpoint).repository("ghost/none").await.unwrap_err();
        assert!(matches!(err, GithubError::NotFound(ref r) if r == "ghost/none"));
    }

    #[tokio::test]
    async fn test_graphql_errors_are_surfaced() {
        let router = Router::new().route(
            "/graphql",
            post(|| async {
                Json(json!({
                    "data": null,
                    "errors": [{ "message": "API rate limit exceeded" }]
                }))
            }),
        );
        let endpoint = serve(router).await;

        let err = client(endpoint).repository("octo/widgets").await.unwrap_err();
        match err {
            GithubError::GraphQl(messages) => {
                assert_eq!(messages, vec!["API rate limit exceeded".to_string()])
            }
            other => panic!("expected GraphQl error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_identifier_never_sends() {
        let client = client("http://127.0.0.1:9/graphql".to_string());
        for bad in ["", "noslash", "/name", "owner/", "a/b/c"] {
            let err = client.repository(bad).await.unwrap_err();
            assert!(matches!(err, GithubError::InvalidRepository(_)), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_cancelled_token_fails_fast() {
        let client = client("http://127.0.0.1:9/graphql".to_string());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client.fetch(&cancel, "octo/widgets").await.unwrap_err();
        let err = err.downcast::<GithubError>().unwrap();
        assert!(matches!(*err, GithubError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_during_slow_response() {
        let router = Router::new().route(
            "/graphql",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({ "data": { "repository": null } }))
            }),
        );
        let endpoint = serve(router).await;
        let client = client(endpoint);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = client.fetch(&cancel, "octo/widgets").await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(err.to_string().contains("cancelled"));
    }
}
