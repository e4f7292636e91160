//! GitHub GraphQL client for repository health attributes
//!
//! One GraphQL query per repository collects popularity counts, backlog
//! totals, the latest default-branch commit, release history and the root
//! tree entries used to detect CI, contributing guides and community files.
//!
//! # Example
//!
//! ```no_run
//! use github_client::GithubClient;
//! use repo_metrics::{CancellationToken, RepositoryFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let client = GithubClient::new("ghp_example")?;
//! let cancel = CancellationToken::new();
//!
//! let attrs = client.fetch(&cancel, "rust-lang/rust").await?;
//! println!("{} has {} stars", attrs.full_name(), attrs.stars);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::GithubClient;
pub use error::{GithubError, Result};
pub use types::{GraphQlResponse, RepositoryNode};
