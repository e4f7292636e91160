//! Remote fetch contract

use crate::repository::RepositoryAttributes;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Error surfaced by a fetcher. Callers wrap it with context but never inspect it.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Retrieves the attributes of one repository in a single round trip.
///
/// Implementations must return promptly with an error when `cancel` is
/// already cancelled, and should abort in-flight I/O when it fires. The
/// returned bundle has no score.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        full_name: &str,
    ) -> Result<RepositoryAttributes, FetchError>;
}
