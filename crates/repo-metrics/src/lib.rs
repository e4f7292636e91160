//! Shared repository metric types
//!
//! [`RepositoryAttributes`] is the canonical bundle produced by a
//! [`RepositoryFetcher`], scored by `repo-scoring` and cached by the analyzer.
//! [`Recorder`] is the observability capability injected by callers.

mod fetcher;
mod recorder;
mod repository;

pub use fetcher::{FetchError, RepositoryFetcher};
pub use recorder::{NoopRecorder, Recorder};
pub use repository::{RepositoryAttributes, SCHEMA_VERSION};

/// Re-exported so collaborators agree on the cancellation type
pub use tokio_util::sync::CancellationToken;
