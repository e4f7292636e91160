//! gh-inspector: fetch, cache and score GitHub repository health
//!
//! The [`Analyzer`] composes a [`repo_metrics::RepositoryFetcher`], an optional
//! [`ttl_kv_cache::Cache`] and a [`repo_scoring::Scorer`]. The CLI and the
//! HTTP server in this crate are thin shells around it.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod formatter;
pub mod server;
pub mod stats;
pub mod types;

pub use analyzer::{parse_repository_id, Analyzer, BatchReport, Outcome};
pub use config::Config;
pub use error::{AnalyzeError, InspectorError, Result};
pub use formatter::{format_records, OutputFormat, Record};
pub use server::{create_router, start_server, ServerState, SharedState};
pub use stats::{EndpointLatency, RequestCount, StatsRecorder, StatsSnapshot};
