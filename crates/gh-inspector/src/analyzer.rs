//! Cache-aside analysis of repositories
//!
//! [`Analyzer`] is the only place that touches the persistent cache or the
//! remote API. Scored entities are written through to the cache; a cache hit
//! is returned as stored, score included.

use crate::error::AnalyzeError;
use repo_metrics::{
    CancellationToken, NoopRecorder, Recorder, RepositoryAttributes, RepositoryFetcher,
    SCHEMA_VERSION,
};
use repo_scoring::Scorer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use ttl_kv_cache::{generate_key, Cache};

/// Prefix mixed into every cache key
pub const CACHE_KEY_PREFIX: &str = "repo";

/// TTL used when none is configured
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Split `owner/name` into its two non-empty segments
pub fn parse_repository_id(id: &str) -> Result<(&str, &str), AnalyzeError> {
    let mut parts = id.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Ok((owner, name))
        }
        _ => Err(AnalyzeError::InvalidIdentifier(id.to_string())),
    }
}

/// Cache key for a repository identifier
pub fn cache_key(id: &str) -> String {
    generate_key([CACHE_KEY_PREFIX, id])
}

pub struct Analyzer {
    fetcher: Arc<dyn RepositoryFetcher>,
    scorer: Scorer,
    cache: Option<Arc<dyn Cache>>,
    cache_ttl: Duration,
    recorder: Arc<dyn Recorder>,
}

impl Analyzer {
    pub fn new(fetcher: Arc<dyn RepositoryFetcher>, scorer: Scorer) -> Self {
        Self {
            fetcher,
            scorer,
            cache: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            recorder: Arc::new(NoopRecorder),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn Recorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Analyze one `owner/name` identifier.
    ///
    /// `cancel` is handed to the fetcher untouched; cache reads and writes
    /// are local and ignore it.
    pub async fn analyze(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> Result<RepositoryAttributes, AnalyzeError> {
        let (owner, name) = parse_repository_id(id)?;
        let key = self.cache.as_ref().map(|_| cache_key(id));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(cached) = self.read_cached(cache.as_ref(), key, id).await {
                self.recorder.record_cache_hit();
                debug!(repository = %id, "Cache hit");
                return Ok(cached);
            }
            self.recorder.record_cache_miss();
            debug!(repository = %id, "Cache miss");
        }

        let mut attrs = self.fetch(cancel, id).await?;

        if attrs.owner.is_empty() {
            attrs.owner = owner.to_string();
        }
        if attrs.name.is_empty() {
            attrs.name = name.to_string();
        }
        attrs.schema_version = SCHEMA_VERSION;

        let score = self.scorer.score(&attrs);
        let attrs = attrs.with_score(score);

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            self.write_cached(cache.as_ref(), key, id, &attrs).await;
        }

        Ok(attrs)
    }

    /// Analyze every identifier in order. One failure never stops the rest.
    pub async fn analyze_all<I, S>(&self, cancel: &CancellationToken, ids: I) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcomes = Vec::new();

        for id in ids {
            let id = id.as_ref();
            let started = Instant::now();
            let result = self.analyze(cancel, id).await;
            let elapsed = started.elapsed();

            match &result {
                Ok(attrs) => {
                    self.recorder.record_repository_analysis("success", elapsed);
                    info!(
                        repository = %id,
                        score = attrs.score.unwrap_or_default(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Analyzed repository"
                    );
                }
                Err(e) => {
                    self.recorder.record_repository_analysis("error", elapsed);
                    warn!(repository = %id, error = %e, "Failed to analyze repository");
                }
            }

            outcomes.push(Outcome {
                repository: id.to_string(),
                result,
            });
        }

        BatchReport { outcomes }
    }

    async fn fetch(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> Result<RepositoryAttributes, AnalyzeError> {
        let cancelled = || AnalyzeError::Cancelled {
            repository: id.to_string(),
        };

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(cancelled()),
            result = self.fetcher.fetch(cancel, id) => result.map_err(|source| AnalyzeError::Fetch {
                repository: id.to_string(),
                source,
            }),
        }
    }

    async fn read_cached(
        &self,
        cache: &dyn Cache,
        key: &str,
        id: &str,
    ) -> Option<RepositoryAttributes> {
        let bytes = match cache.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(repository = %id, key = %key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_slice::<RepositoryAttributes>(&bytes) {
            Ok(attrs) if attrs.is_current_schema() => Some(attrs),
            Ok(attrs) => {
                debug!(
                    repository = %id,
                    cached_version = attrs.schema_version,
                    "Ignoring cached entry from another schema version"
                );
                None
            }
            Err(e) => {
                warn!(repository = %id, key = %key, error = %e, "Ignoring undecodable cache entry");
                None
            }
        }
    }

    async fn write_cached(&self, cache: &dyn Cache, key: &str, id: &str, attrs: &RepositoryAttributes) {
        let bytes = match serde_json::to_vec(attrs) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(repository = %id, error = %e, "Failed to encode entry for cache");
                return;
            }
        };

        if let Err(e) = cache.set(key, &bytes, self.cache_ttl).await {
            warn!(repository = %id, key = %key, error = %e, "Cache write failed");
        }
    }
}

/// Result of analyzing one identifier within a batch
#[derive(Debug)]
pub struct Outcome {
    pub repository: String,
    pub result: Result<RepositoryAttributes, AnalyzeError>,
}

/// Per-identifier results of [`Analyzer::analyze_all`], in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Successfully scored repositories, in input order
    pub fn repositories(&self) -> impl Iterator<Item = &RepositoryAttributes> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// `(identifier, error)` for every failure, in input order
    pub fn errors(&self) -> impl Iterator<Item = (&str, &AnalyzeError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.repository.as_str(), e)))
    }
}
