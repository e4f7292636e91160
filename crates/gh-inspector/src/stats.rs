//! Prometheus metrics for requests, analyses and the cache
//!
//! Every metric lives in a registry owned by the recorder, so several
//! recorders (one per test, say) never collide.

use prometheus::proto::MetricFamily;
use prometheus::{
    register_histogram_vec_with_registry, register_histogram_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use repo_metrics::Recorder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const HTTP_REQUESTS: &str = "gh_inspector_http_requests_total";
const HTTP_DURATION: &str = "gh_inspector_http_request_duration_seconds";

/// Recorder that keeps labelled Prometheus counters and histograms
#[derive(Clone)]
pub struct StatsRecorder {
    registry: Registry,
    http_requests: IntCounterVec,
    http_duration: HistogramVec,
    analyses: IntCounterVec,
    analysis_duration: Histogram,
    cache_hits: IntCounter,
    cache_misses: IntCounter,
}

/// Requests seen for one method, endpoint and status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestCount {
    pub method: String,
    pub endpoint: String,
    pub status: String,
    pub count: u64,
}

/// Latency totals for one method and endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointLatency {
    pub method: String,
    pub endpoint: String,
    pub count: u64,
    pub total_seconds: f64,
}

/// Point-in-time copy of a [`StatsRecorder`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub http_requests: Vec<RequestCount>,
    pub http_durations: Vec<EndpointLatency>,
    pub analyses_succeeded: u64,
    pub analyses_failed: u64,
    /// Summed over successful analyses only
    pub analysis_duration_seconds: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Hits over lookups, 0 before the first lookup
    pub cache_hit_rate: f64,
}

impl StatsSnapshot {
    pub fn total_requests(&self) -> u64 {
        self.http_requests.iter().map(|r| r.count).sum()
    }

    /// Requests answered with a 4xx or 5xx status
    pub fn failed_requests(&self) -> u64 {
        self.http_requests
            .iter()
            .filter(|r| r.status.starts_with('4') || r.status.starts_with('5'))
            .map(|r| r.count)
            .sum()
    }

    pub fn requests_to(&self, endpoint: &str) -> u64 {
        self.http_requests
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .map(|r| r.count)
            .sum()
    }
}

impl StatsRecorder {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        Ok(Self {
            http_requests: register_int_counter_vec_with_registry!(
                Opts::new(HTTP_REQUESTS, "Total number of HTTP requests"),
                &["method", "endpoint", "status"],
                registry
            )?,
            http_duration: register_histogram_vec_with_registry!(
                HistogramOpts::new(HTTP_DURATION, "HTTP request duration in seconds"),
                &["method", "endpoint"],
                registry
            )?,
            analyses: register_int_counter_vec_with_registry!(
                Opts::new(
                    "gh_inspector_repository_analysis_total",
                    "Total number of repository analyses"
                ),
                &["status"],
                registry
            )?,
            analysis_duration: register_histogram_with_registry!(
                HistogramOpts::new(
                    "gh_inspector_repository_analysis_duration_seconds",
                    "Repository analysis duration in seconds"
                ),
                registry
            )?,
            cache_hits: register_int_counter_with_registry!(
                Opts::new("gh_inspector_cache_hits_total", "Total number of cache hits"),
                registry
            )?,
            cache_misses: register_int_counter_with_registry!(
                Opts::new(
                    "gh_inspector_cache_misses_total",
                    "Total number of cache misses"
                ),
                registry
            )?,
            registry,
        })
    }

    /// Content type of [`StatsRecorder::render`]
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Every metric in the Prometheus text exposition format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let families = self.registry.gather();
        let cache_hits = self.cache_hits.get();
        let cache_misses = self.cache_misses.get();
        let lookups = cache_hits + cache_misses;

        StatsSnapshot {
            http_requests: request_counts(&families),
            http_durations: endpoint_latencies(&families),
            analyses_succeeded: self.analyses.with_label_values(&["success"]).get(),
            analyses_failed: self.analyses.with_label_values(&["error"]).get(),
            analysis_duration_seconds: self.analysis_duration.get_sample_sum(),
            cache_hits,
            cache_misses,
            cache_hit_rate: if lookups == 0 {
                0.0
            } else {
                cache_hits as f64 / lookups as f64
            },
        }
    }
}

fn label<'a>(metric: &'a prometheus::proto::Metric, name: &str) -> &'a str {
    metric
        .get_label()
        .iter()
        .find(|pair| pair.get_name() == name)
        .map(|pair| pair.get_value())
        .unwrap_or_default()
}

fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a [prometheus::proto::Metric] {
    families
        .iter()
        .find(|f| f.get_name() == name)
        .map(|f| f.get_metric())
        .unwrap_or_default()
}

fn request_counts(families: &[MetricFamily]) -> Vec<RequestCount> {
    family(families, HTTP_REQUESTS)
        .iter()
        .map(|m| RequestCount {
            method: label(m, "method").to_string(),
            endpoint: label(m, "endpoint").to_string(),
            status: label(m, "status").to_string(),
            count: m.get_counter().get_value() as u64,
        })
        .collect()
}

fn endpoint_latencies(families: &[MetricFamily]) -> Vec<EndpointLatency> {
    family(families, HTTP_DURATION)
        .iter()
        .map(|m| EndpointLatency {
            method: label(m, "method").to_string(),
            endpoint: label(m, "endpoint").to_string(),
            count: m.get_histogram().get_sample_count(),
            total_seconds: m.get_histogram().get_sample_sum(),
        })
        .collect()
}

impl Recorder for StatsRecorder {
    fn record_http_request(&self, method: &str, endpoint: &str, status: &str) {
        self.http_requests
            .with_label_values(&[method, endpoint, status])
            .inc();
    }

    fn record_http_duration(&self, method: &str, endpoint: &str, duration: Duration) {
        self.http_duration
            .with_label_values(&[method, endpoint])
            .observe(duration.as_secs_f64());
    }

    fn record_repository_analysis(&self, status: &str, duration: Duration) {
        self.analyses.with_label_values(&[status]).inc();
        if status == "success" {
            self.analysis_duration.observe(duration.as_secs_f64());
        }
    }

    fn record_cache_hit(&self) {
        self.cache_hits.inc();
    }

    fn record_cache_miss(&self) {
        self.cache_misses.inc();
    }
}
