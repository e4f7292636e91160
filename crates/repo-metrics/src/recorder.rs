use std::time::Duration;

/// Sink for request and analysis measurements, passed in by the caller
pub trait Recorder: Send + Sync {
    fn record_http_request(&self, method: &str, endpoint: &str, status: &str);
    fn record_http_duration(&self, method: &str, endpoint: &str, duration: Duration);
    /// `status` is `"success"` or `"error"`
    fn record_repository_analysis(&self, status: &str, duration: Duration);
    fn record_cache_hit(&self);
    fn record_cache_miss(&self);
}

/// Recorder that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl Recorder for NoopRecorder {
    fn record_http_request(&self, _method: &str, _endpoint: &str, _status: &str) {}
    fn record_http_duration(&self, _method: &str, _endpoint: &str, _duration: Duration) {}
    fn record_repository_analysis(&self, _status: &str, _duration: Duration) {}
    fn record_cache_hit(&self) {}
    fn record_cache_miss(&self) {}
}
