use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Produces the value of the `t` query parameter on the live feed URL.
pub type CacheBustFn = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    pub base_url: String,
    /// Where downloaded result artifacts are written.
    pub output_dir: PathBuf,
    pub poll_interval: Duration,
    pub metrics_interval: Duration,
    /// Grace period for the backend to start processing before the live feed
    /// and metrics loop are opened.
    pub stream_start_delay: Duration,
    pub connect_timeout: Duration,
    /// Applies to status and metrics requests.
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
    pub cache_bust: CacheBustFn,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir,
            poll_interval: Duration::from_millis(1000),
            metrics_interval: Duration::from_millis(500),
            stream_start_delay: Duration::from_millis(1000),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(600),
            cache_bust: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("base_url", &self.base_url)
            .field("output_dir", &self.output_dir)
            .field("poll_interval", &self.poll_interval)
            .field("metrics_interval", &self.metrics_interval)
            .field("stream_start_delay", &self.stream_start_delay)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("upload_timeout", &self.upload_timeout)
            .finish_non_exhaustive()
    }
}
