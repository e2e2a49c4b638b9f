//! State for the single-stream live mode: upload, feed health and metrics.

/// Offset that maps to either edge of the bar.
pub const OFFSET_FULL_SCALE: f64 = 2.0;

pub const NO_SIGNS_PLACEHOLDER: &str = "No signs detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamStatus {
    #[default]
    Idle,
    Uploading,
    UploadFailed,
    Starting,
    Live,
    ConnectionFailed,
}

impl StreamStatus {
    pub fn label(self) -> &'static str {
        match self {
            StreamStatus::Idle => "Waiting for upload",
            StreamStatus::Uploading => "Uploading...",
            StreamStatus::UploadFailed => "Error Uploading",
            StreamStatus::Starting => "Initializing...",
            StreamStatus::Live => "Processing Live",
            StreamStatus::ConnectionFailed => "Stream Connection Failed",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, StreamStatus::UploadFailed | StreamStatus::ConnectionFailed)
    }
}

/// One sample from the metrics endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsSample {
    pub offset: f64,
    pub curvature: f64,
    pub fps: f64,
    pub signs: Vec<String>,
}

/// Maps a lateral offset onto a 0..=100 bar with the center at 50.
pub fn offset_bar_percentage(offset: f64) -> f64 {
    (50.0 + offset * (50.0 / OFFSET_FULL_SCALE)).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveState {
    pub(crate) status: StreamStatus,
    pub(crate) metrics: Option<MetricsSample>,
    pub(crate) feed_bytes: u64,
    pub(crate) last_error: Option<String>,
}

impl LiveState {
    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn metrics(&self) -> Option<&MetricsSample> {
        self.metrics.as_ref()
    }
}
