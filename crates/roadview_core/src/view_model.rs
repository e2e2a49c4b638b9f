use crate::live::{
    offset_bar_percentage, LiveState, MetricsSample, StreamStatus, NO_SIGNS_PLACEHOLDER,
};
use crate::{ArtifactState, JobId, JobStatus};

/// Immutable snapshot handed to the renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub uploading: bool,
    pub pending_uploads: usize,
    pub last_error: Option<String>,
    pub job_count: usize,
    pub jobs: Vec<JobRowView>,
    pub active_job: Option<JobId>,
    pub result: ResultPane,
    pub live: LiveView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub short_id: String,
    pub filename: String,
    pub status: JobStatus,
    pub progress: f64,
    pub is_active: bool,
}

impl JobRowView {
    /// Percentage while processing, the status name otherwise.
    pub fn badge(&self) -> String {
        match self.status {
            JobStatus::Processing => format!("{}%", (self.progress * 100.0).round() as u32),
            status => status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultPane {
    /// Nothing selected, or the selected job has no finished result.
    #[default]
    Placeholder,
    Artifact {
        job_id: JobId,
        download_path: String,
        legend_visible: bool,
        artifact: Option<ArtifactState>,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveView {
    pub status: StreamStatus,
    pub status_label: &'static str,
    pub is_error: bool,
    pub last_error: Option<String>,
    pub feed_bytes: u64,
    pub metrics: Option<MetricsView>,
}

impl LiveView {
    pub(crate) fn from_state(live: &LiveState) -> Self {
        Self {
            status: live.status,
            status_label: live.status.label(),
            is_error: live.status.is_error(),
            last_error: live.last_error.clone(),
            feed_bytes: live.feed_bytes,
            metrics: live.metrics.as_ref().map(MetricsView::from_sample),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsView {
    pub offset_text: String,
    pub curvature_text: String,
    pub fps_text: String,
    pub bar_percentage: f64,
    pub signs: Vec<String>,
    pub signs_placeholder: Option<&'static str>,
}

impl MetricsView {
    pub fn from_sample(sample: &MetricsSample) -> Self {
        let signs_placeholder = sample.signs.is_empty().then_some(NO_SIGNS_PLACEHOLDER);
        Self {
            offset_text: format!("{:.2}", sample.offset),
            // Half-up rounding, -2.5 shows as -2.
            curvature_text: format!("{}", (sample.curvature + 0.5).floor() as i64),
            fps_text: format!("{:.1}", sample.fps),
            bar_percentage: offset_bar_percentage(sample.offset),
            signs: sample.signs.clone(),
            signs_placeholder,
        }
    }
}
