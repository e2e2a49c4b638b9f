use std::fmt;

use roadview_logging::{roadview_debug, roadview_warn};
use serde_json::{Map, Value};

/// Backend-assigned job identifier. Opaque to the client.
pub type JobId = String;

/// Raw status report as returned by the backend for one job.
pub type StatusReport = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "queued" => Some(Self::Queued),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Processing => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Status only moves forward; re-reporting the current status is allowed.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of merging one status report into a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl StatusChange {
    pub fn entered(&self, status: JobStatus) -> bool {
        self.from != status && self.to == status
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: JobId,
    filename: String,
    status: JobStatus,
    progress: f64,
    extra: Map<String, Value>,
}

impl Job {
    /// A freshly uploaded job: queued with no progress.
    pub fn queued(id: impl Into<JobId>, filename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            status: JobStatus::Queued,
            progress: 0.0,
            extra: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Backend fields that are not modeled explicitly (`output_url`, `error`, ...).
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Overwrites the fields present in `report` and keeps everything else.
    ///
    /// `id` and `filename` are immutable. A status that would move the job
    /// backwards or out of a terminal state is dropped, the rest of the report
    /// still applies.
    pub fn merge(&mut self, report: &StatusReport) -> StatusChange {
        let from = self.status;
        for (key, value) in report {
            match key.as_str() {
                "id" | "filename" => {}
                "status" => self.merge_status(value),
                "progress" => match value.as_f64() {
                    Some(progress) => self.progress = progress.clamp(0.0, 1.0),
                    None => roadview_debug!(
                        "Job {} reported non-numeric progress {}",
                        self.id,
                        value
                    ),
                },
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
        StatusChange {
            from,
            to: self.status,
        }
    }

    fn merge_status(&mut self, value: &Value) {
        let Some(next) = value.as_str().and_then(JobStatus::parse) else {
            roadview_warn!("Job {} reported unknown status {}", self.id, value);
            return;
        };
        if self.status.can_transition_to(next) {
            self.status = next;
        } else {
            roadview_warn!(
                "Job {} ignoring status transition {} -> {}",
                self.id,
                self.status,
                next
            );
        }
    }
}
