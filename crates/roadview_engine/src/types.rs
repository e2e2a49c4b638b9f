use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

pub type JobId = String;
pub type UploadId = u64;

/// Job status object exactly as the backend returned it.
pub type StatusReport = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    UploadCompleted {
        upload_id: UploadId,
        filename: String,
        result: Result<JobId, BackendError>,
    },
    JobStatus {
        job_id: JobId,
        seq: u64,
        report: StatusReport,
    },
    ResultSaved {
        job_id: JobId,
        path: PathBuf,
    },
    ResultFailed {
        job_id: JobId,
        error: BackendError,
    },
    LiveUploadCompleted {
        result: Result<(), BackendError>,
    },
    StreamConnected,
    StreamFailed {
        error: BackendError,
    },
    FeedProgress {
        bytes: u64,
    },
    Metrics(MetricsReport),
}

/// Body of the live metrics endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MetricsReport {
    pub offset: f64,
    pub curvature: f64,
    pub fps: f64,
    #[serde(deserialize_with = "null_as_empty")]
    pub signs: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// Response body was not the expected JSON shape.
    Decode,
    /// Backend answered 2xx but refused the request.
    Rejected,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::Rejected => write!(f, "rejected by backend"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
