use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked a file for upload in jobs mode.
    FileSubmitted { path: PathBuf },
    /// Backend accepted an upload and assigned a job id.
    UploadSucceeded {
        upload_id: crate::UploadId,
        job_id: crate::JobId,
        filename: String,
    },
    /// Upload transport failure, non-2xx or a response without a job id.
    UploadFailed {
        upload_id: crate::UploadId,
        filename: String,
        reason: String,
    },
    /// One poll tick answered for a job. `seq` increases per job.
    JobStatusReceived {
        job_id: crate::JobId,
        seq: u64,
        report: crate::StatusReport,
    },
    /// User selected a job from the list.
    JobSelected { job_id: crate::JobId },
    /// Result artifact for a job was written to disk.
    ResultSaved { job_id: crate::JobId, path: PathBuf },
    /// Result artifact for a job could not be fetched or written.
    ResultFailed { job_id: crate::JobId, reason: String },
    /// User picked a file for the live single-stream mode.
    LiveFileSubmitted { path: PathBuf },
    /// Live upload answered with `success: true`.
    LiveUploadAccepted,
    /// Live upload failed or was rejected.
    LiveUploadFailed { reason: String },
    /// Live feed answered and started streaming.
    StreamConnected,
    /// Live feed failed to load or broke mid-stream.
    StreamFailed { reason: String },
    /// Total bytes received on the live feed so far.
    FeedProgress { bytes: u64 },
    /// Metrics poll answered.
    MetricsReceived(crate::MetricsSample),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
