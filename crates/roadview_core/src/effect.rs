use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    UploadFile {
        upload_id: crate::UploadId,
        path: PathBuf,
    },
    StartPolling { job_id: crate::JobId },
    StopPolling { job_id: crate::JobId },
    LoadResult {
        job_id: crate::JobId,
        filename: String,
    },
    UploadLiveFile { path: PathBuf },
    StartStream,
}
