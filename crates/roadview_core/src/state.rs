use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use roadview_logging::roadview_debug;

use crate::live::LiveState;
use crate::view_model::{AppViewModel, JobRowView, LiveView, ResultPane};
use crate::{
    download_path, Job, JobId, JobRegistry, JobStatus, Selection, StatusChange, StatusReport,
};

/// Client-side handle for one upload request, assigned before the backend
/// has produced a job id.
pub type UploadId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactState {
    Loading,
    Saved(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    registry: JobRegistry,
    selection: Selection,
    polling: BTreeSet<JobId>,
    applied_seq: BTreeMap<JobId, u64>,
    pending_uploads: BTreeMap<UploadId, String>,
    next_upload_id: UploadId,
    failed_uploads: usize,
    last_error: Option<String>,
    artifacts: BTreeMap<JobId, ArtifactState>,
    pub(crate) live: LiveState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn live(&self) -> &LiveState {
        &self.live
    }

    /// Whether the core has asked for this job to be polled and not yet
    /// asked for it to stop.
    pub fn is_polling(&self, job_id: &str) -> bool {
        self.polling.contains(job_id)
    }

    pub fn polling_count(&self) -> usize {
        self.polling.len()
    }

    pub fn artifact(&self, job_id: &str) -> Option<&ArtifactState> {
        self.artifacts.get(job_id)
    }

    pub fn failed_upload_count(&self) -> usize {
        self.failed_uploads
    }

    /// Nothing left to wait for in jobs mode: no upload in flight, every job
    /// terminal and no result download pending.
    pub fn is_settled(&self) -> bool {
        self.pending_uploads.is_empty()
            && self.registry.all_terminal()
            && !self
                .artifacts
                .values()
                .any(|artifact| matches!(artifact, ArtifactState::Loading))
    }

    pub fn view(&self) -> AppViewModel {
        let jobs = self
            .registry
            .iter()
            .map(|job| JobRowView {
                job_id: job.id().to_string(),
                short_id: job.id().chars().take(8).collect(),
                filename: job.filename().to_string(),
                status: job.status(),
                progress: job.progress(),
                is_active: self.selection.is_active(job.id()),
            })
            .collect();

        AppViewModel {
            uploading: !self.pending_uploads.is_empty(),
            pending_uploads: self.pending_uploads.len(),
            last_error: self.last_error.clone(),
            job_count: self.registry.len(),
            jobs,
            active_job: self.selection.active().map(ToOwned::to_owned),
            result: self.result_pane(),
            live: LiveView::from_state(&self.live),
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_upload(&mut self, filename: String) -> UploadId {
        self.next_upload_id += 1;
        let upload_id = self.next_upload_id;
        self.pending_uploads.insert(upload_id, filename);
        self.last_error = None;
        self.mark_dirty();
        upload_id
    }

    pub(crate) fn finish_upload(&mut self, upload_id: UploadId) {
        if self.pending_uploads.remove(&upload_id).is_none() {
            roadview_debug!("Upload {} finished but was not pending", upload_id);
        }
        self.mark_dirty();
    }

    pub(crate) fn record_upload_failure(&mut self, message: String) {
        self.failed_uploads += 1;
        self.last_error = Some(message);
        self.mark_dirty();
    }

    /// Adds a queued job and marks it as polled. Returns `false` for a
    /// duplicate id.
    pub(crate) fn register_job(&mut self, job_id: JobId, filename: String) -> bool {
        if !self.registry.insert_front(Job::queued(job_id.clone(), filename)) {
            return false;
        }
        self.polling.insert(job_id);
        self.mark_dirty();
        true
    }

    /// Merges a status report unless it is for an unknown job or older than
    /// the last applied report for that job.
    pub(crate) fn apply_status(
        &mut self,
        job_id: &str,
        seq: u64,
        report: &StatusReport,
    ) -> Option<StatusChange> {
        let job = self.registry.get_mut(job_id)?;
        let last = self.applied_seq.get(job_id).copied();
        if last.is_some_and(|last| seq <= last) {
            roadview_debug!(
                "Dropping stale status for job {} (seq {} <= {:?})",
                job_id,
                seq,
                last
            );
            return None;
        }
        let change = job.merge(report);
        self.applied_seq.insert(job_id.to_string(), seq);
        self.mark_dirty();
        Some(change)
    }

    pub(crate) fn stop_polling(&mut self, job_id: &str) -> bool {
        self.polling.remove(job_id)
    }

    pub(crate) fn select(&mut self, job_id: JobId) {
        self.selection.select(job_id);
        self.mark_dirty();
    }

    pub(crate) fn completed_job(&self, job_id: &str) -> Option<&Job> {
        self.registry
            .get(job_id)
            .filter(|job| job.status() == JobStatus::Completed)
    }

    pub(crate) fn set_artifact(&mut self, job_id: JobId, artifact: ArtifactState) {
        self.artifacts.insert(job_id, artifact);
        self.mark_dirty();
    }

    fn result_pane(&self) -> ResultPane {
        let Some(job) = self.selection.active().and_then(|id| self.completed_job(id)) else {
            return ResultPane::Placeholder;
        };
        ResultPane::Artifact {
            job_id: job.id().to_string(),
            download_path: download_path(job.id()),
            legend_visible: true,
            artifact: self.artifacts.get(job.id()).cloned(),
        }
    }
}
