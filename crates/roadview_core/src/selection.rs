use crate::JobId;

/// Which job is displayed in detail.
///
/// `has_selected` is set by the first selection of the session, whether it
/// came from the user or from auto-select, and never cleared. Auto-select
/// checks it so it can fire at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    active: Option<JobId>,
    has_selected: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous selection. Unknown ids are accepted.
    pub fn select(&mut self, job_id: JobId) {
        self.active = Some(job_id);
        self.has_selected = true;
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, job_id: &str) -> bool {
        self.active() == Some(job_id)
    }

    pub fn has_selected(&self) -> bool {
        self.has_selected
    }
}

/// Path of the finished artifact for a job, relative to the backend base URL.
pub fn download_path(job_id: &str) -> String {
    format!("/api/download/{job_id}")
}
