use std::collections::VecDeque;

use crate::{Job, JobId};

/// In-memory set of known jobs, most recently uploaded first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobRegistry {
    jobs: VecDeque<Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts at the front of iteration order. Returns `false` and leaves the
    /// registry untouched when the id is already known.
    pub fn insert_front(&mut self, job: Job) -> bool {
        if self.contains(job.id()) {
            return false;
        }
        self.jobs.push_front(job);
        true
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.get(job_id).is_some()
    }

    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id() == job_id)
    }

    pub(crate) fn get_mut(&mut self, job_id: &str) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| job.id() == job_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn ids(&self) -> Vec<JobId> {
        self.jobs.iter().map(|job| job.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn all_terminal(&self) -> bool {
        self.jobs.iter().all(|job| job.status().is_terminal())
    }
}
