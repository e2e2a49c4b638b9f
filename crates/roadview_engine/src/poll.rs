use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use roadview_logging::{roadview_debug, roadview_info, roadview_warn};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendClient, EventSink};
use crate::{EngineEvent, JobId, StatusReport};

struct PollHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollHandle {
    fn is_running(&self) -> bool {
        !self.join.is_finished()
    }
}

/// One status-polling task per job.
///
/// A task issues its first request one interval after `start`, waits for each
/// response before the next tick, and ends by itself after reporting a
/// terminal status. Transient failures are logged and retried next tick.
///
/// Tick numbers keep counting across restarts of the same job so a restarted
/// task never reports a sequence the consumer has already seen.
pub struct PollScheduler {
    backend: Arc<dyn BackendClient>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    tasks: HashMap<JobId, PollHandle>,
    seqs: HashMap<JobId, Arc<AtomicU64>>,
}

impl PollScheduler {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        Self {
            backend,
            sink,
            interval,
            tasks: HashMap::new(),
            seqs: HashMap::new(),
        }
    }

    /// Spawns the poll task for `job_id` on the current tokio runtime.
    ///
    /// Returns `false` without spawning when a task for this job is still
    /// running.
    pub fn start(&mut self, job_id: &str) -> bool {
        if self.tasks.get(job_id).is_some_and(PollHandle::is_running) {
            roadview_debug!("Poll task for job {} already running", job_id);
            return false;
        }

        let seq = self.seqs.entry(job_id.to_string()).or_default().clone();
        let cancel = CancellationToken::new();
        let join = tokio::spawn(poll_job(
            self.backend.clone(),
            self.sink.clone(),
            job_id.to_string(),
            self.interval,
            seq,
            cancel.clone(),
        ));
        self.tasks
            .insert(job_id.to_string(), PollHandle { cancel, join });
        roadview_info!("Polling job {} every {:?}", job_id, self.interval);
        true
    }

    /// Cancels the task for `job_id`. Returns whether a handle was held.
    pub fn stop(&mut self, job_id: &str) -> bool {
        match self.tasks.remove(job_id) {
            Some(handle) => {
                handle.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_polling(&self, job_id: &str) -> bool {
        self.tasks.get(job_id).is_some_and(PollHandle::is_running)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.values().filter(|handle| handle.is_running()).count()
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.cancel.cancel();
        }
    }
}

/// True when the report carries `completed` or `failed`.
pub fn is_terminal_report(report: &StatusReport) -> bool {
    matches!(
        report.get("status").and_then(Value::as_str),
        Some("completed" | "failed")
    )
}

/// `interval_at` panics on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

async fn poll_job(
    backend: Arc<dyn BackendClient>,
    sink: Arc<dyn EventSink>,
    job_id: JobId,
    period: Duration,
    counter: Arc<AtomicU64>,
    cancel: CancellationToken,
) {
    let period = period.max(MIN_PERIOD);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let seq = counter.fetch_add(1, Ordering::SeqCst) + 1;

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = backend.job_status(&job_id) => result,
        };

        match result {
            Ok(report) => {
                let terminal = is_terminal_report(&report);
                sink.emit(EngineEvent::JobStatus {
                    job_id: job_id.clone(),
                    seq,
                    report,
                });
                if terminal {
                    roadview_debug!("Job {} is terminal after {} polls", job_id, seq);
                    return;
                }
            }
            Err(err) => {
                roadview_warn!("Polling job {} failed (tick {}): {}", job_id, seq, err);
            }
        }
    }
    roadview_debug!("Poll task for job {} cancelled", job_id);
}
