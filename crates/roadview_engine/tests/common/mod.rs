#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use roadview_engine::{
    BackendClient, BackendError, EngineEvent, EventSink, FailureKind, FeedStream, JobId,
    MetricsReport, StagedFile, StatusReport,
};
use serde_json::{json, Value};

pub fn report(value: Value) -> StatusReport {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn network_error() -> BackendError {
    BackendError::new(FailureKind::Network, "connection reset")
}

pub enum FeedScript {
    /// Yields the chunks and ends.
    Chunks(Vec<&'static [u8]>),
    /// Connects and never yields.
    Pending,
    Fail(BackendError),
}

/// Backend double that answers from scripted queues and counts calls.
pub struct ScriptedBackend {
    statuses: Mutex<VecDeque<Result<StatusReport, BackendError>>>,
    pub status_calls: AtomicUsize,
    pub metrics_calls: AtomicUsize,
    pub feed_opens: Mutex<Vec<i64>>,
    feed: Mutex<Option<FeedScript>>,
    metrics: Mutex<VecDeque<Result<MetricsReport, BackendError>>>,
    pub upload_result: Mutex<Option<Result<JobId, BackendError>>>,
    pub artifact: &'static [u8],
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            status_calls: AtomicUsize::new(0),
            metrics_calls: AtomicUsize::new(0),
            feed_opens: Mutex::new(Vec::new()),
            feed: Mutex::new(None),
            metrics: Mutex::new(VecDeque::new()),
            upload_result: Mutex::new(None),
            artifact: b"processed video",
        }
    }
}

impl ScriptedBackend {
    pub fn with_statuses(statuses: Vec<Result<StatusReport, BackendError>>) -> Arc<Self> {
        let backend = Self::default();
        *backend.statuses.lock().unwrap() = statuses.into();
        Arc::new(backend)
    }

    pub fn set_feed(&self, script: FeedScript) {
        *self.feed.lock().unwrap() = Some(script);
    }

    pub fn push_metrics(&self, result: Result<MetricsReport, BackendError>) {
        self.metrics.lock().unwrap().push_back(result);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn metrics_calls(&self) -> usize {
        self.metrics_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BackendClient for ScriptedBackend {
    async fn upload(&self, _path: &Path) -> Result<JobId, BackendError> {
        self.upload_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok("job-1".to_string()))
    }

    async fn job_status(&self, _job_id: &str) -> Result<StatusReport, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(report(json!({"status": "processing", "progress": 0.5}))))
    }

    async fn download_result(
        &self,
        _job_id: &str,
        dest: &mut StagedFile,
    ) -> Result<u64, BackendError> {
        dest.append(self.artifact)
            .map_err(|err| BackendError::new(FailureKind::Io, err.to_string()))?;
        Ok(dest.len())
    }

    async fn upload_live(&self, _path: &Path) -> Result<(), BackendError> {
        Ok(())
    }

    async fn open_feed(&self, cache_bust: i64) -> Result<FeedStream, BackendError> {
        self.feed_opens.lock().unwrap().push(cache_bust);
        match self.feed.lock().unwrap().take() {
            Some(FeedScript::Chunks(chunks)) => Ok(stream::iter(
                chunks
                    .into_iter()
                    .map(|chunk| Ok(Bytes::from_static(chunk)))
                    .collect::<Vec<_>>(),
            )
            .boxed()),
            Some(FeedScript::Fail(error)) => Err(error),
            Some(FeedScript::Pending) | None => {
                Ok(stream::pending::<Result<Bytes, BackendError>>().boxed())
            }
        }
    }

    async fn metrics(&self) -> Result<MetricsReport, BackendError> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        self.metrics
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(MetricsReport::default()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn status_seqs(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::JobStatus { seq, .. } => Some(seq),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
