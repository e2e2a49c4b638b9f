use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use roadview_logging::{roadview_error, roadview_info};

use crate::backend::{BackendClient, ChannelEventSink, EventSink, ReqwestBackend};
use crate::persist::result_filename;
use crate::{
    AtomicFileWriter, BackendError, EngineConfig, EngineEvent, FailureKind, JobId,
    MetricsStreamer, PollScheduler, UploadId,
};

enum EngineCommand {
    Upload { upload_id: UploadId, path: PathBuf },
    StartPolling { job_id: JobId },
    StopPolling { job_id: JobId },
    LoadResult { job_id: JobId, filename: String },
    UploadLive { path: PathBuf },
    StartStream,
}

/// Owns the IO thread. Commands go in, `EngineEvent`s come out.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, BackendError> {
        let backend = Arc::new(ReqwestBackend::new(&config)?);
        roadview_info!("Engine talking to {}", backend.base_url());
        Self::with_backend(config, backend)
    }

    /// Fails when the tokio runtime for the IO thread cannot be built.
    pub fn with_backend(
        config: EngineConfig,
        backend: Arc<dyn BackendClient>,
    ) -> Result<Self, BackendError> {
        let runtime = tokio::runtime::Runtime::new().map_err(|err| {
            roadview_error!("Failed to start engine runtime: {}", err);
            BackendError::new(FailureKind::Io, format!("engine runtime: {err}"))
        })?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let _guard = runtime.enter();

            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let writer = AtomicFileWriter::new(config.output_dir.clone());
            let mut polls = PollScheduler::new(backend.clone(), sink.clone(), config.poll_interval);
            let mut streamer = MetricsStreamer::new(backend.clone(), sink.clone(), &config);

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Upload { upload_id, path } => {
                        let backend = backend.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            let filename = display_name(&path);
                            let result = backend.upload(&path).await;
                            sink.emit(EngineEvent::UploadCompleted {
                                upload_id,
                                filename,
                                result,
                            });
                        });
                    }
                    EngineCommand::StartPolling { job_id } => {
                        polls.start(&job_id);
                    }
                    EngineCommand::StopPolling { job_id } => {
                        polls.stop(&job_id);
                    }
                    EngineCommand::LoadResult { job_id, filename } => {
                        let backend = backend.clone();
                        let sink = sink.clone();
                        let writer = writer.clone();
                        runtime.spawn(async move {
                            let event =
                                match save_result(backend.as_ref(), &writer, &job_id, &filename)
                                    .await
                                {
                                    Ok(path) => EngineEvent::ResultSaved { job_id, path },
                                    Err(error) => EngineEvent::ResultFailed { job_id, error },
                                };
                            sink.emit(event);
                        });
                    }
                    EngineCommand::UploadLive { path } => {
                        let backend = backend.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            let result = backend.upload_live(&path).await;
                            sink.emit(EngineEvent::LiveUploadCompleted { result });
                        });
                    }
                    EngineCommand::StartStream => streamer.start_stream(),
                }
            }
            roadview_info!("Engine command channel closed; shutting down");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn upload(&self, upload_id: UploadId, path: impl Into<PathBuf>) {
        self.send(EngineCommand::Upload {
            upload_id,
            path: path.into(),
        });
    }

    pub fn start_polling(&self, job_id: impl Into<JobId>) {
        self.send(EngineCommand::StartPolling {
            job_id: job_id.into(),
        });
    }

    pub fn stop_polling(&self, job_id: impl Into<JobId>) {
        self.send(EngineCommand::StopPolling {
            job_id: job_id.into(),
        });
    }

    pub fn load_result(&self, job_id: impl Into<JobId>, filename: impl Into<String>) {
        self.send(EngineCommand::LoadResult {
            job_id: job_id.into(),
            filename: filename.into(),
        });
    }

    pub fn upload_live(&self, path: impl Into<PathBuf>) {
        self.send(EngineCommand::UploadLive { path: path.into() });
    }

    pub fn start_stream(&self) {
        self.send(EngineCommand::StartStream);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            roadview_error!("Engine thread is gone; command dropped");
        }
    }
}

/// Streams the result of `job_id` into the output directory.
pub async fn save_result(
    backend: &dyn BackendClient,
    writer: &AtomicFileWriter,
    job_id: &str,
    filename: &str,
) -> Result<PathBuf, BackendError> {
    let io_error = |err: crate::PersistError| BackendError::new(FailureKind::Io, err.to_string());
    let mut staged = writer.stage().map_err(io_error)?;
    let bytes = backend.download_result(job_id, &mut staged).await?;
    let path = staged
        .commit(&result_filename(job_id, filename))
        .map_err(io_error)?;
    roadview_info!("Saved {} bytes for job {} to {:?}", bytes, job_id, path);
    Ok(path)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
