use roadview_core::{Effect, MetricsSample, Msg};
use roadview_engine::{BackendError, EngineConfig, EngineEvent, EngineHandle};
use roadview_logging::{roadview_info, roadview_warn};

/// Turns core effects into engine commands and engine events back into
/// messages for `update`.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Result<Self, BackendError> {
        Ok(Self::with_engine(EngineHandle::new(config)?))
    }

    pub fn with_engine(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::UploadFile { upload_id, path } => {
                    roadview_info!("Upload #{} path={:?}", upload_id, path);
                    self.engine.upload(upload_id, path);
                }
                Effect::StartPolling { job_id } => self.engine.start_polling(job_id),
                Effect::StopPolling { job_id } => self.engine.stop_polling(job_id),
                Effect::LoadResult { job_id, filename } => {
                    roadview_info!("Loading result for job {} ({})", job_id, filename);
                    self.engine.load_result(job_id, filename);
                }
                Effect::UploadLiveFile { path } => self.engine.upload_live(path),
                Effect::StartStream => self.engine.start_stream(),
            }
        }
    }

    /// Everything the engine has reported since the last call.
    pub fn drain(&self) -> Vec<Msg> {
        std::iter::from_fn(|| self.engine.try_recv())
            .map(map_event)
            .collect()
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadCompleted {
            upload_id,
            filename,
            result,
        } => match result {
            Ok(job_id) => Msg::UploadSucceeded {
                upload_id,
                job_id,
                filename,
            },
            Err(error) => {
                roadview_warn!("Upload of {} failed: {}", filename, error);
                Msg::UploadFailed {
                    upload_id,
                    filename,
                    reason: error.to_string(),
                }
            }
        },
        EngineEvent::JobStatus {
            job_id,
            seq,
            report,
        } => Msg::JobStatusReceived {
            job_id,
            seq,
            report,
        },
        EngineEvent::ResultSaved { job_id, path } => Msg::ResultSaved { job_id, path },
        EngineEvent::ResultFailed { job_id, error } => {
            roadview_warn!("Result for job {} unavailable: {}", job_id, error);
            Msg::ResultFailed {
                job_id,
                reason: error.to_string(),
            }
        }
        EngineEvent::LiveUploadCompleted { result } => match result {
            Ok(()) => Msg::LiveUploadAccepted,
            Err(error) => Msg::LiveUploadFailed {
                reason: error.to_string(),
            },
        },
        EngineEvent::StreamConnected => Msg::StreamConnected,
        EngineEvent::StreamFailed { error } => Msg::StreamFailed {
            reason: error.to_string(),
        },
        EngineEvent::FeedProgress { bytes } => Msg::FeedProgress { bytes },
        EngineEvent::Metrics(report) => Msg::MetricsReceived(MetricsSample {
            offset: report.offset,
            curvature: report.curvature,
            fps: report.fps,
            signs: report.signs,
        }),
    }
}
