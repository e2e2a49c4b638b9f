//! Roadview engine: backend IO, polling and live-stream tasks.
mod backend;
mod config;
mod engine;
mod persist;
mod poll;
mod stream;
mod types;

pub use backend::{BackendClient, ChannelEventSink, EventSink, FeedStream, ReqwestBackend};
pub use config::{CacheBustFn, EngineConfig, DEFAULT_BASE_URL};
pub use engine::{save_result, EngineHandle};
pub use persist::{ensure_output_dir, result_filename, AtomicFileWriter, PersistError, StagedFile};
pub use poll::{is_terminal_report, PollScheduler};
pub use stream::{MetricsStreamer, FEED_PROGRESS_STEP};
pub use types::{
    BackendError, EngineEvent, FailureKind, JobId, MetricsReport, StatusReport, UploadId,
};
