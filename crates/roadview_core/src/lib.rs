//! Roadview core: pure job-tracking state machine and view-model helpers.
mod effect;
mod job;
mod live;
mod msg;
mod registry;
mod selection;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use job::{Job, JobId, JobStatus, StatusChange, StatusReport};
pub use live::{
    offset_bar_percentage, LiveState, MetricsSample, StreamStatus, NO_SIGNS_PLACEHOLDER,
    OFFSET_FULL_SCALE,
};
pub use msg::Msg;
pub use registry::JobRegistry;
pub use selection::{download_path, Selection};
pub use state::{AppState, ArtifactState, UploadId};
pub use update::update;
pub use view_model::{AppViewModel, JobRowView, LiveView, MetricsView, ResultPane};
