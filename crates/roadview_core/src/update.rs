use std::path::Path;

use roadview_logging::{roadview_debug, roadview_info, roadview_warn};

use crate::live::StreamStatus;
use crate::{AppState, ArtifactState, Effect, JobId, JobStatus, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSubmitted { path } => {
            let upload_id = state.begin_upload(display_name(&path));
            vec![Effect::UploadFile { upload_id, path }]
        }
        Msg::UploadSucceeded {
            upload_id,
            job_id,
            filename,
        } => {
            state.finish_upload(upload_id);
            if state.register_job(job_id.clone(), filename) {
                roadview_info!("Job {} queued (upload {})", job_id, upload_id);
                vec![Effect::StartPolling { job_id }]
            } else {
                roadview_warn!("Backend returned known job id {}; ignoring", job_id);
                Vec::new()
            }
        }
        Msg::UploadFailed {
            upload_id,
            filename,
            reason,
        } => {
            roadview_warn!("Upload {} of {} failed: {}", upload_id, filename, reason);
            state.finish_upload(upload_id);
            state.record_upload_failure(format!("Upload failed: {filename}: {reason}"));
            Vec::new()
        }
        Msg::JobStatusReceived {
            job_id,
            seq,
            report,
        } => {
            let Some(change) = state.apply_status(&job_id, seq, &report) else {
                return (state, Vec::new());
            };
            let mut effects = Vec::new();
            if change.to.is_terminal() && state.stop_polling(&job_id) {
                roadview_info!("Job {} reached {}; polling stops", job_id, change.to);
                effects.push(Effect::StopPolling {
                    job_id: job_id.clone(),
                });
            }
            if change.entered(JobStatus::Completed) {
                if !state.selection().has_selected() {
                    roadview_info!("Auto-selecting first completed job {}", job_id);
                    effects.extend(select_job(&mut state, job_id));
                } else if state.selection().is_active(&job_id) {
                    effects.extend(load_result(&mut state, &job_id));
                }
            }
            effects
        }
        Msg::JobSelected { job_id } => select_job(&mut state, job_id),
        Msg::ResultSaved { job_id, path } => {
            roadview_info!("Result for job {} saved to {:?}", job_id, path);
            state.set_artifact(job_id, ArtifactState::Saved(path));
            Vec::new()
        }
        Msg::ResultFailed { job_id, reason } => {
            roadview_warn!("Result for job {} unavailable: {}", job_id, reason);
            state.set_artifact(job_id, ArtifactState::Failed(reason));
            Vec::new()
        }
        Msg::LiveFileSubmitted { path } => {
            if state.live.status == StreamStatus::Uploading {
                roadview_debug!("Live upload already in flight; ignoring {:?}", path);
                return (state, Vec::new());
            }
            state.live.status = StreamStatus::Uploading;
            state.live.last_error = None;
            state.mark_dirty();
            vec![Effect::UploadLiveFile { path }]
        }
        Msg::LiveUploadAccepted => {
            state.live.status = StreamStatus::Starting;
            state.mark_dirty();
            vec![Effect::StartStream]
        }
        Msg::LiveUploadFailed { reason } => {
            roadview_warn!("Live upload failed: {}", reason);
            state.live.status = StreamStatus::UploadFailed;
            state.live.last_error = Some(reason);
            state.mark_dirty();
            Vec::new()
        }
        Msg::StreamConnected => {
            state.live.status = StreamStatus::Live;
            state.live.last_error = None;
            state.mark_dirty();
            Vec::new()
        }
        Msg::StreamFailed { reason } => {
            roadview_warn!("Live feed failed: {}", reason);
            state.live.status = StreamStatus::ConnectionFailed;
            state.live.last_error = Some(reason);
            state.mark_dirty();
            Vec::new()
        }
        Msg::FeedProgress { bytes } => {
            if state.live.feed_bytes != bytes {
                state.live.feed_bytes = bytes;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::MetricsReceived(sample) => {
            if state.live.metrics.as_ref() != Some(&sample) {
                state.live.metrics = Some(sample);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Single entry point for user selection and auto-select.
fn select_job(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    state.select(job_id.clone());
    load_result(state, &job_id)
}

/// Requests the artifact of a completed job unless it is already loading or
/// saved. Anything else shows the placeholder and needs no effect.
fn load_result(state: &mut AppState, job_id: &str) -> Vec<Effect> {
    let Some(filename) = state.completed_job(job_id).map(|job| job.filename().to_string())
    else {
        return Vec::new();
    };
    if matches!(
        state.artifact(job_id),
        Some(ArtifactState::Loading | ArtifactState::Saved(_))
    ) {
        return Vec::new();
    }
    state.set_artifact(job_id.to_string(), ArtifactState::Loading);
    vec![Effect::LoadResult {
        job_id: job_id.to_string(),
        filename,
    }]
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
