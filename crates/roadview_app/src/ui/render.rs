use std::fmt::Write;

use roadview_core::{AppViewModel, ArtifactState, JobRowView, LiveView, MetricsView, ResultPane};

use super::constants::*;

/// Job list plus the result pane for the active job.
pub fn render_jobs(view: &AppViewModel) -> String {
    let mut out = String::new();

    let _ = write!(out, "Jobs: {}", view.job_count);
    if view.uploading {
        let _ = write!(out, " | Uploading {} file(s)", view.pending_uploads);
    }
    out.push('\n');
    if let Some(error) = &view.last_error {
        let _ = writeln!(out, "Error: {error}");
    }

    for job in &view.jobs {
        out.push_str(&format_job_row(job));
        out.push('\n');
    }

    out.push_str(&format_result_pane(&view.result));
    out
}

/// Status line, feed counter and the latest metrics of the live mode.
pub fn render_live(view: &AppViewModel) -> String {
    let live = &view.live;
    let mut out = String::new();

    let marker = if live.is_error { " (!)" } else { "" };
    let _ = writeln!(out, "Live: {}{}", live.status_label, marker);
    if let Some(error) = &live.last_error {
        let _ = writeln!(out, "Error: {error}");
    }
    if live.feed_bytes > 0 {
        let _ = writeln!(out, "Feed: {}", format_bytes(live.feed_bytes));
    }
    match &live.metrics {
        Some(metrics) => out.push_str(&format_metrics(metrics)),
        None => out.push_str(&format_waiting(live)),
    }
    out
}

fn format_job_row(job: &JobRowView) -> String {
    let cursor = if job.is_active { ACTIVE_CURSOR } else { ' ' };
    format!(
        "{cursor} {id:<idw$} {name:<namew$} {badge}",
        id = job.short_id,
        idw = SHORT_ID_WIDTH,
        name = truncate(&job.filename, FILENAME_WIDTH),
        namew = FILENAME_WIDTH,
        badge = job.badge(),
    )
}

fn format_result_pane(pane: &ResultPane) -> String {
    match pane {
        ResultPane::Placeholder => format!("Result: {RESULT_PLACEHOLDER}\n"),
        ResultPane::Artifact {
            job_id,
            download_path,
            legend_visible,
            artifact,
        } => {
            let state = match artifact {
                None | Some(ArtifactState::Loading) => "loading".to_string(),
                Some(ArtifactState::Saved(path)) => format!("saved to {}", path.display()),
                Some(ArtifactState::Failed(reason)) => format!("unavailable ({reason})"),
            };
            let mut out = format!("Result: job {job_id} [{download_path}] {state}\n");
            if *legend_visible {
                let _ = writeln!(out, "Legend: {LEGEND}");
            }
            out
        }
    }
}

fn format_metrics(metrics: &MetricsView) -> String {
    let signs = match metrics.signs_placeholder {
        Some(placeholder) => placeholder.to_string(),
        None => metrics.signs.join(", "),
    };
    format!(
        "Offset: {offset} m {bar}\nCurvature: {curv} m | FPS: {fps}\nSigns: {signs}\n",
        offset = metrics.offset_text,
        bar = offset_bar(metrics.bar_percentage, BAR_WIDTH),
        curv = metrics.curvature_text,
        fps = metrics.fps_text,
    )
}

fn format_waiting(live: &LiveView) -> String {
    if live.is_error {
        String::new()
    } else {
        "Metrics: waiting for first sample\n".to_string()
    }
}

/// `[----|--#-]` style bar, `|` marks the center and `#` the offset.
fn offset_bar(percentage: f64, width: usize) -> String {
    let last = width.saturating_sub(1);
    let center = last / 2;
    let pos = ((percentage / 100.0) * last as f64).round() as usize;
    let pos = pos.min(last);
    let cells: String = (0..width)
        .map(|i| {
            if i == pos {
                '#'
            } else if i == center {
                '|'
            } else {
                '-'
            }
        })
        .collect();
    format!("[{cells}]")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let value = bytes as f64;
    if value < KIB {
        format!("{bytes} B")
    } else if value < KIB * KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{:.1} MiB", value / (KIB * KIB))
    }
}
