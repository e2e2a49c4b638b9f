use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use roadview_core::{update, AppState, JobId, Msg};
use roadview_logging::{roadview_debug, roadview_info};

use crate::effects::EffectRunner;
use crate::ui::render::{render_jobs, render_live};

/// Rendering is coalesced to at most one frame per tick.
const TICK_INTERVAL: Duration = Duration::from_millis(75);
const IDLE_WAIT: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Jobs {
        files: Vec<PathBuf>,
        select: Option<JobId>,
    },
    Live {
        file: PathBuf,
    },
}

/// What a finished jobs run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub submitted: usize,
    pub failed_uploads: usize,
    pub jobs: usize,
}

impl RunSummary {
    pub fn all_uploads_failed(&self) -> bool {
        self.submitted > 0 && self.failed_uploads == self.submitted
    }
}

pub struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    out: W,
    live: bool,
}

impl<W: Write> App<W> {
    pub fn new(runner: EffectRunner, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            out,
            live: false,
        }
    }

    /// Runs until every job settles. Live mode only returns when the tick
    /// source goes away.
    pub fn run(mut self, mode: RunMode) -> io::Result<RunSummary> {
        let (msg_tx, msg_rx) = mpsc::channel::<Msg>();

        // Background tick to throttle rendering.
        thread::spawn(move || {
            while msg_tx.send(Msg::Tick).is_ok() {
                thread::sleep(TICK_INTERVAL);
            }
        });

        let submitted = match mode {
            RunMode::Jobs { files, select } => {
                let count = files.len();
                for path in files {
                    self.dispatch(Msg::FileSubmitted { path })?;
                }
                if let Some(job_id) = select {
                    roadview_info!("Selecting job {} at startup", job_id);
                    self.dispatch(Msg::JobSelected { job_id })?;
                }
                count
            }
            RunMode::Live { file } => {
                self.live = true;
                self.dispatch(Msg::LiveFileSubmitted { path: file })?;
                1
            }
        };

        loop {
            match msg_rx.recv_timeout(IDLE_WAIT) {
                Ok(msg) => self.dispatch(msg)?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            for msg in self.runner.drain() {
                self.dispatch(msg)?;
            }
            if !self.live && self.state.is_settled() {
                roadview_debug!("All jobs settled");
                break;
            }
        }

        if self.state.consume_dirty() {
            self.render()?;
        }
        let summary = RunSummary {
            submitted,
            failed_uploads: self.state.failed_upload_count(),
            jobs: self.state.registry().len(),
        };
        roadview_info!("Run finished: {:?}", summary);
        Ok(summary)
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let is_tick = matches!(msg, Msg::Tick);
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);

        if is_tick && self.state.consume_dirty() {
            self.render()?;
        }
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        let view = self.state.view();
        let frame = if self.live {
            render_live(&view)
        } else {
            render_jobs(&view)
        };
        writeln!(self.out, "{frame}")?;
        self.out.flush()
    }
}
