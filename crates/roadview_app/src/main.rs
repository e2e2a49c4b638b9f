mod app;
mod cli;
mod config;
mod effects;
mod ui;

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use roadview_engine::ensure_output_dir;
use roadview_logging::{roadview_error, roadview_info};

use crate::app::{App, RunMode};
use crate::cli::{Cli, Mode};
use crate::config::AppConfig;
use crate::effects::EffectRunner;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            roadview_error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    roadview_logging::initialize(
        config.log_destination(),
        config.log_level()?,
        config.log_file.as_deref(),
    );

    let cwd = std::env::current_dir().context("working directory is not accessible")?;
    let engine_config = config.engine_config(&cwd)?;
    ensure_output_dir(&engine_config.output_dir)?;
    roadview_info!("Starting with {:?}", engine_config);

    let runner = EffectRunner::new(engine_config).context("backend client setup failed")?;
    let app = App::new(runner, io::stdout());

    let mode = match cli.mode {
        Mode::Jobs { files, select } => RunMode::Jobs { files, select },
        Mode::Live { file } => RunMode::Live { file },
    };
    let summary = app.run(mode)?;
    roadview_info!(
        "{} job(s) tracked, {} upload(s) failed",
        summary.jobs,
        summary.failed_uploads
    );

    if summary.all_uploads_failed() {
        eprintln!("All {} upload(s) failed", summary.submitted);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
