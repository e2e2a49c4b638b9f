use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use roadview_logging::LogDestination;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    /// Log file only
    File,
    /// Terminal only
    Terminal,
    /// Log file and terminal
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "roadview")]
#[command(
    about = "Submit road videos for lane and sign processing and follow the jobs",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (RON). Defaults to ./roadview.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://127.0.0.1:8000
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory for downloaded results
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<LevelFilter>,

    /// Where log output goes
    #[arg(long, value_enum, global = true)]
    pub log_to: Option<LogTarget>,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Mode {
    /// Upload videos and track every job until it finishes
    Jobs {
        /// Video files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Job to show in the result pane instead of the first completed one
        #[arg(long)]
        select: Option<String>,
    },
    /// Stream one video through the live pipeline and show its metrics
    Live {
        /// Video file to stream
        file: PathBuf,
    },
}

impl Cli {
    /// Flags win over values from the configuration file.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = Some(output_dir.clone());
        }
        if let Some(level) = self.log_level {
            config.log_level = Some(level.to_string());
        }
        if let Some(target) = self.log_to {
            config.log_to = Some(target.into());
        }
    }
}
