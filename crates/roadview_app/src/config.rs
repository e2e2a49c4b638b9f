//! Optional RON configuration file.
//!
//! Every field may be left out; anything unset falls back to the engine
//! defaults. A missing file is not an error, a malformed one is.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use roadview_engine::EngineConfig;
use roadview_logging::{roadview_info, LogDestination};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "roadview.ron";
const DEFAULT_RESULTS_DIR: &str = "results";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("unknown log level {0:?}")]
    LogLevel(String),
    #[error("{field} must be greater than zero")]
    Interval { field: &'static str },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
    pub metrics_interval_ms: Option<u64>,
    pub stream_start_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub upload_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub log_to: Option<LogDestination>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Reads `path`, or the default file in the working directory when no
    /// path was given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        roadview_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        match &self.log_level {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::LogLevel(raw.clone())),
            None => Ok(LevelFilter::Info),
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        self.log_to.unwrap_or_default()
    }

    /// Engine settings with file values laid over the defaults. A relative
    /// output directory is resolved against `cwd`. Zero poll or metrics
    /// intervals are rejected.
    pub fn engine_config(&self, cwd: &Path) -> Result<EngineConfig, ConfigError> {
        let output_dir = match &self.output_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd.join(DEFAULT_RESULTS_DIR),
        };
        let mut config = EngineConfig::default_with_output(output_dir);
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = interval("poll_interval_ms", ms)?;
        }
        if let Some(ms) = self.metrics_interval_ms {
            config.metrics_interval = interval("metrics_interval_ms", ms)?;
        }
        if let Some(ms) = self.stream_start_delay_ms {
            config.stream_start_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.upload_timeout_secs {
            config.upload_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

fn interval(field: &'static str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::Interval { field });
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(Some(&temp.path().join("absent.ron"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roadview.ron");
        fs::write(
            &path,
            r#"(
                base_url: Some("http://gpu-box:8000"),
                poll_interval_ms: Some(250),
                log_to: Some(Both),
            )"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://gpu-box:8000"));
        assert_eq!(config.log_destination(), LogDestination::Both);

        let engine = config.engine_config(temp.path()).unwrap();
        assert_eq!(engine.base_url, "http://gpu-box:8000");
        assert_eq!(engine.poll_interval, Duration::from_millis(250));
        assert_eq!(engine.metrics_interval, Duration::from_millis(500));
        assert_eq!(engine.output_dir, temp.path().join("results"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roadview.ron");
        fs::write(&path, "(base_url: 42").unwrap();

        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        let config = AppConfig {
            log_level: Some("Warn".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.log_level().unwrap(), LevelFilter::Warn);

        let bad = AppConfig {
            log_level: Some("loud".to_string()),
            ..AppConfig::default()
        };
        assert!(matches!(bad.log_level(), Err(ConfigError::LogLevel(_))));
    }

    #[test]
    fn relative_output_dir_resolves_against_cwd() {
        let config = AppConfig {
            output_dir: Some(PathBuf::from("out")),
            ..AppConfig::default()
        };
        let engine = config.engine_config(Path::new("/work")).unwrap();
        assert_eq!(engine.output_dir, PathBuf::from("/work/out"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roadview.ron");
        fs::write(&path, "(poll_interval_ms: Some(0))").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        let err = config.engine_config(temp.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Interval {
                field: "poll_interval_ms"
            }
        ));
        assert_eq!(err.to_string(), "poll_interval_ms must be greater than zero");
    }

    #[test]
    fn zero_metrics_interval_is_rejected() {
        let config = AppConfig {
            metrics_interval_ms: Some(0),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.engine_config(Path::new("/work")),
            Err(ConfigError::Interval {
                field: "metrics_interval_ms"
            })
        ));
    }
}
