use chanlog_session::session::SessionConfig;
use thiserror::Error;
use tracing_core::LevelFilter;

use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Couldn't read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinLogTarget {
    Stdout,
    Stderr,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum LogTarget {
    File { filename: PathBuf },
    Builtin(BuiltinLogTarget),
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct LogEntry {
    pub target: LogTarget,
    #[serde(default)]
    pub modules: Vec<String>,
    pub level: Option<LogLevel>,
}

/// Where the process's own diagnostics go. This is separate from the
/// channel log, which is the `log-file` of [`ServerConfig`].
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    pub default_level: Option<LogLevel>,
    #[serde(default)]
    pub module_levels: HashMap<String, LogLevel>,
    pub targets: Vec<LogEntry>,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            default_level: Some(LogLevel::Info),
            module_levels: HashMap::new(),
            targets: vec![LogEntry {
                target: LogTarget::Builtin(BuiltinLogTarget::Stderr),
                modules: Vec::new(),
                level: None,
            }],
        }
    }
}

impl LoggingConfig {
    /// Diagnostics for `chanlog replay`: warnings and errors on stderr, so
    /// that stdout carries only the replayed output
    pub fn for_replay() -> Self {
        Self {
            default_level: Some(LogLevel::Warn),
            ..Self::default()
        }
    }

    /// Resolve a log file name against the log directory
    pub fn prefix_file(&self, filename: impl AsRef<Path>) -> PathBuf {
        let mut path = self.dir.clone();
        path.push(filename);
        path
    }
}

/// Everything needed to run one live session
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// The channel log, one `<time> <line>` record per line
    pub log_file: PathBuf,
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_port() -> u16 {
    6667
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

pub fn load_config(filename: impl AsRef<Path>) -> Result<ServerConfig, ConfigError> {
    let file = File::open(filename)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

impl From<LogLevel> for LevelFilter {
    fn from(arg: LogLevel) -> LevelFilter {
        match arg {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}
