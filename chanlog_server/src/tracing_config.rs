//! Diagnostic logging for the process itself.
//!
//! Every configured target gets its own `fmt` layer behind a filter built
//! from its level and module list. A global [`Targets`] filter in front of
//! all of them quiets whole modules. `chanlog replay` prints its results on
//! stdout, so it uses [`LoggingConfig::for_replay`] and logs to stderr only.

use crate::config::*;
use tracing::Subscriber;
use tracing_core::LevelFilter;
use tracing_subscriber::{filter::Targets, prelude::*, registry::LookupSpan, Layer};

use std::{
    ffi::{OsStr, OsString},
    io::Error as IoError,
    path::{Path, PathBuf},
};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// One target's filter: its level, limited to its modules if it names any
fn entry_filter(entry: &LogEntry) -> Targets {
    let level = entry.level.map_or(LevelFilter::TRACE, LevelFilter::from);
    if entry.modules.is_empty() {
        Targets::new().with_default(level)
    } else {
        Targets::new().with_targets(entry.modules.iter().map(|module| (module.clone(), level)))
    }
}

/// The filter applied before any target sees an event. Its default is
/// permissive so that each target can filter as it needs.
fn global_filter(conf: &LoggingConfig) -> Targets {
    Targets::new()
        .with_default(conf.default_level.map_or(LevelFilter::TRACE, LevelFilter::from))
        .with_targets(
            conf.module_levels
                .iter()
                .map(|(module, level)| (module.clone(), LevelFilter::from(*level))),
        )
}

/// Directory and file name prefix for a rolling log file
fn file_location(conf: &LoggingConfig, filename: &Path) -> (PathBuf, OsString) {
    let path = conf.prefix_file(filename);
    let dir = path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let name = path
        .file_name()
        .unwrap_or_else(|| OsStr::new("chanlog.log"))
        .to_os_string();
    (dir, name)
}

fn build_target<S>(entry: &LogEntry, conf: &LoggingConfig) -> Result<BoxedLayer<S>, IoError>
where
    S: Subscriber + Send + Sync,
    for<'span> S: LookupSpan<'span>,
{
    let layer = match &entry.target {
        LogTarget::File { filename } => {
            let (dir, name) = file_location(conf, filename);
            std::fs::create_dir_all(&dir)?;
            tracing_subscriber::fmt::layer()
                .with_writer(tracing_appender::rolling::daily(dir, name))
                .with_ansi(false)
                .boxed()
        }
        LogTarget::Builtin(BuiltinLogTarget::Stdout) => {
            tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed()
        }
        LogTarget::Builtin(BuiltinLogTarget::Stderr) => {
            tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed()
        }
    };

    Ok(layer.with_filter(entry_filter(entry)).boxed())
}

/// Build the process's diagnostic subscriber from its logging config
pub fn build_subscriber(conf: LoggingConfig) -> Result<impl Subscriber, IoError> {
    let layers = conf
        .targets
        .iter()
        .map(|entry| build_target(entry, &conf))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tracing_subscriber::registry()
        .with(global_filter(&conf))
        .with(layers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing::Level;

    fn entry(level: Option<LogLevel>, modules: &[&str]) -> LogEntry {
        LogEntry {
            target: LogTarget::Builtin(BuiltinLogTarget::Stderr),
            modules: modules.iter().map(|m| m.to_string()).collect(),
            level,
        }
    }

    #[test]
    fn entry_without_modules_takes_everything() {
        let filter = entry_filter(&entry(Some(LogLevel::Info), &[]));
        assert!(filter.would_enable("chanlog_session::session", &Level::INFO));
        assert!(filter.would_enable("tokio::net", &Level::WARN));
        assert!(!filter.would_enable("chanlog_session::session", &Level::DEBUG));
    }

    #[test]
    fn entry_limited_to_modules() {
        let filter = entry_filter(&entry(None, &["chanlog_session"]));
        assert!(filter.would_enable("chanlog_session::membership", &Level::TRACE));
        assert!(!filter.would_enable("chanlog_server::connection", &Level::ERROR));
    }

    #[test]
    fn module_levels_quiet_modules() {
        let mut conf = LoggingConfig::default();
        conf.module_levels
            .insert("chanlog_session::membership".to_string(), LogLevel::Warn);

        let filter = global_filter(&conf);
        assert!(filter.would_enable("chanlog_session::session", &Level::INFO));
        assert!(!filter.would_enable("chanlog_session::membership", &Level::INFO));
        assert!(filter.would_enable("chanlog_session::membership", &Level::WARN));
    }

    #[test]
    fn replay_only_warns() {
        let conf = LoggingConfig::for_replay();
        assert!(matches!(
            conf.targets[..],
            [LogEntry {
                target: LogTarget::Builtin(BuiltinLogTarget::Stderr),
                ..
            }]
        ));

        let filter = global_filter(&conf);
        assert!(!filter.would_enable("chanlog_session::replay", &Level::INFO));
        assert!(filter.would_enable("chanlog_session::replay", &Level::WARN));
    }

    #[test]
    fn files_go_under_log_dir() {
        let mut conf = LoggingConfig::default();
        conf.dir = PathBuf::from("logs");

        let (dir, name) = file_location(&conf, Path::new("debug/chanlog.log"));
        assert_eq!(dir, PathBuf::from("logs/debug"));
        assert_eq!(name, OsString::from("chanlog.log"));
    }
}
