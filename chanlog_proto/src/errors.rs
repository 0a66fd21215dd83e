use thiserror::Error;

/// A raw line that can't be split into prefix, command and arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty line")]
    Empty,
    #[error("No command in line: {0:?}")]
    MissingCommand(String),
    #[error("Malformed log record: {0:?}")]
    MalformedRecord(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Invalid timestamp {timestamp:?}: {source}")]
    Invalid {
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}
