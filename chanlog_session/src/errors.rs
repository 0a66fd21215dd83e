use thiserror::Error;

/// Failure of the connection underneath a session
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("Not connected")]
    NotConnected,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Couldn't read replay input: {0}")]
    Io(#[from] std::io::Error),
}
