//! Drives a [`ServerSession`] over a TCP connection.
//!
//! The session itself is single-threaded and not `Send`, so it lives on the
//! task that reads from the socket. Outbound lines go through an unbounded
//! channel to a writer task that owns the write half.

use chanlog_session::errors::TransportError;
use chanlog_session::session::{Clock, ServerSession, Transport};
use chanlog_session::utils::OrLog;

use std::time::Duration;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

/// How long to wait for input when no timer is scheduled
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Sends lines to the writer task
#[derive(Debug)]
pub struct ChannelTransport {
    sender: Option<UnboundedSender<String>>,
}

impl ChannelTransport {
    pub fn new(sender: UnboundedSender<String>) -> Self {
        Self {
            sender: Some(sender),
        }
    }
}

impl Transport for ChannelTransport {
    fn send_raw(&mut self, line: &str) -> Result<(), TransportError> {
        let sender = self.sender.as_ref().ok_or(TransportError::Closed)?;
        sender
            .send(line.to_string())
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        // The writer shuts the socket down once its channel is empty and closed
        self.sender = None;
    }
}

/// Write each line from `receiver` with the protocol terminator, until the
/// channel closes
pub async fn write_lines<W>(mut writer: W, mut receiver: UnboundedReceiver<String>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = receiver.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
    }
    writer.shutdown().await
}

fn spawn_writer<W>(writer: W) -> (ChannelTransport, JoinHandle<std::io::Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (sender, receiver) = unbounded_channel();
    let handle = tokio::spawn(write_lines(writer, receiver));
    (ChannelTransport::new(sender), handle)
}

/// Feed lines from `reader` into `session` until the connection ends.
///
/// Timers are run between lines. Returns when the connection is closed by
/// either side, or when `shutdown` completes.
pub async fn drive<R, C>(
    session: &mut ServerSession<C>,
    reader: R,
    shutdown: impl std::future::Future<Output = ()>,
) where
    R: AsyncBufRead + Unpin,
    C: Clock,
{
    let mut reader = reader;
    let mut buffer = Vec::new();
    tokio::pin!(shutdown);

    while session.is_connected() {
        let wait = session.next_timer_in().unwrap_or(IDLE_WAIT);

        tokio::select! {
            read = reader.read_until(b'\n', &mut buffer) => match read {
                Ok(0) => {
                    session.connection_lost("Connection closed by server");
                    break;
                }
                Ok(_) => {
                    let raw = String::from_utf8_lossy(&buffer).into_owned();
                    buffer.clear();
                    if let Err(error) = session.handle_raw(&raw) {
                        session.connection_lost(&error.to_string());
                        break;
                    }
                }
                Err(error) => {
                    session.connection_lost(&error.to_string());
                    break;
                }
            },
            _ = tokio::time::sleep(wait) => {}
            _ = &mut shutdown => {
                session.lose_connection("Shutting down");
                break;
            }
        }

        if let Err(error) = session.poll_timers() {
            session.connection_lost(&error.to_string());
        }
    }
}

/// Connect to `address` and run `session` over the connection until it ends
pub async fn run_connection<C: Clock>(
    session: &mut ServerSession<C>,
    address: &str,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<(), anyhow::Error> {
    tracing::info!(address, "Connecting");
    let stream = TcpStream::connect(address).await?;
    let (read_half, write_half) = stream.into_split();

    let (transport, writer) = spawn_writer(write_half);
    session.connection_made(Box::new(transport))?;

    drive(session, BufReader::new(read_half), shutdown).await;

    // The transport has been dropped or closed by now, so the writer finishes
    // once it has sent what was queued
    match writer.await {
        Ok(result) => result.or_log("closing connection"),
        Err(error) => tracing::error!(%error, "Writer task failed"),
    }
    Ok(())
}
