use crate::pipeline::Sink;
use chanlog_proto::Line;

use std::io::Write;

/// Writes each line as `<time> <line>`, the format stored logs are kept in.
///
/// Write failures are logged and the line is lost; one bad write doesn't
/// stop the stream.
#[derive(Debug)]
pub struct RawSink<W: Write> {
    writer: W,
}

impl<W: Write> RawSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Format one record
    pub fn record(line: &Line) -> String {
        format!("{} {}", line.time().unwrap_or("-"), line)
    }
}

impl<W: Write> Sink for RawSink<W> {
    fn handle_line(&mut self, line: &Line) {
        if let Err(error) = writeln!(self.writer, "{}", Self::record(line)) {
            tracing::error!(%error, %line, "Couldn't write log line");
        }
    }

    fn close(&mut self) {
        if let Err(error) = self.writer.flush() {
            tracing::error!(%error, "Couldn't flush log output");
        }
    }
}
