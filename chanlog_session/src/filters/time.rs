use crate::pipeline::{Disposition, Sink, Stage};
use chanlog_proto::Line;

/// Passes on lines whose UTC time starts with a given prefix, such as a
/// date (`2008-09-25`) or a month (`2008-09`).
///
/// Lines without a usable timestamp are dropped.
pub struct TimeFilter {
    prefix: String,
    sink: Box<dyn Sink>,
}

impl TimeFilter {
    pub fn new(prefix: impl Into<String>, sink: Box<dyn Sink>) -> Self {
        Self {
            prefix: prefix.into(),
            sink,
        }
    }
}

impl Stage for TimeFilter {
    fn handle(&mut self, line: &Line) -> Disposition {
        let matches = line
            .utc_time()
            .map_or(false, |time| time.starts_with(&self.prefix));
        (!matches).into()
    }

    fn downstream(&mut self) -> Option<&mut (dyn Sink + 'static)> {
        Some(self.sink.as_mut())
    }
}
