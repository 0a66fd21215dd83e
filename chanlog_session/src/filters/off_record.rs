use crate::pipeline::{Disposition, Sink, Stage};
use chanlog_proto::content::MessageBody;
use chanlog_proto::Line;

/// Drops messages whose sender marked them `[off]` the record
pub struct OffRecordFilter {
    identify_msg: bool,
    sink: Box<dyn Sink>,
}

impl OffRecordFilter {
    /// `identify_msg` says whether message bodies carry the IDENTIFY-MSG
    /// marker, as they do in logs written by a live session.
    pub fn new(identify_msg: bool, sink: Box<dyn Sink>) -> Self {
        Self { identify_msg, sink }
    }
}

impl Stage for OffRecordFilter {
    fn handle(&mut self, line: &Line) -> Disposition {
        match line.command() {
            "PRIVMSG" => MessageBody::of(line, self.identify_msg)
                .map_or(false, |body| body.is_off_record())
                .into(),
            _ => Disposition::Fallback,
        }
    }

    fn downstream(&mut self) -> Option<&mut (dyn Sink + 'static)> {
        Some(self.sink.as_mut())
    }
}
