use crate::membership::MembershipTracker;
use crate::pipeline::{Disposition, Sink, Stage};
use chanlog_proto::{ChannelName, Line};

/// Passes on the lines that concern one channel.
///
/// Whether a quit or nick change concerns the channel depends on who was
/// in it, so the filter tracks membership of every channel it sees.
pub struct ChannelFilter {
    channel: ChannelName,
    tracker: MembershipTracker,
    sink: Box<dyn Sink>,
}

impl ChannelFilter {
    pub fn new(channel: impl Into<ChannelName>, sink: Box<dyn Sink>) -> Self {
        Self {
            channel: channel.into(),
            tracker: MembershipTracker::new(),
            sink,
        }
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    pub fn tracker(&self) -> &MembershipTracker {
        &self.tracker
    }
}

impl Stage for ChannelFilter {
    fn handle(&mut self, line: &Line) -> Disposition {
        let relevant = self.tracker.is_relevant(line, &self.channel);
        self.tracker.apply(line);

        if relevant {
            Disposition::Fallback
        } else {
            tracing::trace!(channel = %self.channel, %line, "Not for this channel");
            Disposition::Handled
        }
    }

    fn downstream(&mut self) -> Option<&mut (dyn Sink + 'static)> {
        Some(self.sink.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipe;
    use crate::sinks::CollectSink;
    use pretty_assertions::assert_eq;

    const SESSION: &[&str] = &[
        ":irc.jyu.fi 001 bot :Welcome bot!b@h",
        ":bot!b@h JOIN #chan",
        ":bot!b@h JOIN #elsewhere",
        ":irc.jyu.fi 353 bot = #chan :bot @alice",
        ":irc.jyu.fi 366 bot #chan :End of NAMES list.",
        ":irc.jyu.fi 353 bot = #elsewhere :bot carol",
        ":irc.jyu.fi 366 bot #elsewhere :End of NAMES list.",
        ":alice!a@h PRIVMSG #CHAN :+hello",
        ":carol!c@h PRIVMSG #elsewhere :+not here",
        ":carol!c@h NICK caroline",
        ":alice!a@h NICK alicia",
        ":alicia!a@h QUIT :bye",
        ":caroline!c@h QUIT :bye",
    ];

    #[test]
    fn passes_only_channel_lines() {
        let collected = CollectSink::new();
        let mut filter = Pipe::new(ChannelFilter::new("#chan", Box::new(collected.clone())));

        for raw in SESSION {
            filter.handle_line(&Line::parse(raw, None).unwrap());
        }

        let commands: Vec<_> = collected
            .lines()
            .iter()
            .map(|l| l.command().to_string())
            .collect();
        assert_eq!(
            commands,
            ["JOIN", "RPL_NAMREPLY", "RPL_ENDOFNAMES", "PRIVMSG", "NICK", "QUIT"]
        );
        assert!(filter.stage().tracker().is_consistent());
    }

    #[test]
    fn close_reaches_sink() {
        let collected = CollectSink::new();
        let mut filter = Pipe::new(ChannelFilter::new("#chan", Box::new(collected.clone())));
        filter.close();
        assert_eq!(collected.close_count(), 1);
    }
}
