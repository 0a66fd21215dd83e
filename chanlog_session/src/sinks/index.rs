use crate::pipeline::Sink;
use chanlog_proto::{is_channel_name, Line};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Which channels were active, and on which days
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelIndex {
    /// Channel names, lower-cased and without the leading `#`
    pub channels: BTreeSet<String>,
    /// UTC dates, `YYYY-MM-DD`
    pub days: BTreeSet<String>,
    pub day_channels: BTreeMap<String, BTreeSet<String>>,
}

impl ChannelIndex {
    pub fn record(&mut self, day: &str, channel: &str) {
        let channel = channel.trim_start_matches('#').to_ascii_lowercase();
        self.days.insert(day.to_string());
        self.day_channels
            .entry(day.to_string())
            .or_default()
            .insert(channel.clone());
        self.channels.insert(channel);
    }
}

/// Collects a [`ChannelIndex`] from channel messages
#[derive(Debug, Default)]
pub struct ChannelsAndDaysSink {
    index: ChannelIndex,
}

impl ChannelsAndDaysSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> &ChannelIndex {
        &self.index
    }

    pub fn into_index(self) -> ChannelIndex {
        self.index
    }
}

impl Sink for ChannelsAndDaysSink {
    fn handle_line(&mut self, line: &Line) {
        if !line.is("PRIVMSG") {
            return;
        }
        let Some(target) = line.arg(0).filter(|t| is_channel_name(t)) else {
            return;
        };
        let Some(day) = line.utc_time().and_then(|t| t.split('T').next()) else {
            tracing::debug!(%line, "Channel message without a usable timestamp");
            return;
        };

        self.index.record(day, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feed(sink: &mut ChannelsAndDaysSink, time: &str, raw: &str) {
        sink.handle_line(&Line::parse(raw, Some(time)).unwrap());
    }

    #[test]
    fn collects_channels_and_days() {
        let mut sink = ChannelsAndDaysSink::new();
        feed(&mut sink, "2008-09-25T18:32:40+03:00", ":a!u@h PRIVMSG #Sioc :+hi");
        // Local midnight is still the previous day in UTC
        feed(&mut sink, "2008-09-26T01:00:00+03:00", ":a!u@h PRIVMSG #other :+hi");
        feed(&mut sink, "2008-09-26T12:00:00Z", ":a!u@h PRIVMSG #sioc :+again");
        feed(&mut sink, "2008-09-27T12:00:00Z", ":a!u@h PRIVMSG bot :+private");
        feed(&mut sink, "2008-09-28T12:00:00Z", ":a!u@h JOIN #sioc");

        let index = sink.into_index();
        assert_eq!(index.channels.iter().collect::<Vec<_>>(), ["other", "sioc"]);
        assert_eq!(index.days.iter().collect::<Vec<_>>(), ["2008-09-25", "2008-09-26"]);
        assert_eq!(
            index.day_channels["2008-09-25"].iter().collect::<Vec<_>>(),
            ["other", "sioc"]
        );
        assert_eq!(index.day_channels["2008-09-26"].iter().collect::<Vec<_>>(), ["sioc"]);
    }
}
