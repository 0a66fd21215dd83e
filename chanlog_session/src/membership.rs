//! Tracking of who is in which channel.
//!
//! [`MembershipTracker`] keeps two indices, nick to channels and channel to
//! ordered roster, and keeps them in agreement: a channel is in a nick's set
//! exactly when the nick is in that channel's roster. Nicks and channels
//! compare case-insensitively; display casing is whatever was seen first.
//!
//! Servers do sometimes drop or reorder events. Anything that refers to
//! state we don't have is ignored (and logged at debug level); the next
//! roster refresh for the channel puts things right.

use chanlog_proto::prelude::*;

use itertools::Itertools;
use std::collections::{BTreeSet, HashMap};

/// Markers a server may put in front of a nick in a roster reply
const PRIVILEGE_MARKERS: &[char] = &['~', '&', '@', '%', '+'];

#[derive(Debug, Default, Clone)]
pub struct MembershipTracker {
    me: Option<Nickname>,
    self_channels: BTreeSet<ChannelName>,
    nick_channels: HashMap<Nickname, BTreeSet<ChannelName>>,
    channel_nicks: HashMap<ChannelName, Vec<Nickname>>,
    names_accumulator: HashMap<ChannelName, Vec<Nickname>>,
}

/// The argument of `line` that names the channel it concerns, for commands
/// that carry one
pub fn channel_argument(line: &Line) -> Option<&str> {
    let index = match line.command() {
        "JOIN" | "PART" | "KICK" | "PRIVMSG" | "NOTICE" | "TOPIC" | "MODE" => 0,
        numeric::RPL_TOPIC
        | numeric::RPL_NOTOPIC
        | numeric::RPL_TOPICWHOTIME
        | numeric::RPL_CREATIONTIME
        | numeric::RPL_CHANNELMODEIS
        | numeric::RPL_ENDOFNAMES => 1,
        numeric::RPL_NAMREPLY => 2,
        _ => return None,
    };
    line.arg(index)
}

impl MembershipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Our own nick, once the server has told us
    pub fn me(&self) -> Option<&Nickname> {
        self.me.as_ref()
    }

    pub fn is_me(&self, nick: &Nickname) -> bool {
        self.me.as_ref() == Some(nick)
    }

    /// Channels we are in
    pub fn self_channels(&self) -> &BTreeSet<ChannelName> {
        &self.self_channels
    }

    /// The tracked roster of `channel`
    pub fn roster(&self, channel: &ChannelName) -> Option<&[Nickname]> {
        self.channel_nicks.get(channel).map(Vec::as_slice)
    }

    /// The channels `nick` is known to be in
    pub fn channels_of(&self, nick: &Nickname) -> Option<&BTreeSet<ChannelName>> {
        self.nick_channels.get(nick)
    }

    pub fn is_on(&self, nick: &Nickname, channel: &ChannelName) -> bool {
        self.nick_channels
            .get(nick)
            .map_or(false, |channels| channels.contains(channel))
    }

    /// All nicks currently tracked in any channel
    pub fn nicks(&self) -> impl Iterator<Item = &Nickname> {
        self.nick_channels.keys()
    }

    /// All channels with a tracked roster
    pub fn channels(&self) -> impl Iterator<Item = &ChannelName> {
        self.channel_nicks.keys()
    }

    /// Whether `line` concerns `channel`.
    ///
    /// Lines without a channel argument (nick changes and quits) concern the
    /// channels their sender is in, so this must be asked before the line
    /// is applied.
    pub fn is_relevant(&self, line: &Line, channel: &ChannelName) -> bool {
        if let Some(target) = channel_argument(line) {
            return channel == target;
        }

        match line.command() {
            "NICK" | "QUIT" => line
                .source_nick()
                .map_or(false, |nick| self.is_on(&Nickname::from(nick), channel)),
            _ => false,
        }
    }

    /// Apply the membership effects of a line, if it has any
    pub fn apply(&mut self, line: &Line) {
        let source = line.source_nick().map(Nickname::from);

        match (line.command(), source) {
            (numeric::RPL_WELCOME, _) => {
                if let Some(nick) = line.arg(0) {
                    self.welcome(&Nickname::from(nick));
                }
            }
            ("JOIN", Some(actor)) => {
                if let Some(channel) = line.arg(0) {
                    self.join(&actor, &ChannelName::from(channel));
                }
            }
            ("PART", Some(actor)) => {
                if let Some(channel) = line.arg(0) {
                    self.part(&actor, &ChannelName::from(channel));
                }
            }
            ("KICK", _) => {
                if let (Some(channel), Some(target)) = (line.arg(0), line.arg(1)) {
                    self.kick(&Nickname::from(target), &ChannelName::from(channel));
                }
            }
            ("QUIT", Some(actor)) => self.quit(&actor),
            ("NICK", Some(old)) => {
                if let Some(new) = line.arg(0) {
                    self.nick_change(&old, &Nickname::from(new));
                }
            }
            (numeric::RPL_NAMREPLY, _) => {
                if let (Some(channel), Some(fragment)) = (line.arg(2), line.arg(3)) {
                    self.roster_chunk(&ChannelName::from(channel), fragment);
                }
            }
            (numeric::RPL_ENDOFNAMES, _) => {
                if let Some(channel) = line.arg(1) {
                    self.roster_complete(&ChannelName::from(channel));
                }
            }
            _ => {}
        }
    }

    /// A new connection has been welcomed; forget everything from before
    pub fn welcome(&mut self, me: &Nickname) {
        self.me = Some(me.clone());
        self.self_channels.clear();
        self.nick_channels.clear();
        self.channel_nicks.clear();
        self.names_accumulator.clear();
    }

    pub fn join(&mut self, actor: &Nickname, channel: &ChannelName) {
        if self.is_me(actor) && self.self_channels.insert(channel.clone()) {
            // Any roster we hold for a channel we weren't in is stale
            self.drop_roster(channel);
            self.channel_nicks.insert(channel.clone(), Vec::new());
        }

        self.nick_channels
            .entry(actor.clone())
            .or_default()
            .insert(channel.clone());

        let roster = self.channel_nicks.entry(channel.clone()).or_default();
        if !roster.contains(actor) {
            roster.push(actor.clone());
        }
    }

    pub fn part(&mut self, actor: &Nickname, channel: &ChannelName) {
        if !self.is_on(actor, channel) {
            tracing::debug!(%actor, %channel, "Part from untracked member");
        }
        self.remove_member(actor, channel);
    }

    pub fn kick(&mut self, target: &Nickname, channel: &ChannelName) {
        if !self.is_on(target, channel) {
            tracing::debug!(%target, %channel, "Kick of untracked member");
        }
        self.remove_member(target, channel);
    }

    pub fn quit(&mut self, actor: &Nickname) {
        let Some(channels) = self.nick_channels.remove(actor) else {
            tracing::debug!(%actor, "Quit from untracked nick");
            return;
        };

        for channel in &channels {
            if let Some(roster) = self.channel_nicks.get_mut(channel) {
                roster.retain(|nick| nick != actor);
            }
        }

        if self.is_me(actor) {
            for channel in &channels {
                self.self_channels.remove(channel);
                self.drop_roster(channel);
            }
        }
    }

    pub fn nick_change(&mut self, old: &Nickname, new: &Nickname) {
        if self.is_me(old) {
            self.me = Some(new.clone());
        }

        let Some(channels) = self.nick_channels.remove(old) else {
            tracing::debug!(%old, %new, "Nick change from untracked nick");
            return;
        };

        for channel in &channels {
            let Some(roster) = self.channel_nicks.get_mut(channel) else {
                continue;
            };
            let Some(pos) = roster.iter().position(|nick| nick == old) else {
                continue;
            };
            if old != new && roster.contains(new) {
                roster.remove(pos);
            } else {
                roster[pos] = new.clone();
            }
        }

        self.nick_channels
            .entry(new.clone())
            .or_default()
            .extend(channels);
    }

    /// Add one reply's worth of nicks to the roster being refreshed
    pub fn roster_chunk(&mut self, channel: &ChannelName, fragment: &str) {
        let accumulated = self.names_accumulator.entry(channel.clone()).or_default();
        accumulated.extend(
            fragment
                .split(' ')
                .map(|token| token.trim_start_matches(PRIVILEGE_MARKERS))
                .filter(|nick| !nick.is_empty())
                .map(Nickname::from),
        );
    }

    /// Replace the roster of `channel` with what has been accumulated
    pub fn roster_complete(&mut self, channel: &ChannelName) {
        let Some(accumulated) = self.names_accumulator.remove(channel) else {
            tracing::debug!(%channel, "End of roster with no roster replies");
            return;
        };
        let new_roster: Vec<_> = accumulated.into_iter().unique().collect();

        if let Some(old_roster) = self.channel_nicks.remove(channel) {
            for nick in &old_roster {
                self.forget_channel(nick, channel);
            }
        }

        for nick in &new_roster {
            self.nick_channels
                .entry(nick.clone())
                .or_default()
                .insert(channel.clone());
        }

        self.channel_nicks.insert(channel.clone(), new_roster);
    }

    /// Whether the two indices agree with each other
    pub fn is_consistent(&self) -> bool {
        let forward = self.nick_channels.iter().all(|(nick, channels)| {
            channels.iter().all(|channel| {
                self.channel_nicks
                    .get(channel)
                    .map_or(false, |roster| roster.contains(nick))
            })
        });

        let backward = self.channel_nicks.iter().all(|(channel, roster)| {
            roster.iter().all(|nick| self.is_on(nick, channel))
        });

        forward && backward
    }

    fn remove_member(&mut self, nick: &Nickname, channel: &ChannelName) {
        if let Some(roster) = self.channel_nicks.get_mut(channel) {
            roster.retain(|n| n != nick);
        }
        self.forget_channel(nick, channel);

        if self.is_me(nick) {
            self.self_channels.remove(channel);
            self.drop_roster(channel);
        }
    }

    fn drop_roster(&mut self, channel: &ChannelName) {
        if let Some(roster) = self.channel_nicks.remove(channel) {
            for nick in &roster {
                self.forget_channel(nick, channel);
            }
        }
    }

    fn forget_channel(&mut self, nick: &Nickname, channel: &ChannelName) {
        if let Some(channels) = self.nick_channels.get_mut(nick) {
            channels.remove(channel);
            if channels.is_empty() {
                self.nick_channels.remove(nick);
            }
        }
    }
}
