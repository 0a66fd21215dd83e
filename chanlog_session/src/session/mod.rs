//! The live session with one server.
//!
//! A [`ServerSession`] is created once and lives across connections; the
//! state belonging to one connection is created by
//! [`connection_made`](ServerSession::connection_made) and dropped when the
//! connection goes away. Everything happens on one thread: received lines
//! are handled one at a time to completion, and timers (registration and
//! ping timeouts, keepalives, the echo of our own messages into the log)
//! run between them when the owner calls
//! [`poll_timers`](ServerSession::poll_timers).
//!
//! Consumers register a sink with the session and get back a
//! [`ConsumerId`]. Lines they send through the session are passed upstream,
//! and replies to their queries are delivered to their sink only. Anything
//! no consumer asked for goes to the log sink.

use crate::correlator::{QueryKind, ReplyCorrelator, Routing};
use crate::errors::SessionError;
use crate::membership::MembershipTracker;
use crate::pipeline::{Disposition, Sink};
use crate::utils::OrLog;
use chanlog_proto::content::{mark_identified, MessageBody};
use chanlog_proto::prelude::*;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

mod clock;
pub use clock::*;

mod config;
pub use config::SessionConfig;

mod timers;
pub use timers::{TimerId, Timeline};

mod transport;
pub use transport::Transport;

/// Token used for our own keepalive pings
pub const KEEPALIVE_TOKEN: &str = "KEEPALIVE";

/// Identifies a consumer registered with a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConsumerId(usize);

/// Things that happen later on a session's timeline
#[derive(Debug, Clone, PartialEq)]
pub enum TimerAction {
    RegistrationTimeout,
    PingTimeout,
    Keepalive,
    /// Log a line after the one being handled
    EchoLog(Line),
}

/// State that lives exactly as long as one connection
struct Connection {
    transport: Box<dyn Transport>,
    registered: bool,
    nick: Nickname,
    /// `user@host`, as the server sees us
    user: Option<String>,
    server_prefix: Option<String>,
    away: bool,
    away_message: Option<String>,
    membership: MembershipTracker,
    correlator: ReplyCorrelator<ConsumerId>,
    pings: HashSet<String>,
    /// The registration or ping timeout currently armed
    timeout: Option<TimerId>,
}

impl Connection {
    fn client_prefix(&self) -> Option<String> {
        self.user
            .as_ref()
            .map(|user| format!("{}!{}", self.nick, user))
    }

    fn is_me(&self, nick: &str) -> bool {
        self.nick == nick
    }
}

pub struct ServerSession<C: Clock = SystemClock> {
    config: SessionConfig,
    clock: C,
    log: Box<dyn Sink>,
    consumers: HashMap<ConsumerId, Box<dyn Sink>>,
    next_consumer: usize,
    /// Lines consumers sent while we weren't registered
    store: Vec<(Line, ConsumerId)>,
    timeline: Timeline<TimerAction>,
    connection: Option<Connection>,
}

impl<C: Clock> ServerSession<C> {
    pub fn new(config: SessionConfig, clock: C, log: Box<dyn Sink>) -> Self {
        Self {
            config,
            clock,
            log,
            consumers: HashMap::new(),
            next_consumer: 0,
            store: Vec::new(),
            timeline: Timeline::new(),
            connection: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Add a consumer; replies to its queries will be delivered to `sink`
    pub fn add_consumer(&mut self, sink: Box<dyn Sink>) -> ConsumerId {
        let id = ConsumerId(self.next_consumer);
        self.next_consumer += 1;
        self.consumers.insert(id, sink);
        id
    }

    /// Remove a consumer, closing its sink
    pub fn remove_consumer(&mut self, id: ConsumerId) {
        if let Some(mut sink) = self.consumers.remove(&id) {
            sink.close();
        }
        self.store.retain(|(_, from)| *from != id);
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_registered(&self) -> bool {
        self.connection.as_ref().map_or(false, |c| c.registered)
    }

    /// Our nick on the current connection
    pub fn nick(&self) -> Option<&Nickname> {
        self.connection.as_ref().map(|c| &c.nick)
    }

    /// Our `user@host` on the current connection
    pub fn user(&self) -> Option<&str> {
        self.connection.as_ref().and_then(|c| c.user.as_deref())
    }

    pub fn server_prefix(&self) -> Option<&str> {
        self.connection
            .as_ref()
            .and_then(|c| c.server_prefix.as_deref())
    }

    pub fn is_away(&self) -> bool {
        self.connection.as_ref().map_or(false, |c| c.away)
    }

    /// The away message we last asked for
    pub fn away_message(&self) -> Option<&str> {
        self.connection
            .as_ref()
            .and_then(|c| c.away_message.as_deref())
    }

    pub fn membership(&self) -> Option<&MembershipTracker> {
        self.connection.as_ref().map(|c| &c.membership)
    }

    /// Time until the next timer is due, if any is scheduled
    pub fn next_timer_in(&self) -> Option<Duration> {
        self.timeline
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.clock.elapsed()))
    }

    /// The transport is up: start registering
    pub fn connection_made(&mut self, transport: Box<dyn Transport>) -> Result<(), SessionError> {
        tracing::info!(nick = %self.config.nick, "Server connected");

        self.timeline.clear();
        self.connection = Some(Connection {
            transport,
            registered: false,
            nick: Nickname::from(self.config.nick.as_str()),
            user: None,
            server_prefix: None,
            away: false,
            away_message: None,
            membership: MembershipTracker::new(),
            correlator: ReplyCorrelator::new(),
            pings: HashSet::new(),
            timeout: None,
        });

        self.send_line(Line::new("NICK", [self.config.nick.clone()]), None)?;
        self.send_line(
            Line::new(
                "USER",
                [
                    self.config.user.clone(),
                    "*".to_string(),
                    "*".to_string(),
                    self.config.realname.clone(),
                ],
            ),
            None,
        )?;

        let timeout = self.schedule(self.config.registration_timeout(), TimerAction::RegistrationTimeout);
        if let Some(conn) = &mut self.connection {
            conn.timeout = Some(timeout);
        }
        Ok(())
    }

    /// The transport has gone away underneath us
    pub fn connection_lost(&mut self, reason: &str) {
        let Some(conn) = self.connection.take() else {
            tracing::debug!(reason, "Connection lost after teardown");
            return;
        };

        tracing::warn!(reason, "Disconnected from server");
        self.log_closing_link(&conn, reason);
        self.timeline.clear();
    }

    /// Close the connection ourselves
    pub fn lose_connection(&mut self, reason: &str) {
        if !self.is_connected() {
            return;
        }

        self.send_line(Line::new("QUIT", [reason]), None)
            .or_log("sending QUIT");

        if let Some(mut conn) = self.connection.take() {
            self.log_closing_link(&conn, reason);
            conn.transport.close();
        }
        self.timeline.clear();
    }

    /// Shut down for good, closing every sink
    pub fn close(&mut self) {
        self.lose_connection("Shutting down");
        for sink in self.consumers.values_mut() {
            sink.close();
        }
        self.log.close();
    }

    /// Handle one raw line as received from the transport.
    ///
    /// Lines that can't be parsed are reported and skipped.
    pub fn handle_raw(&mut self, raw: &str) -> Result<(), SessionError> {
        let time = w3c_timestamp(&self.clock.now());
        match Line::parse(raw, Some(&time)) {
            Ok(line) => self.handle_received(&line),
            Err(error) => {
                tracing::warn!(%error, raw, "Skipping unparseable line");
                Ok(())
            }
        }
    }

    /// Handle one line from the server
    pub fn handle_received(&mut self, line: &Line) -> Result<(), SessionError> {
        tracing::trace!(%line, "Received");

        if self.connection.is_none() {
            tracing::debug!(%line, "Line received while not connected");
            return Ok(());
        }

        let disposition = self.dispatch(line)?;

        if let Some(conn) = &mut self.connection {
            conn.membership.apply(line);
        }

        if disposition == Disposition::Fallback {
            self.log.handle_line(line);
        }
        Ok(())
    }

    /// Send a line on behalf of a consumer.
    ///
    /// Before the server has accepted our registration, the line is kept and
    /// sent once it has.
    pub fn send_from(&mut self, line: Line, from: ConsumerId) -> Result<(), SessionError> {
        if self.is_registered() {
            self.send_line(line, Some(from))
        } else {
            tracing::debug!(%line, ?from, "Not registered; storing line");
            self.store.push((line, from));
            Ok(())
        }
    }

    /// Send a line to the server, keeping track of what it asks for
    pub fn send_line(&mut self, line: Line, from: Option<ConsumerId>) -> Result<(), SessionError> {
        let now = self.clock.now();
        let Some(conn) = &mut self.connection else {
            return Err(SessionError::NotConnected);
        };

        let query = match (line.command(), line.args().len()) {
            ("PING", _) => {
                if let Some(token) = line.arg(0) {
                    conn.pings.insert(token.to_string());
                }
                None
            }
            ("WHO", _) => Some(QueryKind::Who),
            ("NAMES", _) => Some(QueryKind::Names),
            ("TOPIC", 1) => Some(QueryKind::Topic),
            ("MODE", 1) => Some(QueryKind::Mode),
            ("AWAY", _) => {
                if let Some(message) = line.arg(0).filter(|m| !m.is_empty()) {
                    conn.away_message = Some(message.to_string());
                }
                None
            }
            _ => None,
        };

        let request = match (query, line.arg(0), from) {
            (Some(kind), Some(key), Some(from)) => Some((kind, key, from)),
            _ => None,
        };
        if let Some((kind, key, from)) = request {
            if conn.correlator.is_pending(kind, key) {
                conn.correlator.register_request(kind, key, from);
                tracing::debug!(%kind, key, ?from, "Query already pending; not resending");
                return Ok(());
            }
        }

        let mut echo = None;
        if line.is("PRIVMSG") || line.is("NOTICE") {
            match (conn.client_prefix(), line.arg(0), line.arg(1)) {
                (Some(prefix), Some(target), Some(content)) => {
                    let time = w3c_timestamp(&now);
                    echo = Some(
                        Line::new(line.command(), [target.to_string(), mark_identified(content)])
                            .with_prefix(prefix)
                            .with_time(time),
                    );
                }
                _ => tracing::debug!(%line, "Can't log our own message without a client prefix"),
            }
        }

        tracing::debug!(%line, "Sending to server");
        conn.transport.send_raw(&line.serialize())?;

        // Only a query that reached the server can be answered
        if let Some((kind, key, from)) = request {
            conn.correlator.register_request(kind, key, from);
        }

        if let Some(echo) = echo {
            // After the line currently being handled
            self.schedule(Duration::ZERO, TimerAction::EchoLog(echo));
        }
        Ok(())
    }

    /// Run every timer that has come due
    pub fn poll_timers(&mut self) -> Result<(), SessionError> {
        while let Some((id, action)) = self.timeline.pop_due(self.clock.elapsed()) {
            tracing::trace!(?id, ?action, "Timer fired");
            self.run_timer(id, action)?;
        }
        Ok(())
    }

    fn run_timer(&mut self, id: TimerId, action: TimerAction) -> Result<(), SessionError> {
        match action {
            TimerAction::EchoLog(line) => self.log.handle_line(&line),
            TimerAction::Keepalive => self.ping()?,
            TimerAction::RegistrationTimeout => self.timeout_fired(id, "Registration timeout"),
            TimerAction::PingTimeout => self.timeout_fired(id, "Pong timeout"),
        }
        Ok(())
    }

    fn timeout_fired(&mut self, id: TimerId, reason: &str) {
        let armed = self.connection.as_ref().and_then(|c| c.timeout);
        if armed == Some(id) {
            self.lose_connection(reason);
        } else {
            tracing::debug!(?id, reason, "Stale timeout");
        }
    }

    fn schedule(&mut self, delay: Duration, action: TimerAction) -> TimerId {
        let deadline = self.clock.elapsed() + delay;
        self.timeline.schedule(deadline, action)
    }

    fn cancel_timeout(&mut self) {
        if let Some(id) = self.connection.as_mut().and_then(|c| c.timeout.take()) {
            self.timeline.cancel(id);
        }
    }

    fn ping(&mut self) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Ok(());
        }
        self.send_line(Line::new("PING", [KEEPALIVE_TOKEN]), None)?;
        let timeout = self.schedule(self.config.ping_timeout(), TimerAction::PingTimeout);
        if let Some(conn) = &mut self.connection {
            conn.timeout = Some(timeout);
        }
        Ok(())
    }

    fn log_closing_link(&mut self, conn: &Connection, reason: &str) {
        let text = format!(
            "Closing Link: {}[{}] ({})",
            conn.nick,
            conn.user.as_deref().unwrap_or("*"),
            reason
        );
        let line = Line::new("ERROR", [text]).with_time(w3c_timestamp(&self.clock.now()));
        self.log.handle_line(&line);
    }

    fn deliver(&mut self, routing: Routing<ConsumerId>, line: &Line) -> Disposition {
        match routing {
            Routing::Fallthrough => Disposition::Fallback,
            Routing::Deliver(recipients) => {
                for id in recipients {
                    match self.consumers.get_mut(&id) {
                        Some(sink) => sink.handle_line(line),
                        None => tracing::debug!(?id, %line, "Reply for a departed consumer"),
                    }
                }
                Disposition::Handled
            }
        }
    }

    fn dispatch(&mut self, line: &Line) -> Result<Disposition, SessionError> {
        Ok(match line.command() {
            numeric::RPL_WELCOME => self.on_welcome(line)?,
            "PING" => self.on_ping(line)?,
            "PONG" => self.on_pong(line),
            numeric::ERR_NICKNAMEINUSE => self.on_nick_in_use(line)?,
            numeric::ERR_UNAVAILRESOURCE => match line.arg(1) {
                Some(target) if !is_channel_name(target) => self.on_nick_in_use(line)?,
                _ => Disposition::Fallback,
            },
            "PRIVMSG" => self.on_privmsg(line)?,
            "NICK" => self.on_nick(line),
            "JOIN" => self.on_join(line),
            numeric::RPL_NOWAWAY => self.set_away(true),
            numeric::RPL_UNAWAY => self.set_away(false),

            numeric::RPL_WHOREPLY => self.route_data(QueryKind::Who, line, 1),
            numeric::RPL_ENDOFWHO => self.route_end(QueryKind::Who, line, 1),
            numeric::RPL_NAMREPLY => self.route_data(QueryKind::Names, line, 2),
            numeric::RPL_ENDOFNAMES => self.route_end(QueryKind::Names, line, 1),
            numeric::RPL_TOPIC | numeric::RPL_NOTOPIC => self.route_single(QueryKind::Topic, line, 1),
            numeric::RPL_CHANNELMODEIS => self.route_single(QueryKind::Mode, line, 1),
            numeric::RPL_UMODEIS => self.route_single(QueryKind::Mode, line, 0),

            _ => Disposition::Fallback,
        })
    }

    fn route_single(&mut self, kind: QueryKind, line: &Line, key_index: usize) -> Disposition {
        let Some(key) = line.arg(key_index) else {
            return Disposition::Fallback;
        };
        let routing = match &mut self.connection {
            Some(conn) => conn.correlator.route_single_line(kind, key),
            None => Routing::Fallthrough,
        };
        self.deliver(routing, line)
    }

    fn route_data(&mut self, kind: QueryKind, line: &Line, key_index: usize) -> Disposition {
        let Some(key) = line.arg(key_index) else {
            return Disposition::Fallback;
        };
        let routing = match &mut self.connection {
            Some(conn) => conn.correlator.route_data_line(kind, key),
            None => Routing::Fallthrough,
        };
        self.deliver(routing, line)
    }

    fn route_end(&mut self, kind: QueryKind, line: &Line, key_index: usize) -> Disposition {
        let Some(key) = line.arg(key_index) else {
            return Disposition::Fallback;
        };
        let routing = match &mut self.connection {
            Some(conn) => conn.correlator.route_end_line(kind, key),
            None => Routing::Fallthrough,
        };
        self.deliver(routing, line)
    }

    fn on_welcome(&mut self, line: &Line) -> Result<Disposition, SessionError> {
        if let Some(conn) = &mut self.connection {
            conn.registered = true;
            conn.server_prefix = line.prefix().map(str::to_string);
            if let Some(nick) = line.arg(0) {
                conn.nick = Nickname::from(nick);
            }
            // The welcome text ends with our full nick!user@host
            conn.user = line
                .trailing()
                .and_then(|text| text.split(' ').last())
                .map(|word| parse_prefix(word).1.to_string());
            tracing::info!(nick = %conn.nick, user = ?conn.user, "Registered with server");
        }

        self.cancel_timeout();
        self.ping()?;

        if self.config.identify_msg {
            self.send_line(Line::new("CAPAB", ["IDENTIFY-MSG"]), None)?;
        }

        for channel in self.config.channels.clone() {
            self.send_line(Line::new("JOIN", [channel]), None)?;
        }

        for (line, from) in std::mem::take(&mut self.store) {
            self.send_line(line, Some(from))?;
        }

        Ok(Disposition::Fallback)
    }

    fn on_ping(&mut self, line: &Line) -> Result<Disposition, SessionError> {
        let token = line.arg(0).unwrap_or_default().to_string();
        self.send_line(Line::new("PONG", [token]), None)?;
        Ok(Disposition::Handled)
    }

    fn on_pong(&mut self, line: &Line) -> Disposition {
        let Some(token) = line.arg(1) else {
            return Disposition::Fallback;
        };
        let Some(conn) = &mut self.connection else {
            return Disposition::Fallback;
        };
        if !conn.pings.remove(token) {
            return Disposition::Fallback;
        }

        if token == KEEPALIVE_TOKEN {
            if let Some(id) = conn.timeout.take() {
                self.timeline.cancel(id);
                self.schedule(self.config.keepalive_interval(), TimerAction::Keepalive);
            }
        }
        Disposition::Handled
    }

    fn on_nick_in_use(&mut self, line: &Line) -> Result<Disposition, SessionError> {
        if let Some(attempted) = line.arg(1) {
            let retry = format!("{}_", attempted);
            tracing::info!(attempted, %retry, "Nick unavailable; retrying");
            if let Some(conn) = &mut self.connection {
                if !conn.registered {
                    conn.nick = Nickname::from(retry.as_str());
                }
            }
            self.send_line(Line::new("NICK", [retry]), None)?;
        }
        Ok(Disposition::Fallback)
    }

    fn on_nick(&mut self, line: &Line) -> Disposition {
        if let (Some(conn), Some(source), Some(new)) = (&mut self.connection, line.source_nick(), line.arg(0)) {
            if conn.is_me(source) {
                conn.nick = Nickname::from(new);
            }
        }
        Disposition::Fallback
    }

    fn on_join(&mut self, line: &Line) -> Disposition {
        if let (Some(conn), Some(prefix)) = (&mut self.connection, line.prefix()) {
            if let (Some(nick), account) = parse_prefix(prefix) {
                // The first place the server tells us our real user@host
                if conn.is_me(nick) {
                    conn.user = Some(account.to_string());
                }
            }
        }
        Disposition::Fallback
    }

    fn set_away(&mut self, away: bool) -> Disposition {
        if let Some(conn) = &mut self.connection {
            conn.away = away;
        }
        Disposition::Fallback
    }

    fn on_privmsg(&mut self, line: &Line) -> Result<Disposition, SessionError> {
        let (Some(target), Some(content)) = (line.arg(0), line.arg(1)) else {
            return Ok(Disposition::Fallback);
        };
        let Some(me) = self.nick().cloned() else {
            return Ok(Disposition::Fallback);
        };

        if is_channel_name(target) {
            let body = MessageBody::parse(content, self.config.identify_msg);
            if is_pointer_request(body.text, me.as_str()) {
                self.answer_pointer(line, target)?;
            }
        } else if me == target && self.is_from_admin(line) {
            // With IDENTIFY-MSG the leading + is the server's mark that the
            // sender is identified
            if let Some(raw) = content.strip_prefix("+do ") {
                match Line::parse(raw, None) {
                    Ok(command) => self.send_line(command, None)?,
                    Err(error) => tracing::warn!(%error, raw, "Admin sent an unparseable line"),
                }
            }
        }

        Ok(Disposition::Fallback)
    }

    fn is_from_admin(&self, line: &Line) -> bool {
        match (&self.config.admin, line.source_nick()) {
            (Some(admin), Some(source)) => Nickname::from(admin.as_str()) == source,
            _ => false,
        }
    }

    fn answer_pointer(&mut self, line: &Line, channel: &str) -> Result<(), SessionError> {
        let Some(root) = self.config.root_uri.clone() else {
            tracing::debug!("Asked for a pointer with no root URI configured");
            return Ok(());
        };
        let Some(time) = line.utc_time() else {
            tracing::debug!(%line, "Asked for a pointer to a line without a time");
            return Ok(());
        };

        let answer = format!("That line is {}", permalink(&root, channel, time));
        self.send_line(Line::new("NOTICE", [channel.to_string(), answer]), None)
    }
}

/// Whether `text` is `<nick>: pointer` (or with any other separator)
fn is_pointer_request(text: &str, nick: &str) -> bool {
    let Some(head) = text.get(..nick.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(nick) {
        return false;
    }
    let mut rest = text[nick.len()..].chars();
    rest.next().is_some() && rest.as_str().trim() == "pointer"
}

/// The published address of the line at `utc_time` in `channel`
pub fn permalink(root: &str, channel: &str, utc_time: &str) -> String {
    format!(
        "{}{}/{}",
        root,
        channel.trim_start_matches('#').to_ascii_lowercase(),
        utc_time.trim_end_matches('Z').replacen('T', "#", 1)
    )
}
