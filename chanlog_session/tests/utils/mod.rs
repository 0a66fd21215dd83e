#![allow(dead_code)]

use chanlog_proto::Line;
use chanlog_session::prelude::*;
use chrono::DateTime;

use std::time::Duration;

pub mod transport;
use transport::Outbox;

/// When every test session's clock starts
pub const START: &str = "2008-09-25T18:32:40+03:00";

pub fn config() -> SessionConfig {
    let mut config = SessionConfig::new("bot", "bot", "Channel logger");
    config.channels = vec!["#chan".to_string()];
    config.admin = Some("boss".to_string());
    config.root_uri = Some("http://logs.example/".to_string());
    config
}

/// A session wired to an in-memory transport, a log collector and a clock
/// that only moves when the test says so
pub struct Harness {
    pub session: ServerSession<ManualClock>,
    pub clock: ManualClock,
    pub sent: Outbox,
    pub log: CollectSink,
}

impl Harness {
    pub fn new(config: SessionConfig) -> Self {
        init_tracing();
        let clock = ManualClock::new(DateTime::parse_from_rfc3339(START).unwrap());
        let log = CollectSink::new();
        let session = ServerSession::new(config, clock.clone(), Box::new(log.clone()));
        Self {
            session,
            clock,
            sent: Outbox::default(),
            log,
        }
    }

    pub fn connected() -> Self {
        let mut harness = Self::new(config());
        harness.connect();
        harness
    }

    /// Connected and welcomed, with the registration chatter cleared away
    pub fn registered() -> Self {
        let mut harness = Self::connected();
        harness.welcome("bot");
        harness.sent.take();
        harness.log.take();
        harness
    }

    pub fn connect(&mut self) {
        self.session.connection_made(Box::new(self.sent.clone())).unwrap();
    }

    pub fn welcome(&mut self, nick: &str) {
        self.receive(&format!(
            ":irc.test 001 {} :Welcome to the Internet Relay Network {}!bot@host.example",
            nick, nick
        ));
    }

    /// Deliver a raw line from the server, then let due timers run
    pub fn receive(&mut self, raw: &str) {
        self.session.handle_raw(raw).unwrap();
        self.session.poll_timers().unwrap();
    }

    pub fn send_from(&mut self, from: ConsumerId, raw: &str) {
        let line = Line::parse(raw, None).unwrap();
        self.session.send_from(line, from).unwrap();
        self.session.poll_timers().unwrap();
    }

    pub fn advance(&mut self, seconds: u64) {
        self.clock.advance(Duration::from_secs(seconds));
        self.session.poll_timers().unwrap();
    }

    /// Add a consumer, returning its id and what it receives
    pub fn consumer(&mut self) -> (ConsumerId, CollectSink) {
        let collected = CollectSink::new();
        let id = self.session.add_consumer(Box::new(collected.clone()));
        (id, collected)
    }

    pub fn logged(&self) -> Vec<String> {
        self.log.serialized()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn line(raw: &str) -> Line {
    Line::parse(raw, None).unwrap()
}
