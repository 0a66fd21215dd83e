//! Routing of query replies back to whoever asked.
//!
//! Several consumers share one connection, and any of them may ask the
//! server about a channel or nick. Replies don't say who they are for, so
//! the [`ReplyCorrelator`] remembers, per kind of query and per target,
//! who is waiting. When a reply arrives it is either delivered to exactly
//! those requesters, or, if nobody asked, falls through to default handling
//! (servers send many of these replies unprompted).
//!
//! Multi-line replies freeze their recipient set at the first data line:
//! someone who asks again while a reply is streaming waits for the next
//! one, rather than receiving half of this one.

use chanlog_proto::Nickname;

use std::collections::HashMap;

/// The kinds of query whose replies are correlated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum QueryKind {
    Who,
    Topic,
    Mode,
    Names,
}

/// Who a reply should go to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients<R> {
    /// Nobody asked specifically; use default routing
    All,
    Requesters(Vec<R>),
}

/// The outcome of routing one reply line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routing<R> {
    /// Deliver to these requesters only
    Deliver(Vec<R>),
    /// Not requested; handle the line the default way
    Fallthrough,
}

impl<R: Clone> From<&Recipients<R>> for Routing<R> {
    fn from(recipients: &Recipients<R>) -> Self {
        match recipients {
            Recipients::All => Routing::Fallthrough,
            Recipients::Requesters(list) => Routing::Deliver(list.clone()),
        }
    }
}

impl<R> From<Recipients<R>> for Routing<R> {
    fn from(recipients: Recipients<R>) -> Self {
        match recipients {
            Recipients::All => Routing::Fallthrough,
            Recipients::Requesters(list) => Routing::Deliver(list),
        }
    }
}

/// Query targets compare case-insensitively, like the names they are
type QueryKey = Nickname;

#[derive(Debug)]
pub struct ReplyCorrelator<R> {
    pending: HashMap<QueryKind, HashMap<QueryKey, Vec<R>>>,
    in_flight: HashMap<QueryKind, HashMap<QueryKey, Recipients<R>>>,
}

impl<R> Default for ReplyCorrelator<R> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }
}

impl<R: Clone> ReplyCorrelator<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `requester` asked a `kind` query about `key`.
    ///
    /// Returns true if a query for the same key was already outstanding, in
    /// which case the caller must not send another one upstream.
    pub fn register_request(&mut self, kind: QueryKind, key: &str, requester: R) -> bool {
        let waiting = self
            .pending
            .entry(kind)
            .or_default()
            .entry(QueryKey::from(key))
            .or_default();
        waiting.push(requester);
        waiting.len() > 1
    }

    /// Whether anyone is waiting for a `kind` reply about `key`
    pub fn is_pending(&self, kind: QueryKind, key: &str) -> bool {
        self.pending
            .get(&kind)
            .map_or(false, |table| table.contains_key(&QueryKey::from(key)))
    }

    /// Whether a multi-line `kind` reply about `key` is being received
    pub fn is_in_flight(&self, kind: QueryKind, key: &str) -> bool {
        self.in_flight
            .get(&kind)
            .map_or(false, |table| table.contains_key(&QueryKey::from(key)))
    }

    /// Route a reply that consists of a single line
    pub fn route_single_line(&mut self, kind: QueryKind, key: &str) -> Routing<R> {
        self.take_pending(kind, key).into()
    }

    /// Route one data line of a multi-line reply
    pub fn route_data_line(&mut self, kind: QueryKind, key: &str) -> Routing<R> {
        let key = QueryKey::from(key);

        if let Some(recipients) = self.in_flight.get(&kind).and_then(|t| t.get(&key)) {
            return recipients.into();
        }

        let recipients = self.take_pending(kind, key.as_str());
        let routing = Routing::from(&recipients);
        self.in_flight.entry(kind).or_default().insert(key, recipients);
        routing
    }

    /// Route the line that terminates a multi-line reply
    pub fn route_end_line(&mut self, kind: QueryKind, key: &str) -> Routing<R> {
        let in_flight = self
            .in_flight
            .get_mut(&kind)
            .and_then(|table| table.remove(&QueryKey::from(key)));

        match in_flight {
            Some(recipients) => recipients.into(),
            // No data lines: an empty result
            None => self.take_pending(kind, key).into(),
        }
    }

    fn take_pending(&mut self, kind: QueryKind, key: &str) -> Recipients<R> {
        match self
            .pending
            .get_mut(&kind)
            .and_then(|table| table.remove(&QueryKey::from(key)))
        {
            Some(requesters) => Recipients::Requesters(requesters),
            None => Recipients::All,
        }
    }
}
