use crate::errors::ParseError;
use crate::numeric;
use crate::timestamp::canonical_utc;

use std::fmt;
use std::str::FromStr;

/// Split a message prefix into nick and account.
///
/// A prefix of the form `nick!user@host` yields `(Some(nick), "user@host")`;
/// anything else is a server prefix and yields `(None, prefix)`.
pub fn parse_prefix(prefix: &str) -> (Option<&str>, &str) {
    match prefix.split_once('!') {
        Some((nick, account)) if !account.contains('!') => (Some(nick), account),
        _ => (None, prefix),
    }
}

/// One line of the protocol.
///
/// A `Line` is immutable once built. It is created either by parsing
/// received text, or from a command and arguments for lines that originate
/// locally. The command is always held in canonical form: upper-cased, with
/// known numerics replaced by their symbolic names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    prefix: Option<String>,
    command: String,
    args: Vec<String>,
    time: Option<String>,
    utc_time: Option<String>,
}

impl Line {
    /// Build a line from its parts
    pub fn new<I, S>(command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: None,
            command: numeric::canonical_command(command),
            args: args.into_iter().map(Into::into).collect(),
            time: None,
            utc_time: None,
        }
    }

    /// Parse a raw protocol line, stamping it with the time it arrived
    pub fn parse(raw: &str, time: Option<&str>) -> Result<Self, ParseError> {
        let mut raw = raw.trim_end_matches(['\r', '\n']).trim_start();
        if raw.is_empty() {
            return Err(ParseError::Empty);
        }

        if raw.starts_with('@') {
            // Message tags carry nothing we use; skip them
            let Some(space_offset) = raw.find(' ') else {
                return Err(ParseError::MissingCommand(raw.to_string()));
            };
            raw = raw[space_offset..].trim_start();
        }

        let mut prefix = None;
        if let Some(rest) = raw.strip_prefix(':') {
            let Some(space_offset) = rest.find(' ') else {
                return Err(ParseError::MissingCommand(raw.to_string()));
            };
            if space_offset > 0 {
                prefix = Some(rest[..space_offset].to_string());
            }
            raw = rest[space_offset..].trim_start();
        }

        if raw.is_empty() {
            return Err(ParseError::MissingCommand(raw.to_string()));
        }

        let (command, mut rest) = match raw.find(' ') {
            Some(offset) => (&raw[..offset], &raw[offset + 1..]),
            None => (raw, ""),
        };

        let mut args = Vec::new();
        loop {
            if let Some(arg) = rest.strip_prefix(':') {
                args.push(arg.to_string());
                break;
            }

            match rest.find(' ') {
                Some(offset) => {
                    let arg = &rest[..offset];
                    if !arg.is_empty() {
                        args.push(arg.to_string());
                    }
                    rest = &rest[offset + 1..];
                }
                None => {
                    if !rest.is_empty() {
                        args.push(rest.to_string());
                    }
                    break;
                }
            }
        }

        let line = Self {
            prefix,
            command: numeric::canonical_command(command),
            args,
            time: None,
            utc_time: None,
        };

        Ok(match time {
            Some(time) => line.with_time(time),
            None => line,
        })
    }

    /// Attach a source prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Attach an arrival time, deriving the canonical UTC form from it
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        let time = time.into();
        self.utc_time = match canonical_utc(&time) {
            Ok(utc) => Some(utc),
            Err(error) => {
                tracing::debug!(%error, "Couldn't normalize line timestamp");
                None
            }
        };
        self.time = Some(time);
        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The nick part of the prefix, if the line came from a user
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_deref().and_then(|p| parse_prefix(p).0)
    }

    /// The canonical command name
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is(&self, command: &str) -> bool {
        self.command == command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// The last argument, which is usually free text
    pub fn trailing(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    /// Arrival time, as received
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    /// Arrival time normalized to UTC
    pub fn utc_time(&self) -> Option<&str> {
        self.utc_time.as_deref()
    }

    /// Format the line for the wire, without the terminator
    pub fn serialize(&self) -> String {
        let mut out = String::new();

        if let Some(prefix) = &self.prefix {
            out.push(':');
            out.push_str(prefix);
            out.push(' ');
        }

        out.push_str(numeric::wire_command(&self.command));

        if let Some((last, middle)) = self.args.split_last() {
            for arg in middle {
                out.push(' ');
                out.push_str(arg);
            }
            out.push(' ');
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                out.push(':');
            }
            out.push_str(last);
        }

        out
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, None)
    }
}
