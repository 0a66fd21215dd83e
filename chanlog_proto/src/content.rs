//! A read-only view of message text.
//!
//! With the IDENTIFY-MSG capability enabled, the server prefixes every
//! PRIVMSG and NOTICE body with `+` (sender identified) or `-` (not
//! identified). CTCP ACTIONs wrap the text in `\x01ACTION ...\x01`. Rather
//! than edit the line, consumers look at it through [`MessageBody`].

use crate::line::Line;

const ACTION_START: &str = "\x01ACTION ";
const ACTION_END: &str = "\x01";

/// The IDENTIFY-MSG marker on a message body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identification {
    Identified,
    Unidentified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageBody<'a> {
    /// The marker, if the body carried one
    pub identification: Option<Identification>,
    /// Whether this is a CTCP ACTION
    pub action: bool,
    /// The text with marker and ACTION framing removed
    pub text: &'a str,
}

impl<'a> MessageBody<'a> {
    /// Decode raw message content. `identify_msg` says whether the content
    /// is expected to carry the marker.
    pub fn parse(content: &'a str, identify_msg: bool) -> Self {
        let (identification, rest) = if identify_msg {
            if let Some(rest) = content.strip_prefix('+') {
                (Some(Identification::Identified), rest)
            } else if let Some(rest) = content.strip_prefix('-') {
                (Some(Identification::Unidentified), rest)
            } else {
                (None, content)
            }
        } else {
            (None, content)
        };

        // Clients and servers sometimes cut the closing byte off
        match rest.strip_prefix(ACTION_START) {
            Some(text) => Self {
                identification,
                action: true,
                text: text.strip_suffix(ACTION_END).unwrap_or(text),
            },
            None => Self {
                identification,
                action: false,
                text: rest,
            },
        }
    }

    /// The body of a PRIVMSG or NOTICE line
    pub fn of(line: &'a Line, identify_msg: bool) -> Option<Self> {
        if line.is("PRIVMSG") || line.is("NOTICE") {
            line.arg(1).map(|content| Self::parse(content, identify_msg))
        } else {
            None
        }
    }

    /// Whether the sender asked for this message to stay out of the record
    pub fn is_off_record(&self) -> bool {
        self.text.starts_with("[off]")
    }
}

/// Mark `content` as coming from an identified sender
pub fn mark_identified(content: &str) -> String {
    format!("+{}", content)
}
