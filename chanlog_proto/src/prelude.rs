//! Collects commonly-used names for convenient import

pub use crate::{
    content::{Identification, MessageBody},
    errors::{ParseError, TimestampError},
    is_channel_name, numeric, parse_prefix,
    timestamp::{canonical_utc, w3c_timestamp},
    ChannelName, Line, Nickname,
};
