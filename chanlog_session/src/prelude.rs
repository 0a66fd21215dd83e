//! Collects commonly-used names for convenient import

pub use crate::{
    correlator::{QueryKind, ReplyCorrelator, Routing},
    errors::{ReplayError, SessionError, TransportError},
    filters::{ChannelFilter, OffRecordFilter, TimeFilter},
    membership::MembershipTracker,
    pipeline::{boxed, Disposition, NullSink, Pipe, SharedSink, Sink, Stage},
    session::{Clock, ConsumerId, ManualClock, ServerSession, SessionConfig, SystemClock, Transport},
    sinks::{ChannelIndex, ChannelsAndDaysSink, CollectSink, RawSink},
};
