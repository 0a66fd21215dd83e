//! Terminal pipeline stages: things lines end up in.

mod collect;
pub use collect::CollectSink;

mod raw;
pub use raw::RawSink;

mod index;
pub use index::{ChannelIndex, ChannelsAndDaysSink};
