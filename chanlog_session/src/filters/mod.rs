//! Pipeline stages that decide which lines go further.

mod channel;
pub use channel::ChannelFilter;

mod time;
pub use time::TimeFilter;

mod off_record;
pub use off_record::OffRecordFilter;
