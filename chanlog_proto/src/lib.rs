//! Line codec for the chat protocol.
//!
//! [`Line`] is the structured form of one protocol line; it is produced by
//! [`Line::parse`] from received text (or built directly for locally
//! originated lines) and turned back into text by [`Line::serialize`].
//! Numeric replies are given symbolic names through the [`numeric`] table,
//! and arrival timestamps are normalized to UTC by [`timestamp`].

pub mod content;
pub mod errors;
pub mod numeric;
pub mod timestamp;

mod line;
pub use line::*;

mod names;
pub use names::*;

pub mod prelude;
