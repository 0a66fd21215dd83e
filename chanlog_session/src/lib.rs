//! The session kernel of a channel logger.
//!
//! Lines from the server flow through a pipeline of [`Stage`](pipeline::Stage)s
//! built from the stock [`filters`] and [`sinks`], or from a consumer's own.
//! [`membership::MembershipTracker`] keeps track of who is in which channel,
//! and [`correlator::ReplyCorrelator`] sends replies to shared queries back
//! to whoever asked.
//!
//! [`session::ServerSession`] ties these together for a live connection,
//! and [`replay`] feeds a stored log through the same machinery.

pub mod correlator;
pub mod errors;
pub mod filters;
pub mod membership;
pub mod pipeline;
pub mod replay;
pub mod session;
pub mod sinks;
pub mod utils;

pub mod prelude;
