/// A stored log of one short session, as written by a live session
pub const RECORDED_SESSION: &str = include_str!("recorded_session.log");
