mod or_log;
pub use or_log::*;
