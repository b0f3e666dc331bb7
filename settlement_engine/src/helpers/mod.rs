mod last_seen;

pub use last_seen::{LastSeen, LastSeenParseError, LAST_SEEN_FORMAT};
