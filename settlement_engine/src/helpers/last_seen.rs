use std::{fmt::Display, str::FromStr, sync::OnceLock};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use thiserror::Error;

/// The only accepted `last_seen` format: ISO-8601 with fractional seconds and a literal `Z`, e.g.
/// `2024-06-01T12:30:00.123Z`.
pub const LAST_SEEN_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

fn last_seen_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{1,9}Z$").expect("last_seen pattern is a valid regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("last_seen must be a UTC timestamp of the form YYYY-MM-DDTHH:MM:SS.fffZ, but was '{0}'")]
pub struct LastSeenParseError(String);

/// The moment a client last read a settlement.
///
/// A revision is accepted only if no response was recorded after this moment. See [`LastSeen::is_stale_against`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LastSeen(DateTime<Utc>);

impl LastSeen {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// A view is stale if a response was recorded strictly after it was taken. Settlements that have never been
    /// responded to can't make any view stale.
    pub fn is_stale_against(&self, last_responded_at: Option<DateTime<Utc>>) -> bool {
        last_responded_at.map(|responded| responded > self.0).unwrap_or(false)
    }
}

impl FromStr for LastSeen {
    type Err = LastSeenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !last_seen_pattern().is_match(s) {
            return Err(LastSeenParseError(s.to_string()));
        }
        let naive =
            NaiveDateTime::parse_from_str(s, LAST_SEEN_FORMAT).map_err(|_| LastSeenParseError(s.to_string()))?;
        Ok(Self(Utc.from_utc_datetime(&naive)))
    }
}

impl Display for LastSeen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S%.6fZ"))
    }
}

impl From<DateTime<Utc>> for LastSeen {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}
