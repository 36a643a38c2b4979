//! Time types for Verdict.
//!
//! Wall-clock timestamps are attached to events and report nodes; durations
//! are derived from start/end pairs.

use serde::{Deserialize, Serialize};

/// Wall clock timestamp with nanosecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since the Unix epoch
    pub seconds: u64,
    /// Nanosecond fraction
    pub nanos: u32,
}

impl Timestamp {
    /// Maximum nanoseconds per second
    pub const NANOS_PER_SEC: u32 = 1_000_000_000;

    /// Create a new timestamp
    #[must_use]
    pub const fn new(seconds: u64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Get the current timestamp
    #[allow(clippy::missing_panics_doc)]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards");
        Self {
            seconds: duration.as_secs(),
            nanos: duration.subsec_nanos(),
        }
    }

    /// Convert to milliseconds since the epoch
    #[must_use]
    pub const fn as_millis(&self) -> u128 {
        self.seconds as u128 * 1_000 + self.nanos as u128 / 1_000_000
    }

    /// Get duration since another timestamp
    #[must_use]
    pub fn duration_since(&self, earlier: &Timestamp) -> Duration {
        let mut seconds = self.seconds.saturating_sub(earlier.seconds);
        let mut nanos = i64::from(self.nanos) - i64::from(earlier.nanos);

        if nanos < 0 {
            seconds = seconds.saturating_sub(1);
            nanos += i64::from(Self::NANOS_PER_SEC);
        }

        Duration {
            seconds,
            nanos: nanos as u32,
        }
    }

    /// Render as ISO-8601 with millisecond precision, e.g. `2019-05-04T22:57:08.399Z`
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        use chrono::{DateTime, Utc};
        let dt = DateTime::<Utc>::from_timestamp(self.seconds as i64, self.nanos)
            .unwrap_or_default();
        dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// A duration between timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
    /// Whole seconds
    pub seconds: u64,
    /// Nanosecond fraction
    pub nanos: u32,
}

impl Duration {
    /// Create a new duration
    #[must_use]
    pub const fn new(seconds: u64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Zero duration
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            seconds: 0,
            nanos: 0,
        }
    }

    /// Duration from seconds
    #[must_use]
    pub const fn from_secs(seconds: u64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Duration from milliseconds
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            seconds: millis / 1_000,
            nanos: ((millis % 1_000) * 1_000_000) as u32,
        }
    }

    /// Get total seconds
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.seconds
    }

    /// Get total milliseconds
    #[must_use]
    pub fn as_millis(&self) -> u128 {
        self.seconds as u128 * 1_000 + self.nanos as u128 / 1_000_000
    }

    /// Saturating addition
    #[must_use]
    pub const fn saturating_add(&self, other: &Duration) -> Duration {
        let mut seconds = self.seconds.saturating_add(other.seconds);
        let mut nanos = self.nanos + other.nanos;

        if nanos >= Timestamp::NANOS_PER_SEC {
            seconds = seconds.saturating_add(1);
            nanos -= Timestamp::NANOS_PER_SEC;
        }

        Duration { seconds, nanos }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.seconds == 0 && self.nanos == 0 {
            write!(f, "0s")
        } else if self.seconds == 0 {
            write!(f, "{}ns", self.nanos)
        } else if self.nanos == 0 {
            write!(f, "{}s", self.seconds)
        } else {
            write!(f, "{}.{:09}s", self.seconds, self.nanos)
        }
    }
}
