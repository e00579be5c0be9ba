//! Clock abstraction for order timestamps.

use chrono::{DateTime, SubsecRound, Utc};

/// Source of the current time for server-assigned order dates.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system clock.
///
/// Readings are truncated to microseconds, the resolution of a PostgreSQL
/// `TIMESTAMPTZ`, so an order date returned from `create` compares equal to
/// the same order read back from the store.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}
