// crates/context-trust-core/src/core/time.rs
// ============================================================================
// Module: Trust Engine Time Model
// Description: Timestamps and the clock seam for adjudication logic.
// Purpose: Keep core decisions deterministic by injecting time explicitly.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Adjudication decisions depend on time (the seven-day dispute window,
//! health-check stamps), so core logic takes a [`Clock`] instead of reading
//! wall-clock time directly. Hosts supply [`SystemClock`]; tests supply
//! [`FixedClock`] for deterministic replay.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Unix-epoch millisecond timestamp used across trust engine records.
///
/// # Invariants
/// - Values are explicitly provided by callers; core logic never reads
///   wall-clock time directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the milliseconds elapsed from `earlier` to `self`, saturating
    /// at zero when `earlier` is in the future.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> i64 {
        let delta = self.0.saturating_sub(earlier.0);
        if delta < 0 { 0 } else { delta }
    }
}

// ============================================================================
// SECTION: Clock Seam
// ============================================================================

/// Clock abstraction injected into time-dependent operations.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation of [`Clock`].
///
/// # Invariants
/// - Reads UTC wall-clock time on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let now = OffsetDateTime::now_utc();
        let millis = now.unix_timestamp_nanos() / 1_000_000;
        Timestamp::from_unix_millis(clamp_to_i64(millis))
    }
}

/// Clamps a 128-bit millisecond count into the i64 timestamp range.
const fn clamp_to_i64(millis: i128) -> i64 {
    if millis > i64::MAX as i128 {
        i64::MAX
    } else if millis < i64::MIN as i128 {
        i64::MIN
    } else {
        #[allow(clippy::cast_possible_truncation, reason = "Range checked above.")]
        {
            millis as i64
        }
    }
}

/// Fixed clock for deterministic tests.
///
/// # Invariants
/// - Always returns the timestamp it was constructed with.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    /// Creates a fixed clock pinned to the given timestamp.
    #[must_use]
    pub const fn new(at: Timestamp) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
