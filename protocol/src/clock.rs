//! # Clock
//!
//! Time as a capability. The booking lifecycle depends on exactly one
//! temporal question — "has this booking's escalation deadline passed?" —
//! and the answer must be testable without sleeping through a 24-hour
//! policy window.
//!
//! Production code injects [`SystemClock`]; tests inject [`ManualClock`]
//! and advance it by hand. Nothing in the protocol ever calls the OS clock
//! directly.

use chrono::Utc;
use parking_lot::Mutex;

/// Ledger-style time: seconds as a signed 64-bit integer.
///
/// Signed because chrono hands us `i64` and because deadline arithmetic
/// (`deadline - now`) is far less error-prone without unsigned underflow
/// lurking at every subtraction.
pub type Timestamp = i64;

/// The time capability. One method, deliberately.
pub trait Clock: Send + Sync {
    /// The current time in seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the OS, via chrono.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp()
    }
}

/// A clock that only moves when told to. For tests and demos.
///
/// Interior mutability via a mutex so the clock can be shared as
/// `Arc<ManualClock>` and advanced from the outside while the engine holds
/// its own reference.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the clock forward by `delta` seconds.
    pub fn advance(&self, delta: Timestamp) {
        *self.current.lock() += delta;
    }

    /// Jump the clock to an absolute time.
    pub fn set(&self, now: Timestamp) {
        *self.current.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}
