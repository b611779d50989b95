//! # Escalation Policy
//!
//! Every booking carries a fixed deadline one policy window
//! ([`POLICY_WINDOW_SECS`], just over 24 hours) after creation. Before the
//! deadline, a booking can only end by mutual consent (cancellation with
//! the counterparty's authorization). From the deadline onward, the car
//! may unilaterally force the booking closed.
//!
//! There is no background sweep — expiry is checked at the moment a
//! force-end arrives, against the caller-supplied ledger time.

use dpace_protocol::clock::Timestamp;
use dpace_protocol::config::POLICY_WINDOW_SECS;

use crate::records::Booking;

/// The escalation deadline for a booking created at `created_at`.
pub fn booking_deadline(created_at: Timestamp) -> Timestamp {
    created_at + POLICY_WINDOW_SECS
}

/// Whether a booking's escalation deadline has been reached.
///
/// The deadline itself counts as expired: a force-end at exactly
/// `deadline` succeeds.
pub fn is_expired(booking: &Booking, now: Timestamp) -> bool {
    now >= booking.deadline
}

/// Seconds until the deadline, clamped to zero once it has passed.
pub fn remaining_secs(booking: &Booking, now: Timestamp) -> i64 {
    (booking.deadline - now).max(0)
}
