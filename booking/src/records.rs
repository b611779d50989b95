//! # Party Records & Bookings
//!
//! The persistent view of every registered party and every live booking.
//! A party is either a renter or a car, each with its own lifecycle:
//!
//! - **Renter** — `Idle` → `AwaitingCar` (deposit posted) → `Booked` →
//!   back to `Idle` when the booking ends.
//! - **Car** — `Idle` (registered) → `Available` (token published) →
//!   `Reserved` (renter booked) → `InUse` (car confirmed) → back to `Idle`.
//!
//! Unregistered parties have no record at all — absence from the store is
//! the "non-existent" state, and every operation treats it as a state
//! mismatch.

use dpace_protocol::clock::Timestamp;
use dpace_protocol::crypto::hash::Digest;
use dpace_protocol::identity::PartyId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::escalation;

// ---------------------------------------------------------------------------
// Lifecycle States
// ---------------------------------------------------------------------------

/// The lifecycle state of a renter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenterState {
    /// Registered with no booking activity in flight.
    Idle,
    /// Deposit posted; free to book any available car.
    AwaitingCar,
    /// Holds an active booking.
    Booked,
}

impl std::fmt::Display for RenterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenterState::Idle => write!(f, "Idle"),
            RenterState::AwaitingCar => write!(f, "AwaitingCar"),
            RenterState::Booked => write!(f, "Booked"),
        }
    }
}

/// The lifecycle state of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarState {
    /// Registered but not offered for booking.
    Idle,
    /// Availability token and location published; bookable.
    Available,
    /// A renter holds a reservation awaiting the car's confirmation.
    Reserved,
    /// Booking confirmed by the car; the rental is underway.
    InUse,
}

impl std::fmt::Display for CarState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CarState::Idle => write!(f, "Idle"),
            CarState::Available => write!(f, "Available"),
            CarState::Reserved => write!(f, "Reserved"),
            CarState::InUse => write!(f, "InUse"),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The stored record of a registered renter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenterRecord {
    /// The renter's party identity.
    pub identity: PartyId,
    /// Current lifecycle state.
    pub state: RenterState,
    /// Escrow value posted at registration.
    pub deposited_value: u64,
}

impl RenterRecord {
    /// Creates a renter record in `AwaitingCar` — registration and deposit
    /// happen in one step, so a freshly registered renter can book.
    pub fn new(identity: PartyId, deposited_value: u64) -> Self {
        Self {
            identity,
            state: RenterState::AwaitingCar,
            deposited_value,
        }
    }
}

/// The stored record of a registered car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarRecord {
    /// The car's party identity.
    pub identity: PartyId,
    /// SHA-256 of the car's public listing details.
    pub details_digest: Digest,
    /// Listed price per time unit, in escrow units.
    pub price_per_unit: u64,
    /// Current lifecycle state.
    pub state: CarState,
    /// The availability token most recently published (or recorded by a
    /// forced end). `None` until the car validates for the first time.
    pub current_token: Option<Digest>,
    /// Where the car was last reported. `None` until first validation.
    pub current_location: Option<String>,
}

impl CarRecord {
    /// Creates a car record in `Idle` with no token or location yet.
    pub fn new(identity: PartyId, details_digest: Digest, price_per_unit: u64) -> Self {
        Self {
            identity,
            details_digest,
            price_per_unit,
            state: CarState::Idle,
            current_token: None,
            current_location: None,
        }
    }
}

/// A live booking between one renter and one car.
///
/// Exists from the renter's booking step until cancellation or forced end.
/// The escalation deadline is fixed at creation and never moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier for this booking.
    pub id: Uuid,
    /// The booking renter.
    pub renter: PartyId,
    /// The booked car.
    pub car: PartyId,
    /// SHA-256 of the car's availability token, as presented by the renter.
    pub secret_link: Digest,
    /// Ledger time at creation.
    pub created_at: Timestamp,
    /// Ledger time after which the car may force-end the booking.
    pub deadline: Timestamp,
}

impl Booking {
    /// Creates a booking at `created_at`, with the escalation deadline
    /// derived from the policy window.
    pub fn new(renter: PartyId, car: PartyId, secret_link: Digest, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            renter,
            car,
            secret_link,
            created_at,
            deadline: escalation::booking_deadline(created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpace_protocol::config::POLICY_WINDOW_SECS;
    use dpace_protocol::crypto::keys::DpaceKeypair;
    use dpace_protocol::crypto::sha256;

    fn some_party() -> PartyId {
        PartyId::from_public_key(&DpaceKeypair::generate().public_key())
    }

    #[test]
    fn new_renter_awaits_a_car() {
        let record = RenterRecord::new(some_party(), 50);
        assert_eq!(record.state, RenterState::AwaitingCar);
        assert_eq!(record.deposited_value, 50);
    }

    #[test]
    fn new_car_is_idle_without_token() {
        let record = CarRecord::new(some_party(), sha256(b"2019 wagon, blue"), 12);
        assert_eq!(record.state, CarState::Idle);
        assert!(record.current_token.is_none());
        assert!(record.current_location.is_none());
    }

    #[test]
    fn booking_deadline_is_one_policy_window_out() {
        let booking = Booking::new(some_party(), some_party(), sha256(b"link"), 1_000);
        assert_eq!(booking.created_at, 1_000);
        assert_eq!(booking.deadline, 1_000 + POLICY_WINDOW_SECS);
    }

    #[test]
    fn booking_ids_are_unique() {
        let renter = some_party();
        let car = some_party();
        let a = Booking::new(renter.clone(), car.clone(), sha256(b"link"), 1);
        let b = Booking::new(renter, car, sha256(b"link"), 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn state_display_matches_variant_names() {
        assert_eq!(RenterState::AwaitingCar.to_string(), "AwaitingCar");
        assert_eq!(CarState::InUse.to_string(), "InUse");
    }

    #[test]
    fn car_record_serde_roundtrip() {
        let mut record = CarRecord::new(some_party(), sha256(b"details"), 9);
        record.state = CarState::Available;
        record.current_token = Some(sha256(b"token"));
        record.current_location = Some("pier 7 garage".to_string());

        let json = serde_json::to_string(&record).unwrap();
        let restored: CarRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, restored);
    }
}
