//! # Booking Events
//!
//! Events emitted by engine operations for anyone watching the network —
//! renters polling for cars, monitoring, the node's websocket feed. The
//! serialized form is externally tagged by `type` so subscribers can filter
//! without deserializing the whole payload.

use dpace_protocol::crypto::hash::Digest;
use dpace_protocol::identity::PartyId;
use serde::{Deserialize, Serialize};

/// An event emitted by a booking lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BookingEvent {
    /// A car published an availability token — it can now be booked.
    #[serde(rename = "car_available")]
    CarAvailable {
        /// The car that became available.
        car: PartyId,
        /// The published availability token.
        token: Digest,
    },

    /// A car force-ended a booking past its escalation deadline.
    #[serde(rename = "forced_end")]
    ForcedEnd {
        /// The renter whose booking was terminated.
        renter: PartyId,
        /// The car that forced the termination.
        car: PartyId,
        /// Replacement token recorded on the car.
        new_token: Digest,
        /// Replacement location recorded on the car.
        new_location: String,
    },
}

impl std::fmt::Display for BookingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingEvent::CarAvailable { car, token } => {
                write!(f, "car {} available, token {}", car, token)
            }
            BookingEvent::ForcedEnd { renter, car, .. } => {
                write!(f, "car {} force-ended booking with renter {}", car, renter)
            }
        }
    }
}
