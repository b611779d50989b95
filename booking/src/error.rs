//! # Booking Errors
//!
//! The full error taxonomy of the booking engine. Every rejected operation
//! maps to exactly one variant here, and a rejected operation never leaves
//! partial writes behind — callers can retry after fixing the cause.

use dpace_protocol::clock::Timestamp;
use dpace_protocol::hashlock::HashlockError;
use dpace_protocol::identity::PartyId;
use thiserror::Error;

/// Errors that can occur during booking lifecycle operations.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The RSP-issued registration credential failed verification.
    #[error("registration credential failed verification")]
    InvalidCredential,

    /// A renter tried to register with a deposit below the protocol minimum.
    #[error("insufficient deposit: provided {provided}, minimum {minimum}")]
    InsufficientDeposit {
        /// Deposit attached to the registration call.
        provided: u64,
        /// The protocol-wide minimum.
        minimum: u64,
    },

    /// The identity is already registered and cannot register again.
    #[error("identity already registered: {identity}")]
    DuplicateRegistration {
        /// The party that attempted to re-register.
        identity: PartyId,
    },

    /// A party is not in the state the operation requires. Also covers
    /// unregistered parties, whose found state reads `unregistered`.
    #[error("state mismatch for {party}: expected {expected}, found {found}")]
    StateMismatch {
        /// The party whose state blocked the operation.
        party: PartyId,
        /// The state (or states) the operation requires.
        expected: String,
        /// The state the party is actually in.
        found: String,
    },

    /// The presented secret link does not hash-match the car's current
    /// availability token.
    #[error("secret link does not match the car's availability token")]
    TokenMismatch,

    /// A signature or hashlock authorization check failed.
    #[error("authorization rejected for {party}")]
    Unauthorized {
        /// The party whose authorization was required and not satisfied.
        party: PartyId,
    },

    /// Force-end was attempted before the booking's escalation deadline.
    #[error("force end before deadline: deadline {deadline}, now {now}")]
    PrematureForceEnd {
        /// The booking's escalation deadline.
        deadline: Timestamp,
        /// Ledger time at the attempt.
        now: Timestamp,
    },

    /// The party already holds an unconsumed hashlock commitment.
    #[error("hashlock commitment already open for {owner}")]
    DuplicateCommitment {
        /// The party whose commitment slot is occupied.
        owner: PartyId,
    },
}

impl From<HashlockError> for BookingError {
    fn from(err: HashlockError) -> Self {
        match err {
            HashlockError::DuplicateCommitment { owner } => {
                BookingError::DuplicateCommitment { owner }
            }
        }
    }
}
