//! # dPACE Booking Contracts
//!
//! Lifecycle logic for the dPACE peer-to-peer car booking network. This
//! crate turns the primitives from `dpace-protocol` — identities,
//! credentials, hashlock commitments — into the rules of an actual rental:
//!
//! - **Booking Engine** — registration, availability, the two-sided booking
//!   handshake, cancellation by mutual consent, and forced termination
//!   after the escalation deadline.
//! - **Records & Store** — explicit lifecycle states for renters and cars,
//!   plus the live bookings connecting them.
//! - **Escalation** — the fixed policy window that decides when a car may
//!   end a booking unilaterally.
//!
//! ## Design Principles
//!
//! 1. Every operation validates before it mutates — a rejected call leaves
//!    no partial writes behind.
//! 2. State transitions are explicit: enum variants, not boolean flags.
//! 3. Signature verification gates every transition that spends someone
//!    else's standing — booking, confirming, cancelling.
//! 4. Every public record type is serializable (serde) for wire transport
//!    and node queries.

pub mod engine;
pub mod error;
pub mod escalation;
pub mod events;
pub mod records;
pub mod store;
