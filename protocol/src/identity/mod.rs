//! # Identity Module
//!
//! Party identity for the dPACE protocol. Every participant — renter, car,
//! RSP — is identified by an Ed25519 keypair, from which we derive a
//! Bech32-encoded address (human-readable, checksummed, hard to fat-finger).
//!
//! The identity stack is layered:
//!
//! 1. **Keypair** — Raw Ed25519 key material (`crypto::keys`). Signs things,
//!    proves ownership.
//! 2. **Party ID** — BLAKE3 hash of the public key, Bech32-encoded with the
//!    `dpace` HRP. This is what appears in booking records, events, and
//!    rental paperwork.
//!
//! ## Design Decisions
//!
//! - Ed25519 was chosen for its speed, small key/signature sizes, and
//!   resistance to timing side-channels. We use the `ed25519-dalek` crate
//!   (RFC 8032 compliant).
//! - Bech32 (not Bech32m) for addresses — we're encoding raw pubkey hashes,
//!   not witness programs. The error-detection properties of Bech32 are
//!   sufficient for our use case.

pub mod party_id;

pub use party_id::{PartyId, PartyIdError};
