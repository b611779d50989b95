// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # dPACE Protocol — Core Library
//!
//! dPACE is a peer-to-peer car booking protocol: a renter and a car agree on
//! a rental directly, with a Registration Service Provider (RSP) vouching for
//! both sides exactly once, at onboarding. No marketplace in the middle, no
//! platform taking a cut, no customer-service hotline that puts you on hold.
//!
//! This crate holds the protocol primitives. The booking state machine that
//! consumes them lives in `dpace-booking`; the node binary that serves both
//! over HTTP lives in `dpace-node`.
//!
//! ## Architecture
//!
//! - **crypto** — Ed25519 wrappers and digest types. Don't roll your own.
//! - **identity** — party addresses: BLAKE3-hashed keys in Bech32 clothing.
//! - **codec** — the canonical commitment encoding both parties sign.
//! - **credential** — RSP-issued registration proofs and their verification.
//! - **hashlock** — secrets, commitments, and signed booking authorizations.
//! - **clock** — time as a capability, so tests can own the clock.
//! - **rpc** — JSON-RPC 2.0 type definitions for the node API.
//! - **config** — protocol constants and policy parameters.
//!
//! ## Design Philosophy
//!
//! 1. Validate everything, then mutate. A failed operation changes nothing.
//! 2. No unsafe code in crypto paths — we sleep at night.
//! 3. Signatures gate every transition that binds two parties.
//! 4. If it touches a booking, it has tests. Plural.

pub mod clock;
pub mod codec;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod hashlock;
pub mod identity;
pub mod rpc;
