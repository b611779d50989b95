//! # Cryptographic Primitives for dPACE
//!
//! This module is the foundation of everything security-related in the
//! protocol. Every registration credential, every booking authorization,
//! every hashlock commitment flows through here.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for signatures — fast, deterministic, and nobody has broken it.
//! - **SHA-256** for content digests — the commitments both parties sign.
//! - **BLAKE3** for identity hashing — because we live in the future.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again. Then go read about timing attacks
//! and come back when you've lost the urge.

pub mod hash;
pub mod keys;
pub mod signatures;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy. Life's too short for five levels of `use` statements.
pub use hash::{blake3_hash, sha256, Digest};
pub use keys::{DpaceKeypair, DpacePublicKey, DpaceSignature, KeyError};
pub use signatures::{sign, verify};
