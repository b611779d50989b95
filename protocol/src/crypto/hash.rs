//! # Hashing Utilities
//!
//! Cryptographic hash functions used throughout dPACE. We support two hash
//! functions and refuse to support more without a very good reason:
//!
//! - **SHA-256** — For content digests: credential claims, hashlock
//!   commitments, availability tokens, secret links. These digests are
//!   wire-visible and signed by counterparties, so we use the function
//!   the rest of the world already speaks.
//!
//! - **BLAKE3** — For identity hashing (public key -> address). Internal to
//!   dPACE, performance-sensitive, and not required to interoperate with
//!   anything external. We use the faster hash.
//!
//! ## The Digest type
//!
//! Every 32-byte content digest in the protocol travels as a [`Digest`]
//! rather than a bare `[u8; 32]`. The newtype buys hex rendering, serde
//! that does the right thing in JSON, and the inability to confuse a
//! digest with other 32-byte material (key hashes, seeds, secrets).

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// A 32-byte content digest.
///
/// Serializes as a hex string in human-readable formats (JSON) and as raw
/// bytes in binary formats. Display is lowercase hex, always 64 characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap raw 32-byte digest material.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex-encoded digest string.
    ///
    /// Returns an error if the hex is malformed or not exactly 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Digest::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != 32 {
                return Err(serde::de::Error::custom(format!(
                    "expected 32-byte digest, got {}",
                    bytes.len()
                )));
            }
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&bytes);
            Ok(Digest(arr))
        }
    }
}

/// Compute the SHA-256 digest of the input data.
///
/// This is the content-digest function of the protocol: credential claim
/// digests, hashlock commitment digests, and secret links are all SHA-256.
///
/// # Example
///
/// ```
/// use dpace_protocol::crypto::sha256;
///
/// let digest = sha256(b"dPACE protocol");
/// assert_eq!(digest.as_bytes().len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    Digest(output)
}

/// Compute the BLAKE3 hash of the input data.
///
/// Returns a raw 32-byte array rather than a [`Digest`] because its one job
/// is hashing public keys into address material — identity plumbing, not a
/// wire-visible content digest. Uses the `blake3` crate which automatically
/// takes advantage of SIMD instructions on supported platforms.
///
/// # Example
///
/// ```
/// use dpace_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"dPACE protocol");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}
