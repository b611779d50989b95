//! # Party ID — dPACE Addresses
//!
//! A party ID is the human-facing representation of a participant's identity
//! in the protocol. It is derived from the participant's Ed25519 public key
//! via BLAKE3 hashing and Bech32 encoding:
//!
//! ```text
//! public_key (32 bytes)
//!     -> BLAKE3(public_key) -> 32 bytes
//!     -> Bech32("dpace", hash) -> dpace1qw508d6qe...
//! ```
//!
//! The `dpace` human-readable prefix (HRP) makes addresses immediately
//! recognizable. Bech32 encoding provides built-in error detection — it
//! can detect up to 4 character errors — which matters when users are
//! copy-pasting addresses into booking forms.
//!
//! ## Why BLAKE3 instead of raw public key?
//!
//! - Provides a layer of indirection (quantum resistance hedge).
//! - Consistent 32-byte output regardless of future key scheme changes.
//! - BLAKE3 is faster than SHA-256 and produces higher-quality digests.

use crate::config::ADDRESS_HRP;
use crate::crypto::keys::{DpacePublicKey, DpaceSignature};
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during party ID operations.
#[derive(Debug, Error)]
pub enum PartyIdError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp {
        /// The expected HRP.
        expected: String,
        /// The HRP that was actually found.
        got: String,
    },

    /// The decoded data has an unexpected length.
    #[error("invalid address data length: expected {expected} bytes, got {got}")]
    InvalidDataLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },

    /// Signature verification failed during identity assertion.
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// The operation requires an attached public key but none is present.
    #[error("no public key attached to this PartyId (address-only mode)")]
    NoPublicKey,

    /// The provided public key does not match the address hash.
    #[error("public key hash does not match the stored address hash")]
    PublicKeyMismatch,
}

// ---------------------------------------------------------------------------
// PartyId
// ---------------------------------------------------------------------------

/// A dPACE party identity — the primary address format used across the
/// protocol.
///
/// Internally stores the BLAKE3 hash of the originating public key (32 bytes)
/// and optionally the public key itself for signature verification. The
/// Bech32 address is computed on-the-fly from the hash.
///
/// # Examples
///
/// ```
/// use dpace_protocol::crypto::DpaceKeypair;
/// use dpace_protocol::identity::PartyId;
///
/// let kp = DpaceKeypair::generate();
/// let id = PartyId::from_public_key(&kp.public_key());
/// let address = id.to_address();
/// assert!(address.starts_with("dpace1"));
///
/// let recovered = PartyId::from_address(&address).unwrap();
/// assert_eq!(id, recovered);
/// ```
#[derive(Clone, Eq)]
pub struct PartyId {
    /// BLAKE3 hash of the public key (32 bytes). This is what gets
    /// Bech32-encoded into the address string.
    key_hash: [u8; 32],

    /// The original public key, retained for signature verification
    /// without requiring a separate lookup. `None` when the ID was
    /// parsed from an address string or decoded from a key hash.
    public_key: Option<DpacePublicKey>,
}

impl PartyId {
    /// Create a party ID from a public key.
    ///
    /// Hashes the public key bytes with BLAKE3 and stores both the
    /// hash (for address derivation) and the key (for verification).
    pub fn from_public_key(pk: &DpacePublicKey) -> Self {
        let key_hash = blake3::hash(pk.as_bytes());
        Self {
            key_hash: *key_hash.as_bytes(),
            public_key: Some(pk.clone()),
        }
    }

    /// Reconstruct a party ID from a raw 32-byte key hash.
    ///
    /// Used when decoding the commitment codec's wire form, where only the
    /// hash travels. The resulting ID has no public key attached.
    pub fn from_key_hash(key_hash: [u8; 32]) -> Self {
        Self {
            key_hash,
            public_key: None,
        }
    }

    /// Encode this identity as a Bech32 address string.
    ///
    /// The output has the form `dpace1<bech32-encoded-hash>` and includes
    /// a checksum for error detection.
    pub fn to_address(&self) -> String {
        let hrp = Hrp::parse(ADDRESS_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.key_hash)
            .expect("encoding a 32-byte payload should never fail")
    }

    /// Parse a Bech32-encoded dPACE address back into a [`PartyId`].
    ///
    /// Validates the HRP, checksum, and data length. Note that the
    /// resulting `PartyId` will **not** have a public key attached —
    /// only the hash is recoverable from the address. Signature
    /// verification requires calling [`attach_public_key`](Self::attach_public_key).
    pub fn from_address(addr: &str) -> Result<Self, PartyIdError> {
        let (hrp, data) =
            bech32::decode(addr).map_err(|e| PartyIdError::Bech32Decode(e.to_string()))?;

        let expected_hrp = Hrp::parse(ADDRESS_HRP).expect("static HRP is valid");
        if hrp != expected_hrp {
            return Err(PartyIdError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        if data.len() != 32 {
            return Err(PartyIdError::InvalidDataLength {
                expected: 32,
                got: data.len(),
            });
        }

        let mut key_hash = [0u8; 32];
        key_hash.copy_from_slice(&data);

        Ok(Self {
            key_hash,
            public_key: None,
        })
    }

    /// Verify a signature against this identity.
    ///
    /// Requires that this `PartyId` was created via [`from_public_key`](Self::from_public_key)
    /// or has had a key attached via [`attach_public_key`](Self::attach_public_key).
    ///
    /// Returns `Ok(())` on success, or an appropriate error if the key
    /// is missing or the signature is invalid.
    pub fn verify_signature(
        &self,
        message: &[u8],
        signature: &DpaceSignature,
    ) -> Result<(), PartyIdError> {
        let pk = self.public_key.as_ref().ok_or(PartyIdError::NoPublicKey)?;
        if pk.verify(message, signature) {
            Ok(())
        } else {
            Err(PartyIdError::SignatureVerificationFailed)
        }
    }

    /// Attach a public key to a PartyId recovered from an address.
    ///
    /// Validates that the key's BLAKE3 hash matches the stored hash.
    /// This is required before calling [`verify_signature`](Self::verify_signature)
    /// on an address-derived ID.
    pub fn attach_public_key(&mut self, pk: &DpacePublicKey) -> Result<(), PartyIdError> {
        let expected_hash = blake3::hash(pk.as_bytes());
        if expected_hash.as_bytes() != &self.key_hash {
            return Err(PartyIdError::PublicKeyMismatch);
        }
        self.public_key = Some(pk.clone());
        Ok(())
    }

    /// Return the raw 32-byte BLAKE3 hash underlying this address.
    pub fn key_hash(&self) -> &[u8; 32] {
        &self.key_hash
    }

    /// Return the attached public key, if any.
    pub fn public_key(&self) -> Option<&DpacePublicKey> {
        self.public_key.as_ref()
    }
}

impl PartialEq for PartyId {
    fn eq(&self, other: &Self) -> bool {
        // Two PartyIds are equal if they represent the same address, regardless
        // of whether a public key is attached. The key_hash is the canonical
        // identity; the optional public_key is auxiliary metadata that may or
        // may not be present depending on how the PartyId was constructed
        // (from_public_key retains it, from_address does not).
        self.key_hash == other.key_hash
    }
}

impl std::hash::Hash for PartyId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Must be consistent with PartialEq: only hash the key_hash field.
        self.key_hash.hash(state);
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl fmt::Debug for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartyId({})", self.to_address())
    }
}

impl Serialize for PartyId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_address())
        } else {
            serializer.serialize_bytes(&self.key_hash)
        }
    }
}

impl<'de> Deserialize<'de> for PartyId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            PartyId::from_address(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != 32 {
                return Err(serde::de::Error::custom(format!(
                    "expected 32-byte key hash, got {}",
                    bytes.len()
                )));
            }
            let mut key_hash = [0u8; 32];
            key_hash.copy_from_slice(&bytes);
            Ok(PartyId {
                key_hash,
                public_key: None,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
