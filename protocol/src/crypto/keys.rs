//! # Key Management
//!
//! Ed25519 keypair generation and serialization for dPACE parties.
//!
//! Every participant — renter, car, RSP — holds at least one Ed25519
//! keypair. This module handles creation, serialization, and basic key
//! operations.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security level in 32+32 bytes. Compact and sufficient.
//! - Constant-time implementations exist and are well-audited.
//! - Fast verification — a busy coordination node checks an authorization
//!   on every booking transition.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - We use OS-level RNG (`OsRng`) for key generation. If your OS RNG is
//!   broken, you have bigger problems than a car rental.
//! - Key bytes are never logged. If you add logging to this module,
//!   you will be asked to leave.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// These are intentionally vague about *why* something failed — leaking
/// details about key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// A dPACE party keypair wrapping Ed25519 signing and verification keys.
///
/// This is the atomic unit of identity in the protocol. Every address, every
/// booking authorization, every credential ultimately traces back to one of
/// these. A renter's phone holds one, a car's onboard unit holds one, and
/// the RSP guards one in an HSM (we hope).
///
/// ## Serialization
///
/// `DpaceKeypair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Serializing private keys should be a deliberate, conscious act, not
/// something that happens because someone shoved a keypair into a JSON
/// response. Use `to_bytes()` / `from_bytes()` explicitly.
///
/// # Examples
///
/// ```
/// use dpace_protocol::crypto::keys::DpaceKeypair;
///
/// let kp = DpaceKeypair::generate();
/// let msg = b"reserve car dpace1q...";
/// let sig = kp.sign(msg);
/// assert!(kp.verify(msg, &sig));
/// ```
pub struct DpaceKeypair {
    /// The Ed25519 signing (private) key. 32 bytes of pure responsibility.
    signing_key: SigningKey,
}

/// The public half of a dPACE identity, safe to share with the world.
///
/// This is what a party publishes so counterparties can verify its
/// authorizations. Losing this is inconvenient but not catastrophic — it
/// can be re-derived from the signing key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpacePublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature over a message.
///
/// 64 bytes. Deterministic for a given (key, message) pair — that's the
/// beauty of Ed25519. No nonce management, no k-value disasters, no
/// sleepless nights wondering if your RNG was seeded properly during signing.
///
/// Stored as `Vec<u8>` for serde compatibility, but always exactly 64 bytes.
/// If someone hands you a DpaceSignature that isn't 64 bytes, verification
/// will simply fail — no panics, no undefined behavior, just a boolean `false`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpaceSignature {
    bytes: Vec<u8>,
}

impl DpaceKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    ///
    /// This is the preferred way to create a new identity. The RNG is
    /// `OsRng`, which pulls from `/dev/urandom` on Unix and `BCryptGenRandom`
    /// on Windows.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    ///
    /// The seed is used directly as the Ed25519 secret scalar. Useful for
    /// deriving keypairs from KDFs or from recovery material.
    ///
    /// **Warning**: if you call this with a weak seed, you get a weak key.
    /// Use a proper CSPRNG or KDF to produce the seed bytes.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Reconstruct a keypair from raw 32-byte secret key material.
    ///
    /// The public key is re-derived from the secret key. Equivalent to
    /// [`from_seed`](Self::from_seed) — in Ed25519, the 32-byte secret key
    /// *is* the seed.
    pub fn from_bytes(secret_key_bytes: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, KeyError> {
        Ok(Self::from_seed(secret_key_bytes))
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    ///
    /// Convenience method for loading keys from disk. Please don't put raw
    /// hex keys in config files in production. But for devnet, we're not
    /// going to pretend you won't do it anyway.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        let mut arr = [0u8; SECRET_KEY_LENGTH];
        arr.copy_from_slice(&bytes);
        Self::from_bytes(&arr)
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> DpacePublicKey {
        DpacePublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Get the raw public key bytes (32 bytes). Safe to share, log,
    /// print on the rental agreement, etc.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message and return a `DpaceSignature`.
    ///
    /// Ed25519 signatures are deterministic — the same (key, message) pair
    /// always produces the same signature. No nonce games, no randomness
    /// needed at signing time. This is one of the biggest advantages over
    /// ECDSA, where a bad RNG during signing can leak your private key
    /// (see: PlayStation 3 master key incident, 2010).
    pub fn sign(&self, message: &[u8]) -> DpaceSignature {
        let sig = self.signing_key.sign(message);
        DpaceSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Verify a signature against this keypair's public key.
    ///
    /// Convenience method — equivalent to calling `self.public_key().verify()`.
    pub fn verify(&self, message: &[u8], signature: &DpaceSignature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// Exports the raw 32-byte secret key material.
    ///
    /// **Handle with extreme care.** This is the only secret that stands
    /// between an attacker and full control of the associated identity.
    /// Don't log it. Don't send it over the network in plaintext. Don't
    /// store it in a text file called "my_keys.txt" on your desktop.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Export the raw secret key bytes. Alias for [`secret_key_bytes`](Self::secret_key_bytes).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret_key_bytes()
    }

    /// Get the public key as a hex string. Useful for display and logging.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }
}

impl Clone for DpaceKeypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for DpaceKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output. Not even "partially."
        // A partial leak is still a leak, and grepping logs for hex is trivial.
        write!(f, "DpaceKeypair(pub={})", self.public_key().to_hex())
    }
}

impl PartialEq for DpaceKeypair {
    /// Two keypairs are equal if their public keys match.
    /// We compare public keys (not private) because comparing secret material
    /// in a non-constant-time way is a bad habit, and for identity purposes,
    /// the public key is what matters.
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for DpaceKeypair {}

// ---------------------------------------------------------------------------
// DpacePublicKey
// ---------------------------------------------------------------------------

impl DpacePublicKey {
    /// Create a `DpacePublicKey` from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Try to create a `DpacePublicKey` from a byte slice.
    ///
    /// Validates the length and that the bytes represent a valid Ed25519
    /// point. We don't just accept any 32 bytes — some values aren't valid
    /// points on the curve, and using them could lead to weird behavior.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        if slice.len() != 32 {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);

        // Catch low-order points and other degenerate cases up front.
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;

        Ok(Self { bytes })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    ///
    /// Returns `true` if the signature is valid, `false` otherwise. We use
    /// a boolean here (rather than `Result`) because the vast majority of
    /// callers just want a yes/no answer and don't care about the specific
    /// failure mode.
    pub fn verify(&self, message: &[u8], signature: &DpaceSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; 64] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let dalek_sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded public key string.
    ///
    /// Returns an error if the hex is malformed or the wrong length.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self { bytes: arr })
    }

    /// Base58-encoded representation. More compact than hex, and what
    /// most users see printed on onboarding paperwork (before the Bech32
    /// address takes over).
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }
}

impl Hash for DpacePublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for DpacePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for DpacePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DpacePublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// DpaceSignature
// ---------------------------------------------------------------------------

impl DpaceSignature {
    /// Create a signature from raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Returns the raw signature bytes (always 64 bytes for valid Ed25519 signatures).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the hex-encoded signature string. 128 characters for a valid sig.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for DpaceSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for DpaceSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "DpaceSignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "DpaceSignature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_valid_keypair() {
        let kp = DpaceKeypair::generate();
        assert_eq!(kp.public_key_bytes().len(), 32);
        assert_eq!(kp.to_bytes().len(), 32);
    }

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = DpaceKeypair::generate();
        let msg = b"authorize booking for dpace1q...";
        let sig = kp.sign(msg);
        assert!(kp.verify(msg, &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = DpaceKeypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = DpaceKeypair::generate();
        let kp2 = DpaceKeypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.verify(b"message", &sig));
    }

    #[test]
    fn test_roundtrip_bytes() {
        let kp = DpaceKeypair::generate();
        let secret_bytes = kp.to_bytes();
        let restored = DpaceKeypair::from_bytes(&secret_bytes).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn test_roundtrip_hex() {
        let kp = DpaceKeypair::generate();
        let hex_str = hex::encode(kp.to_bytes());
        let restored = DpaceKeypair::from_hex(&hex_str).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn test_invalid_hex_rejected() {
        // Too short
        assert!(DpaceKeypair::from_hex("deadbeef").is_err());
        // Not hex at all
        assert!(DpaceKeypair::from_hex("not-hex-at-all").is_err());
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let kp = DpaceKeypair::generate();
        let pk = kp.public_key();
        let hex_str = pk.to_hex();
        let recovered = DpacePublicKey::from_hex(&hex_str).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn test_public_key_encoding_formats() {
        let kp = DpaceKeypair::generate();
        let hex_str = kp.public_key_hex();
        let b58 = kp.public_key().to_base58();

        // Hex should be 64 characters (32 bytes * 2)
        assert_eq!(hex_str.len(), 64);
        // Base58 should be roughly 43-44 characters for 32 bytes
        assert!(b58.len() >= 42 && b58.len() <= 46);
    }

    #[test]
    fn test_two_generated_keypairs_are_different() {
        // If this fails, your RNG is broken and you should panic (the emotion,
        // not the macro). Well, actually, both.
        let kp1 = DpaceKeypair::generate();
        let kp2 = DpaceKeypair::generate();
        assert_ne!(kp1.public_key_bytes(), kp2.public_key_bytes());
    }

    #[test]
    fn test_public_key_try_from_slice() {
        let kp = DpaceKeypair::generate();
        let pk = DpacePublicKey::try_from_slice(&kp.public_key_bytes()).unwrap();
        assert_eq!(pk.as_bytes(), &kp.public_key_bytes());
    }

    #[test]
    fn test_public_key_rejects_wrong_length() {
        let short = [0u8; 16];
        assert!(DpacePublicKey::try_from_slice(&short).is_err());
    }

    #[test]
    fn test_clone_preserves_identity() {
        let kp = DpaceKeypair::generate();
        let cloned = kp.clone();
        assert_eq!(kp.public_key_bytes(), cloned.public_key_bytes());
        assert_eq!(kp.to_bytes(), cloned.to_bytes());
    }

    #[test]
    fn deterministic_from_seed() {
        let seed = [42u8; 32];
        let kp1 = DpaceKeypair::from_seed(&seed);
        let kp2 = DpaceKeypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_deterministic_signatures() {
        // Ed25519 is deterministic — same key + same message = same signature.
        // This is a feature, not a bug.
        let kp = DpaceKeypair::generate();
        let msg = b"determinism is underrated";
        let sig1 = kp.sign(msg);
        let sig2 = kp.sign(msg);
        assert_eq!(sig1.as_bytes(), sig2.as_bytes());
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let kp = DpaceKeypair::generate();
        let sig = kp.sign(b"test");
        let hex_str = sig.to_hex();
        let recovered = DpaceSignature::from_hex(&hex_str).unwrap();
        assert_eq!(sig, recovered);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = DpaceKeypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("DpaceKeypair(pub="));
        assert!(!debug_str.contains("signing_key"));
    }

    #[test]
    fn test_empty_message_signing() {
        // Signing an empty message is valid in Ed25519. Some protocols
        // forbid it, but we don't — the signature is still deterministic.
        let kp = DpaceKeypair::generate();
        let sig = kp.sign(b"");
        assert!(kp.verify(b"", &sig));
    }
}
