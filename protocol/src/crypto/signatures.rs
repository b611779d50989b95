//! # Digital Signatures
//!
//! Ed25519 signing and verification — the backbone of authentication in
//! dPACE. Every registration credential and every booking authorization is
//! an Ed25519 signature over well-defined bytes.
//!
//! ## Why not just use ed25519-dalek directly?
//!
//! We could, and inside `keys.rs` we do. But routing callers through these
//! two functions gives us:
//!
//! 1. A single place to audit all signing operations.
//! 2. A natural extension point for threshold signatures later.
//! 3. Type safety — you can't accidentally pass a raw byte soup where a
//!    typed signature goes.
//!
//! ## Strictness
//!
//! We use `ed25519-dalek`'s verification as-is, which rejects malformed
//! points outright. We don't need to be compatible with legacy Ed25519
//! implementations that get the cofactor wrong.

use super::keys::{DpaceKeypair, DpacePublicKey, DpaceSignature};

/// Sign a message using a dPACE keypair.
///
/// Produces a 64-byte Ed25519 signature over the given message bytes.
/// The signature is deterministic — signing the same message with the same
/// key will always produce the same signature (RFC 8032). No nonce reuse
/// bugs possible. Thank you, Bernstein.
///
/// # Example
///
/// ```
/// use dpace_protocol::crypto::{DpaceKeypair, sign, verify};
///
/// let keypair = DpaceKeypair::generate();
/// let message = b"confirm booking";
/// let signature = sign(&keypair, message);
///
/// assert!(verify(&keypair.public_key(), message, &signature));
/// ```
pub fn sign(keypair: &DpaceKeypair, message: &[u8]) -> DpaceSignature {
    keypair.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
///
/// Returns `true` if the signature is valid, `false` otherwise.
/// We intentionally don't distinguish between "invalid signature" and
/// "wrong public key" — both are just "nope." Giving attackers a
/// detailed error oracle is a bad idea.
pub fn verify(public_key: &DpacePublicKey, message: &[u8], signature: &DpaceSignature) -> bool {
    public_key.verify(message, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DpaceKeypair;

    #[test]
    fn test_sign_and_verify() {
        let kp = DpaceKeypair::generate();
        let msg = b"hello, world";
        let sig = sign(&kp, msg);
        assert!(verify(&kp.public_key(), msg, &sig));
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = DpaceKeypair::generate();
        let sig = sign(&kp, b"correct message");
        assert!(!verify(&kp.public_key(), b"wrong message", &sig));
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = DpaceKeypair::generate();
        let kp2 = DpaceKeypair::generate();
        let msg = b"test message";
        let sig = sign(&kp1, msg);
        // Verifying with a different key should fail.
        assert!(!verify(&kp2.public_key(), msg, &sig));
    }

    #[test]
    fn test_deterministic_signatures() {
        // Ed25519 is deterministic — same key + same message = same signature.
        let kp = DpaceKeypair::generate();
        let msg = b"determinism is underrated";
        let sig1 = sign(&kp, msg);
        let sig2 = sign(&kp, msg);
        assert_eq!(sig1.as_bytes(), sig2.as_bytes());
    }

    #[test]
    fn test_large_message() {
        // Ed25519 can sign messages of any length (it hashes internally).
        let kp = DpaceKeypair::generate();
        let msg = vec![0xAB; 1_000_000]; // 1 MB of data
        let sig = sign(&kp, &msg);
        assert!(verify(&kp.public_key(), &msg, &sig));
    }
}
