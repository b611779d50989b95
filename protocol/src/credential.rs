//! # Registration Credentials
//!
//! Proof that the RSP (Registration Service Provider) vetted a party before
//! it entered the protocol. The RSP checks documents off-protocol — a
//! driver's license, a vehicle title — and signs the SHA-256 digest of the
//! claim. The claim itself never travels: a renter proves "the RSP saw my
//! license" without putting the license on the wire.
//!
//! A credential is verified in one of two modes:
//!
//! - **Digest-only** ([`RegistrationCredential::verify`]) — checks the RSP
//!   signature over the digest. Used when the claim stays private, which is
//!   the renter onboarding path.
//! - **Full** ([`verify_registration`]) — additionally recomputes the digest
//!   from the presented claim bytes. Used when the claim is public, which is
//!   the car onboarding path (the car's listed details are the claim).
//!
//! Credentials carry no expiry and no revocation list. Registration is a
//! one-shot gate; a deployment that needs revocation rotates the RSP key.

use crate::crypto::hash::{sha256, Digest};
use crate::crypto::keys::{DpaceKeypair, DpacePublicKey, DpaceSignature};
use crate::crypto::{sign, verify};
use serde::{Deserialize, Serialize};

/// An RSP-issued registration proof: the digest of a vetted claim plus the
/// RSP's signature over that digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCredential {
    /// SHA-256 digest of the claim the RSP vetted.
    pub claim_digest: Digest,

    /// The RSP's Ed25519 signature over the digest bytes.
    pub signature: DpaceSignature,
}

impl RegistrationCredential {
    /// Issue a credential over `claim`. RSP-side only — the caller must
    /// hold the RSP's signing key.
    pub fn issue(claim: &[u8], rsp_keypair: &DpaceKeypair) -> Self {
        let claim_digest = sha256(claim);
        let signature = sign(rsp_keypair, claim_digest.as_bytes());
        Self {
            claim_digest,
            signature,
        }
    }

    /// Check the RSP signature over the stored digest.
    ///
    /// Does NOT bind the credential to any particular claim bytes — use
    /// [`verify_registration`] when the claim is presented alongside.
    pub fn verify(&self, rsp_public_key: &DpacePublicKey) -> bool {
        verify(rsp_public_key, self.claim_digest.as_bytes(), &self.signature)
    }
}

/// Full credential verification: the presented claim must digest to the
/// credential's `claim_digest`, and the RSP signature must verify.
///
/// The digest comparison runs first; it is the cheap check, and a mismatch
/// there means the credential was issued for some other claim entirely.
pub fn verify_registration(
    claim: &[u8],
    credential: &RegistrationCredential,
    rsp_public_key: &DpacePublicKey,
) -> bool {
    sha256(claim) == credential.claim_digest && credential.verify(rsp_public_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_credential_verifies() {
        let rsp = DpaceKeypair::generate();
        let credential = RegistrationCredential::issue(b"driver's license #4821", &rsp);
        assert!(credential.verify(&rsp.public_key()));
    }

    #[test]
    fn full_verification_binds_claim() {
        let rsp = DpaceKeypair::generate();
        let credential = RegistrationCredential::issue(b"blue sedan, plate X-900", &rsp);
        assert!(verify_registration(
            b"blue sedan, plate X-900",
            &credential,
            &rsp.public_key()
        ));
    }

    #[test]
    fn wrong_claim_rejected() {
        let rsp = DpaceKeypair::generate();
        let credential = RegistrationCredential::issue(b"blue sedan", &rsp);
        assert!(!verify_registration(
            b"red coupe",
            &credential,
            &rsp.public_key()
        ));
    }

    #[test]
    fn wrong_rsp_key_rejected() {
        let rsp = DpaceKeypair::generate();
        let impostor = DpaceKeypair::generate();
        let credential = RegistrationCredential::issue(b"claim", &rsp);
        assert!(!credential.verify(&impostor.public_key()));
        assert!(!verify_registration(
            b"claim",
            &credential,
            &impostor.public_key()
        ));
    }

    #[test]
    fn tampered_digest_rejected() {
        let rsp = DpaceKeypair::generate();
        let mut credential = RegistrationCredential::issue(b"original claim", &rsp);
        // Swap the digest for another well-formed one: the signature no
        // longer covers it.
        credential.claim_digest = sha256(b"forged claim");
        assert!(!credential.verify(&rsp.public_key()));
    }

    #[test]
    fn tampered_signature_rejected() {
        let rsp = DpaceKeypair::generate();
        let other = DpaceKeypair::generate();
        let mut credential = RegistrationCredential::issue(b"claim", &rsp);
        credential.signature = other.sign(credential.claim_digest.as_bytes());
        assert!(!credential.verify(&rsp.public_key()));
    }

    #[test]
    fn credential_serde_roundtrip() {
        let rsp = DpaceKeypair::generate();
        let credential = RegistrationCredential::issue(b"serialized claim", &rsp);
        let json = serde_json::to_string(&credential).unwrap();
        let recovered: RegistrationCredential = serde_json::from_str(&json).unwrap();
        assert_eq!(credential, recovered);
        assert!(recovered.verify(&rsp.public_key()));
    }
}
