//! # Hashlock Commitments
//!
//! The mutual-consent machinery of a booking. Each party generates a random
//! secret, commits to its SHA-256 digest, and authorizes the counterparty's
//! transition by signing the canonical encoding of that digest (see
//! [`crate::codec`]). A booking advances only when the right party has
//! signed over the right commitment for the right destination.
//!
//! Note the scheme as specified is signed-commitment, not pre-image reveal:
//! the secret itself never crosses the wire during authorization. The
//! secret still exists — [`generate`] hands it back alongside the digest —
//! so a reveal-based settlement layer could be added without changing what
//! is stored here.
//!
//! Commitments are keyed by owner and strictly single-occupancy: a party
//! with an unconsumed commitment cannot create a second one. Consumption
//! happens when the booking that needed the commitment ends.

use crate::clock::Timestamp;
use crate::codec;
use crate::crypto::hash::{sha256, Digest};
use crate::crypto::keys::{DpaceKeypair, DpacePublicKey, DpaceSignature};
use crate::crypto::{sign, verify};
use crate::identity::PartyId;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors from commitment bookkeeping.
#[derive(Debug, Error)]
pub enum HashlockError {
    /// The owner already holds an unconsumed commitment.
    #[error("an unconsumed hashlock commitment already exists for {owner}")]
    DuplicateCommitment {
        /// The party whose slot is occupied.
        owner: PartyId,
    },
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// 32 bytes of hashlock secret material.
///
/// Deliberately NOT `Serialize`/`Deserialize` and with a redacted `Debug`:
/// the secret's entire value is that it stays wherever [`generate`] was
/// called. Only its digest travels.
pub struct Secret([u8; 32]);

impl Secret {
    /// Get the raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The SHA-256 digest this secret commits to.
    pub fn digest(&self) -> Digest {
        sha256(&self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret bytes, not even partially.
        write!(f, "Secret(<redacted>)")
    }
}

/// Generate a fresh hashlock secret and its commitment digest.
///
/// The secret comes from the OS RNG; the digest is SHA-256 of the raw
/// bytes. Callers keep the [`Secret`] and put the [`Digest`] into a
/// [`Commitment`].
pub fn generate() -> (Secret, Digest) {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let secret = Secret(bytes);
    let digest = secret.digest();
    (secret, digest)
}

// ---------------------------------------------------------------------------
// Commitments & authorizations
// ---------------------------------------------------------------------------

/// A stored hashlock commitment: an owner bound to a secret digest.
///
/// Once created, the digest is immutable until the commitment is consumed —
/// there is no update operation, by design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    /// The party that generated the secret and stands behind the commitment.
    pub owner: PartyId,

    /// SHA-256 digest of the owner's secret.
    pub secret_digest: Digest,

    /// Ledger time at which the commitment was created.
    pub created_at: Timestamp,
}

impl Commitment {
    /// Bind `owner` to `secret_digest` at time `created_at`.
    pub fn new(owner: PartyId, secret_digest: Digest, created_at: Timestamp) -> Self {
        Self {
            owner,
            secret_digest,
            created_at,
        }
    }

    /// Does `message` validly authorize against this commitment?
    ///
    /// Two checks, cheapest first:
    ///
    /// 1. The message's sender identity must equal the commitment's owner.
    /// 2. The signature must verify over the canonical encoding of
    ///    `{message.destination, true, self.secret_digest}` — note the
    ///    digest comes from the commitment, not from the message. A message
    ///    carrying any other content cannot have a signature that verifies
    ///    over these bytes.
    pub fn authorized_by(&self, message: &HashlockAuthorization) -> bool {
        if message.sender() != self.owner {
            return false;
        }
        let payload = codec::encode(&message.destination, true, &self.secret_digest);
        verify(&message.sender_key, &payload, &message.signature)
    }
}

/// A signed authorization message: "I, `sender`, authorize a hash-locked
/// transition toward `destination` over `content`."
///
/// Both parties construct these independently; the canonical codec
/// guarantees they sign byte-identical payloads for identical inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashlockAuthorization {
    /// The signer's public key. The sender identity is derived from it,
    /// so the message cannot claim an identity its signature can't back.
    pub sender_key: DpacePublicKey,

    /// The party this authorization is addressed to.
    pub destination: PartyId,

    /// The commitment digest being authorized over.
    pub content: Digest,

    /// Ed25519 signature over `codec::encode(destination, true, content)`.
    pub signature: DpaceSignature,
}

impl HashlockAuthorization {
    /// Build and sign an authorization in one step.
    pub fn sign(keypair: &DpaceKeypair, destination: PartyId, content: Digest) -> Self {
        let payload = codec::encode(&destination, true, &content);
        let signature = sign(keypair, &payload);
        Self {
            sender_key: keypair.public_key(),
            destination,
            content,
            signature,
        }
    }

    /// The sender's party identity, derived from the embedded public key.
    pub fn sender(&self) -> PartyId {
        PartyId::from_public_key(&self.sender_key)
    }

    /// Check the signature against the message's own fields.
    ///
    /// This validates internal consistency only. Authorization against a
    /// specific commitment goes through [`Commitment::authorized_by`],
    /// which pins the content to the committed digest.
    pub fn verify_signature(&self) -> bool {
        let payload = codec::encode(&self.destination, true, &self.content);
        verify(&self.sender_key, &payload, &self.signature)
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Commitment storage, keyed by owner. One unconsumed commitment per party.
#[derive(Debug, Default)]
pub struct HashlockManager {
    commitments: HashMap<PartyId, Commitment>,
}

impl HashlockManager {
    /// An empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a commitment. Fails with [`HashlockError::DuplicateCommitment`]
    /// if the owner already holds an unconsumed one.
    pub fn commit(&mut self, commitment: Commitment) -> Result<(), HashlockError> {
        if self.commitments.contains_key(&commitment.owner) {
            return Err(HashlockError::DuplicateCommitment {
                owner: commitment.owner.clone(),
            });
        }
        self.commitments.insert(commitment.owner.clone(), commitment);
        Ok(())
    }

    /// Look up the unconsumed commitment for `owner`, if any.
    pub fn get(&self, owner: &PartyId) -> Option<&Commitment> {
        self.commitments.get(owner)
    }

    /// Does `owner` currently hold an unconsumed commitment?
    pub fn has(&self, owner: &PartyId) -> bool {
        self.commitments.contains_key(owner)
    }

    /// Validate `message` against the stored commitment for `owner`.
    ///
    /// `false` when no commitment exists — an authorization with nothing
    /// to authorize against is not valid, it's noise.
    pub fn authorize(&self, owner: &PartyId, message: &HashlockAuthorization) -> bool {
        self.commitments
            .get(owner)
            .map(|c| c.authorized_by(message))
            .unwrap_or(false)
    }

    /// Remove and return the commitment for `owner`. Called when the
    /// booking that required the commitment ends (cancel or force-end).
    pub fn consume(&mut self, owner: &PartyId) -> Option<Commitment> {
        self.commitments.remove(owner)
    }

    /// Number of unconsumed commitments.
    pub fn len(&self) -> usize {
        self.commitments.len()
    }

    /// True when no commitments are outstanding.
    pub fn is_empty(&self) -> bool {
        self.commitments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party_with_key() -> (DpaceKeypair, PartyId) {
        let kp = DpaceKeypair::generate();
        let id = PartyId::from_public_key(&kp.public_key());
        (kp, id)
    }

    #[test]
    fn generate_binds_secret_to_digest() {
        let (secret, digest) = generate();
        assert_eq!(secret.digest(), digest);
        assert_eq!(sha256(secret.as_bytes()), digest);
    }

    #[test]
    fn generate_produces_unique_secrets() {
        let (_, d1) = generate();
        let (_, d2) = generate();
        assert_ne!(d1, d2);
    }

    #[test]
    fn secret_debug_is_redacted() {
        let (secret, _) = generate();
        assert_eq!(format!("{:?}", secret), "Secret(<redacted>)");
    }

    #[test]
    fn authorization_signature_verifies() {
        let (signer, _) = party_with_key();
        let (_, destination) = party_with_key();
        let (_, digest) = generate();

        let auth = HashlockAuthorization::sign(&signer, destination, digest);
        assert!(auth.verify_signature());
    }

    #[test]
    fn sender_identity_derives_from_key() {
        let (signer, signer_id) = party_with_key();
        let (_, destination) = party_with_key();
        let (_, digest) = generate();

        let auth = HashlockAuthorization::sign(&signer, destination, digest);
        assert_eq!(auth.sender(), signer_id);
    }

    #[test]
    fn tampered_destination_fails_signature() {
        let (signer, _) = party_with_key();
        let (_, destination) = party_with_key();
        let (_, intruder) = party_with_key();
        let (_, digest) = generate();

        let mut auth = HashlockAuthorization::sign(&signer, destination, digest);
        auth.destination = intruder;
        assert!(!auth.verify_signature());
    }

    #[test]
    fn tampered_content_fails_signature() {
        let (signer, _) = party_with_key();
        let (_, destination) = party_with_key();
        let (_, digest) = generate();

        let mut auth = HashlockAuthorization::sign(&signer, destination, digest);
        auth.content = sha256(b"some other digest");
        assert!(!auth.verify_signature());
    }

    #[test]
    fn commitment_authorizes_owner_signature() {
        let (owner_kp, owner) = party_with_key();
        let (_, destination) = party_with_key();
        let (_, digest) = generate();

        let commitment = Commitment::new(owner, digest, 100);
        let auth = HashlockAuthorization::sign(&owner_kp, destination, digest);
        assert!(commitment.authorized_by(&auth));
    }

    #[test]
    fn commitment_rejects_non_owner_signature() {
        let (_, owner) = party_with_key();
        let (stranger_kp, _) = party_with_key();
        let (_, destination) = party_with_key();
        let (_, digest) = generate();

        let commitment = Commitment::new(owner, digest, 100);
        // The stranger signs a perfectly valid message over the right
        // digest. It is still not the owner.
        let auth = HashlockAuthorization::sign(&stranger_kp, destination, digest);
        assert!(auth.verify_signature());
        assert!(!commitment.authorized_by(&auth));
    }

    #[test]
    fn commitment_rejects_wrong_content() {
        let (owner_kp, owner) = party_with_key();
        let (_, destination) = party_with_key();
        let (_, committed) = generate();
        let (_, other) = generate();

        let commitment = Commitment::new(owner, committed, 100);
        // Signed by the right party, but over a different digest: the
        // signature cannot verify over the committed payload.
        let auth = HashlockAuthorization::sign(&owner_kp, destination, other);
        assert!(!commitment.authorized_by(&auth));
    }

    #[test]
    fn manager_commit_get_consume() {
        let (_, owner) = party_with_key();
        let (_, digest) = generate();
        let mut manager = HashlockManager::new();

        manager
            .commit(Commitment::new(owner.clone(), digest, 1))
            .unwrap();
        assert!(manager.has(&owner));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get(&owner).unwrap().secret_digest, digest);

        let consumed = manager.consume(&owner).unwrap();
        assert_eq!(consumed.secret_digest, digest);
        assert!(manager.is_empty());
        assert!(manager.get(&owner).is_none());
    }

    #[test]
    fn manager_rejects_duplicate_commitment() {
        let (_, owner) = party_with_key();
        let (_, d1) = generate();
        let (_, d2) = generate();
        let mut manager = HashlockManager::new();

        manager
            .commit(Commitment::new(owner.clone(), d1, 1))
            .unwrap();
        let err = manager
            .commit(Commitment::new(owner.clone(), d2, 2))
            .unwrap_err();
        assert!(matches!(err, HashlockError::DuplicateCommitment { .. }));

        // The original commitment is untouched.
        assert_eq!(manager.get(&owner).unwrap().secret_digest, d1);
    }

    #[test]
    fn manager_allows_recommit_after_consume() {
        let (_, owner) = party_with_key();
        let (_, d1) = generate();
        let (_, d2) = generate();
        let mut manager = HashlockManager::new();

        manager
            .commit(Commitment::new(owner.clone(), d1, 1))
            .unwrap();
        manager.consume(&owner);
        manager
            .commit(Commitment::new(owner.clone(), d2, 2))
            .unwrap();
        assert_eq!(manager.get(&owner).unwrap().secret_digest, d2);
    }

    #[test]
    fn manager_authorize_checks_stored_commitment() {
        let (owner_kp, owner) = party_with_key();
        let (_, destination) = party_with_key();
        let (_, digest) = generate();
        let mut manager = HashlockManager::new();

        let auth = HashlockAuthorization::sign(&owner_kp, destination, digest);

        // Nothing stored yet: nothing to authorize against.
        assert!(!manager.authorize(&owner, &auth));

        manager
            .commit(Commitment::new(owner.clone(), digest, 1))
            .unwrap();
        assert!(manager.authorize(&owner, &auth));
    }

    #[test]
    fn authorization_serde_roundtrip() {
        let (signer, _) = party_with_key();
        let (_, destination) = party_with_key();
        let (_, digest) = generate();

        let auth = HashlockAuthorization::sign(&signer, destination, digest);
        let json = serde_json::to_string(&auth).unwrap();
        let recovered: HashlockAuthorization = serde_json::from_str(&json).unwrap();
        assert_eq!(auth, recovered);
        assert!(recovered.verify_signature());
    }
}
