//! End-to-end integration tests for the dPACE protocol crate.
//!
//! These tests exercise the full authorization pipeline from keypair
//! generation through commitment settlement. They prove that the protocol's
//! core components compose correctly: keypair generation, PartyId
//! derivation, credential issuance, canonical payload encoding, hashlock
//! commitments, and the RPC wire types that carry all of it between nodes.
//!
//! Each test stands alone with its own keys, clock, and commitment store.
//! No shared state, no test ordering dependencies, no flaky failures.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use dpace_protocol::clock::{Clock, ManualClock, Timestamp};
use dpace_protocol::codec;
use dpace_protocol::config::{MIN_RENTER_DEPOSIT, POLICY_WINDOW_SECS};
use dpace_protocol::credential::{verify_registration, RegistrationCredential};
use dpace_protocol::crypto::{sha256, verify, Digest, DpaceKeypair};
use dpace_protocol::hashlock::{self, Commitment, HashlockAuthorization, HashlockManager};
use dpace_protocol::identity::PartyId;
use dpace_protocol::rpc::{
    DeployRenterParams, RenterBookingParams, RpcMethod, RpcRequest, ValidateCarParams,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// A fresh keypair and the party identity derived from it.
fn new_party() -> (DpaceKeypair, PartyId) {
    let kp = DpaceKeypair::generate();
    let id = PartyId::from_public_key(&kp.public_key());
    (kp, id)
}

/// Generates a party, commits a fresh secret for it, and returns the
/// keypair, identity, and the digest that went into the commitment.
fn committed_party(
    manager: &mut HashlockManager,
    at: Timestamp,
) -> (DpaceKeypair, PartyId, Digest) {
    let (kp, id) = new_party();
    let (_, digest) = hashlock::generate();
    manager
        .commit(Commitment::new(id.clone(), digest, at))
        .expect("fresh party should have a free commitment slot");
    (kp, id, digest)
}

// ---------------------------------------------------------------------------
// 1. Full Mutual Authorization Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn full_mutual_authorization_lifecycle() {
    let clock = ManualClock::new(1_700_000_000);
    let mut manager = HashlockManager::new();

    // Two parties, each committed to a fresh secret.
    let (renter_kp, renter, renter_digest) = committed_party(&mut manager, clock.now());
    let (car_kp, car, car_digest) = committed_party(&mut manager, clock.now());
    assert_eq!(manager.len(), 2);

    // Each side authorizes the other's transition by signing over its OWN
    // committed digest, addressed to the counterparty.
    let car_auth = HashlockAuthorization::sign(&car_kp, renter.clone(), car_digest);
    let renter_auth = HashlockAuthorization::sign(&renter_kp, car.clone(), renter_digest);

    assert!(manager.authorize(&car, &car_auth));
    assert!(manager.authorize(&renter, &renter_auth));

    // Crossed lookups fail: an authorization only counts against the
    // commitment of the party that signed it.
    assert!(!manager.authorize(&renter, &car_auth));
    assert!(!manager.authorize(&car, &renter_auth));

    // Settlement consumes both slots and frees them for the next booking.
    assert!(manager.consume(&renter).is_some());
    assert!(manager.consume(&car).is_some());
    assert!(manager.is_empty());

    let (_, next_digest) = hashlock::generate();
    assert!(manager
        .commit(Commitment::new(renter, next_digest, clock.now()))
        .is_ok());
}

// ---------------------------------------------------------------------------
// 2. Identity Roundtrip
// ---------------------------------------------------------------------------

#[test]
fn identity_roundtrips_through_bech32() {
    let (_, party) = new_party();
    let address = party.to_address();

    assert!(address.starts_with("dpace1"));

    let recovered = PartyId::from_address(&address).unwrap();
    assert_eq!(party, recovered);
    assert_eq!(recovered.to_address(), address);
}

// ---------------------------------------------------------------------------
// 3. Credential Onboarding Paths
// ---------------------------------------------------------------------------

#[test]
fn credential_gates_both_onboarding_paths() {
    let rsp = DpaceKeypair::generate();
    let impostor = DpaceKeypair::generate();

    // Renter path: the claim stays private, only the digest is checked.
    let license = RegistrationCredential::issue(b"driver's license #77-401", &rsp);
    assert!(license.verify(&rsp.public_key()));
    assert!(!license.verify(&impostor.public_key()));

    // Car path: the listing details are public and must bind to the digest.
    let details = "grey wagon, plate HX-2214, 5 seats";
    let listing = RegistrationCredential::issue(details.as_bytes(), &rsp);
    assert!(verify_registration(
        details.as_bytes(),
        &listing,
        &rsp.public_key()
    ));
    assert!(!verify_registration(
        b"different car entirely",
        &listing,
        &rsp.public_key()
    ));
}

// ---------------------------------------------------------------------------
// 4. Canonical Payload and Detached Signature
// ---------------------------------------------------------------------------

#[test]
fn signed_payload_decodes_back_to_its_fields() {
    let (signer_kp, _) = new_party();
    let (_, destination) = new_party();
    let (_, digest) = hashlock::generate();

    let auth = HashlockAuthorization::sign(&signer_kp, destination.clone(), digest);

    // Re-encode what the signature covers and decode it: every field must
    // survive the wire form.
    let payload = codec::encode(&auth.destination, true, &auth.content);
    let (dest2, flag, content2) = codec::decode(&payload).unwrap();
    assert_eq!(dest2, destination);
    assert!(flag);
    assert_eq!(content2, digest);

    // The detached signature verifies over exactly those bytes.
    assert!(verify(&auth.sender_key, &payload, &auth.signature));
}

// ---------------------------------------------------------------------------
// 5. Authorization Over the Wire
// ---------------------------------------------------------------------------

#[test]
fn authorization_survives_json_transport() {
    let mut manager = HashlockManager::new();
    let (owner_kp, owner, digest) = committed_party(&mut manager, 10);
    let (_, destination) = new_party();

    // Ship the authorization through its JSON wire form, the way a node
    // receives it inside RPC params.
    let auth = HashlockAuthorization::sign(&owner_kp, destination, digest);
    let wire = serde_json::to_string(&auth).unwrap();
    let received: HashlockAuthorization = serde_json::from_str(&wire).unwrap();

    assert!(received.verify_signature());
    assert!(manager.authorize(&owner, &received));
}

// ---------------------------------------------------------------------------
// 6. RPC Params Carry Live Proofs
// ---------------------------------------------------------------------------

#[test]
fn booking_params_roundtrip_preserves_proofs() {
    let rsp = DpaceKeypair::generate();
    let (_, renter) = new_party();
    let (car_kp, car) = new_party();

    // Deploy params carry a live credential through JSON.
    let deploy = DeployRenterParams {
        renter: renter.clone(),
        credential: RegistrationCredential::issue(b"license #9-220", &rsp),
        deposit: MIN_RENTER_DEPOSIT,
    };
    let wire = serde_json::to_value(&deploy).unwrap();
    let recovered: DeployRenterParams = serde_json::from_value(wire).unwrap();
    assert_eq!(recovered.renter, renter);
    assert_eq!(recovered.deposit, MIN_RENTER_DEPOSIT);
    assert!(recovered.credential.verify(&rsp.public_key()));

    // Booking params carry a live hashlock authorization the same way.
    let (_, digest) = hashlock::generate();
    let booking = RenterBookingParams {
        renter: renter.clone(),
        car: car.clone(),
        secret_link: sha256(b"availability token"),
        authorization: HashlockAuthorization::sign(&car_kp, renter, digest),
    };
    let wire = serde_json::to_string(&booking).unwrap();
    assert!(wire.contains("dpace1"));

    let recovered: RenterBookingParams = serde_json::from_str(&wire).unwrap();
    assert_eq!(recovered.car, car);
    assert!(recovered.authorization.verify_signature());
}

// ---------------------------------------------------------------------------
// 7. RPC Envelope Roundtrip
// ---------------------------------------------------------------------------

#[test]
fn rpc_request_envelope_roundtrip() {
    let (_, car) = new_party();
    let params = serde_json::json!({
        "car": car.to_address(),
        "token": sha256(b"session nonce").to_hex(),
        "location": "dock 4",
    });
    let req = RpcRequest::new(serde_json::json!(7), RpcMethod::ValidateCar, params);

    let wire = serde_json::to_string(&req).unwrap();
    assert!(wire.contains("dpace_validateCar"));

    let recovered: RpcRequest = serde_json::from_str(&wire).unwrap();
    assert_eq!(recovered.method, RpcMethod::ValidateCar);
    assert_eq!(recovered.id, serde_json::json!(7));

    let parsed: ValidateCarParams = serde_json::from_value(recovered.params).unwrap();
    assert_eq!(parsed.car, car);
    assert_eq!(parsed.token, sha256(b"session nonce"));
    assert_eq!(parsed.location, "dock 4");
}

// ---------------------------------------------------------------------------
// 8. Deadline Arithmetic
// ---------------------------------------------------------------------------

#[test]
fn deadline_arithmetic_spans_the_policy_window() {
    let clock = ManualClock::new(1_000_000);
    let (_, owner) = new_party();
    let (_, digest) = hashlock::generate();

    let commitment = Commitment::new(owner, digest, clock.now());
    let deadline = commitment.created_at + POLICY_WINDOW_SECS;

    // One second short of the window: still inside.
    clock.advance(POLICY_WINDOW_SECS - 1);
    assert!(clock.now() < deadline);

    // The boundary second itself is past the window.
    clock.advance(1);
    assert!(clock.now() >= deadline);
}

// ---------------------------------------------------------------------------
// 9. Concurrent Commitment Access
// ---------------------------------------------------------------------------

#[test]
fn concurrent_commit_and_authorize() {
    use std::thread;

    let manager = Arc::new(RwLock::new(HashlockManager::new()));

    // Pre-commit ten parties whose authorizations we check from the main
    // thread while a writer keeps inserting new commitments.
    let mut checks = Vec::new();
    {
        let mut m = manager.write();
        for _ in 0..10 {
            let (kp, owner, digest) = committed_party(&mut m, 0);
            let (_, destination) = new_party();
            checks.push((
                owner,
                HashlockAuthorization::sign(&kp, destination, digest),
            ));
        }
    }

    let writer_manager = Arc::clone(&manager);
    let writer = thread::spawn(move || {
        for i in 0..20i64 {
            let (_, owner) = new_party();
            let (_, digest) = hashlock::generate();
            let _ = writer_manager
                .write()
                .commit(Commitment::new(owner, digest, i));
        }
    });

    for (owner, auth) in &checks {
        assert!(manager.read().authorize(owner, auth));
    }
    writer.join().expect("writer thread should not panic");

    assert_eq!(manager.read().len(), 30);
}

// ---------------------------------------------------------------------------
// 10. Address Uniqueness at Scale
// ---------------------------------------------------------------------------

#[test]
fn a_hundred_parties_never_collide() {
    let mut addresses = HashSet::new();
    for _ in 0..100 {
        let (_, party) = new_party();
        let address = party.to_address();
        assert!(address.starts_with("dpace1"));
        assert!(addresses.insert(address), "bech32 addresses must be unique");
    }
}

// ---------------------------------------------------------------------------
// 11. Tampering Caught at Every Layer
// ---------------------------------------------------------------------------

#[test]
fn tampering_is_caught_at_every_layer() {
    let (owner_kp, owner) = new_party();
    let (_, destination) = new_party();
    let (_, digest) = hashlock::generate();
    let commitment = Commitment::new(owner.clone(), digest, 5);

    // Layer 1: flip a payload byte into a non-canonical bool — the codec
    // refuses it outright.
    let payload = codec::encode(&destination, true, &digest);
    let mut bad = payload.to_vec();
    bad[34] = 0x5A;
    assert!(codec::decode(&bad).is_err());

    // Layer 2: redirect the destination — the signature no longer covers
    // the message's own fields.
    let mut auth = HashlockAuthorization::sign(&owner_kp, destination.clone(), digest);
    let (_, hijacker) = new_party();
    auth.destination = hijacker;
    assert!(!auth.verify_signature());
    assert!(!commitment.authorized_by(&auth));

    // Layer 3: swap the content for another valid digest — the commitment
    // pins its own digest, so even a correctly re-signed message fails.
    let (_, other_digest) = hashlock::generate();
    let resigned = HashlockAuthorization::sign(&owner_kp, destination, other_digest);
    assert!(resigned.verify_signature());
    assert!(!commitment.authorized_by(&resigned));
}

// ---------------------------------------------------------------------------
// 12. Full Pipeline: Keys -> Credentials -> Commitments -> Settlement
// ---------------------------------------------------------------------------

#[test]
fn full_pipeline_keys_through_consumed_commitment() {
    // The complete path through every layer of the crate:
    //   1. Generate keypairs and derive party identities
    //   2. RSP vets both parties and issues credentials
    //   3. Each party commits to a fresh hashlock secret
    //   4. Authorizations cross in both directions as RPC params
    //   5. Both commitments are consumed on settlement

    let clock = ManualClock::new(1_750_000_000);
    let rsp = DpaceKeypair::generate();
    let mut manager = HashlockManager::new();

    // Step 1: identities.
    let (renter_kp, renter) = new_party();
    let (car_kp, car) = new_party();
    assert_eq!(PartyId::from_address(&renter.to_address()).unwrap(), renter);
    assert_ne!(renter, car);

    // Step 2: registration credentials.
    let renter_credential = RegistrationCredential::issue(b"license #55-1020", &rsp);
    let details = "red hatchback, plate KL-8821";
    let car_credential = RegistrationCredential::issue(details.as_bytes(), &rsp);
    assert!(renter_credential.verify(&rsp.public_key()));
    assert!(verify_registration(
        details.as_bytes(),
        &car_credential,
        &rsp.public_key()
    ));

    // Step 3: commitments.
    let (_, renter_digest) = hashlock::generate();
    let (_, car_digest) = hashlock::generate();
    manager
        .commit(Commitment::new(renter.clone(), renter_digest, clock.now()))
        .unwrap();
    manager
        .commit(Commitment::new(car.clone(), car_digest, clock.now()))
        .unwrap();

    // Step 4: the car's authorization travels to the renter inside booking
    // params, over JSON, and still authorizes after the trip.
    let car_auth = HashlockAuthorization::sign(&car_kp, renter.clone(), car_digest);
    let params = RenterBookingParams {
        renter: renter.clone(),
        car: car.clone(),
        secret_link: sha256(b"published availability token"),
        authorization: car_auth,
    };
    let wire = serde_json::to_string(&params).unwrap();
    let received: RenterBookingParams = serde_json::from_str(&wire).unwrap();
    assert!(manager.authorize(&received.car, &received.authorization));

    let renter_auth = HashlockAuthorization::sign(&renter_kp, car.clone(), renter_digest);
    assert!(manager.authorize(&renter, &renter_auth));

    // Step 5: settlement consumes both slots.
    clock.advance(3_600);
    assert!(manager.consume(&renter).is_some());
    assert!(manager.consume(&car).is_some());
    assert!(manager.is_empty());
}
