//! Integration tests for the booking lifecycle.
//!
//! These tests drive the engine across module boundaries the way real
//! parties would: an RSP issues credentials, a renter and a car register,
//! the car publishes availability, the two sides book, and the booking
//! ends by mutual consent.

use std::sync::Arc;

use dpace_booking::engine::BookingEngine;
use dpace_booking::error::BookingError;
use dpace_booking::events::BookingEvent;
use dpace_booking::records::{CarState, RenterState};
use dpace_protocol::clock::ManualClock;
use dpace_protocol::config::{MIN_RENTER_DEPOSIT, POLICY_WINDOW_SECS};
use dpace_protocol::credential::RegistrationCredential;
use dpace_protocol::crypto::keys::DpaceKeypair;
use dpace_protocol::crypto::sha256;
use dpace_protocol::hashlock::{self, HashlockAuthorization};
use dpace_protocol::identity::PartyId;

struct Party {
    keys: DpaceKeypair,
    id: PartyId,
}

fn party() -> Party {
    let keys = DpaceKeypair::generate();
    let id = PartyId::from_public_key(&keys.public_key());
    Party { keys, id }
}

/// Helper: an engine at ledger time 10_000 with its trusted RSP keypair.
fn network() -> (BookingEngine, DpaceKeypair, Arc<ManualClock>) {
    let rsp = DpaceKeypair::generate();
    let clock = Arc::new(ManualClock::new(10_000));
    let engine = BookingEngine::new(rsp.public_key(), clock.clone());
    (engine, rsp, clock)
}

// ---------------------------------------------------------------------------
// Full Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn full_booking_and_mutual_cancel() {
    let (mut engine, rsp, _clock) = network();
    let renter = party();
    let car = party();

    // 1. The renter registers with an RSP credential and a deposit.
    let renter_cred = RegistrationCredential::issue(b"driver's license #4821", &rsp);
    engine
        .deploy_renter(&renter.id, &renter_cred, MIN_RENTER_DEPOSIT)
        .unwrap();
    assert_eq!(
        engine.renter_state(&renter.id),
        Some(RenterState::AwaitingCar)
    );

    // 2. The car registers with a credential over its listing details.
    let details = b"2021 compact, silver, plate 7KPT210";
    let car_cred = RegistrationCredential::issue(details, &rsp);
    engine.deploy_car(&car.id, details, &car_cred, 8).unwrap();
    assert_eq!(engine.car_state(&car.id), Some(CarState::Idle));

    // 3. The car publishes an availability token and its location.
    let (_, token) = hashlock::generate();
    let events = engine
        .validate_car(&car.id, token, "lot B, level 2")
        .unwrap();
    assert_eq!(
        events,
        vec![BookingEvent::CarAvailable {
            car: car.id.clone(),
            token,
        }]
    );
    assert_eq!(engine.car_state(&car.id), Some(CarState::Available));

    // 4. The renter books: hash of the token plus the car's authorization.
    let (_, car_commit) = hashlock::generate();
    let car_auth = HashlockAuthorization::sign(&car.keys, renter.id.clone(), car_commit);
    engine
        .renter_booking(&renter.id, &car.id, sha256(token.as_bytes()), &car_auth)
        .unwrap();
    assert_eq!(engine.renter_state(&renter.id), Some(RenterState::Booked));
    assert_eq!(engine.car_state(&car.id), Some(CarState::Reserved));

    let booking = engine.booking(&renter.id, &car.id).unwrap();
    assert_eq!(booking.deadline, booking.created_at + POLICY_WINDOW_SECS);

    // 5. The renter cancels with the car's signed consent.
    let consent = HashlockAuthorization::sign(&car.keys, renter.id.clone(), car_commit);
    engine.cancel_booking(&renter.id, &consent).unwrap();

    assert_eq!(engine.renter_state(&renter.id), Some(RenterState::Idle));
    assert_eq!(engine.car_state(&car.id), Some(CarState::Available));
    assert!(engine.booking(&renter.id, &car.id).is_none());
    assert_eq!(engine.booking_count(), 0);
}

#[test]
fn car_cancels_with_renter_consent() {
    let (mut engine, rsp, _clock) = network();
    let renter = party();
    let car = party();

    let renter_cred = RegistrationCredential::issue(b"license", &rsp);
    engine.deploy_renter(&renter.id, &renter_cred, 30).unwrap();
    let details = b"2019 wagon, blue";
    let car_cred = RegistrationCredential::issue(details, &rsp);
    engine.deploy_car(&car.id, details, &car_cred, 5).unwrap();

    let (_, token) = hashlock::generate();
    engine.validate_car(&car.id, token, "pier 7").unwrap();
    let (_, car_commit) = hashlock::generate();
    let car_auth = HashlockAuthorization::sign(&car.keys, renter.id.clone(), car_commit);
    engine
        .renter_booking(&renter.id, &car.id, sha256(token.as_bytes()), &car_auth)
        .unwrap();

    // The renter consents to the car's cancellation.
    let (_, digest) = hashlock::generate();
    let consent = HashlockAuthorization::sign(&renter.keys, car.id.clone(), digest);
    engine.cancel_booking(&car.id, &consent).unwrap();

    assert_eq!(engine.renter_state(&renter.id), Some(RenterState::Idle));
    assert_eq!(engine.car_state(&car.id), Some(CarState::Available));
}

// ---------------------------------------------------------------------------
// One Booking Per Party
// ---------------------------------------------------------------------------

#[test]
fn a_booked_renter_cannot_book_again() {
    let (mut engine, rsp, _clock) = network();
    let renter = party();
    let car_a = party();
    let car_b = party();

    let renter_cred = RegistrationCredential::issue(b"license", &rsp);
    engine.deploy_renter(&renter.id, &renter_cred, 30).unwrap();
    for (car, details) in [(&car_a, b"car a".as_slice()), (&car_b, b"car b".as_slice())] {
        let cred = RegistrationCredential::issue(details, &rsp);
        engine.deploy_car(&car.id, details, &cred, 5).unwrap();
    }

    let (_, token_a) = hashlock::generate();
    engine.validate_car(&car_a.id, token_a, "lot A").unwrap();
    let (_, token_b) = hashlock::generate();
    engine.validate_car(&car_b.id, token_b, "lot B").unwrap();

    let (_, commit_a) = hashlock::generate();
    let auth_a = HashlockAuthorization::sign(&car_a.keys, renter.id.clone(), commit_a);
    engine
        .renter_booking(&renter.id, &car_a.id, sha256(token_a.as_bytes()), &auth_a)
        .unwrap();

    // Second booking: the renter is Booked, not AwaitingCar.
    let (_, commit_b) = hashlock::generate();
    let auth_b = HashlockAuthorization::sign(&car_b.keys, renter.id.clone(), commit_b);
    let err = engine
        .renter_booking(&renter.id, &car_b.id, sha256(token_b.as_bytes()), &auth_b)
        .unwrap_err();
    assert!(matches!(err, BookingError::StateMismatch { .. }));

    // Car B is untouched and still bookable by someone else.
    assert_eq!(engine.car_state(&car_b.id), Some(CarState::Available));
    assert_eq!(engine.booking_count(), 1);
}

#[test]
fn a_reserved_car_cannot_be_booked_again() {
    let (mut engine, rsp, _clock) = network();
    let renter_a = party();
    let renter_b = party();
    let car = party();

    for renter in [&renter_a, &renter_b] {
        let cred = RegistrationCredential::issue(b"license", &rsp);
        engine.deploy_renter(&renter.id, &cred, 30).unwrap();
    }
    let details = b"2024 roadster, red";
    let cred = RegistrationCredential::issue(details, &rsp);
    engine.deploy_car(&car.id, details, &cred, 40).unwrap();

    let (_, token) = hashlock::generate();
    engine.validate_car(&car.id, token, "marina").unwrap();

    let (_, commit) = hashlock::generate();
    let auth = HashlockAuthorization::sign(&car.keys, renter_a.id.clone(), commit);
    engine
        .renter_booking(&renter_a.id, &car.id, sha256(token.as_bytes()), &auth)
        .unwrap();

    // Renter B races for the same car and loses: it is Reserved now.
    let (_, commit_b) = hashlock::generate();
    let auth_b = HashlockAuthorization::sign(&car.keys, renter_b.id.clone(), commit_b);
    let err = engine
        .renter_booking(&renter_b.id, &car.id, sha256(token.as_bytes()), &auth_b)
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::StateMismatch { found, .. } if found == "Reserved"
    ));
    assert_eq!(
        engine.renter_state(&renter_b.id),
        Some(RenterState::AwaitingCar)
    );
}

// ---------------------------------------------------------------------------
// Consent Is Not Optional
// ---------------------------------------------------------------------------

#[test]
fn cancel_needs_the_counterparty_not_the_caller() {
    let (mut engine, rsp, _clock) = network();
    let renter = party();
    let car = party();

    let renter_cred = RegistrationCredential::issue(b"license", &rsp);
    engine.deploy_renter(&renter.id, &renter_cred, 30).unwrap();
    let details = b"2021 compact";
    let car_cred = RegistrationCredential::issue(details, &rsp);
    engine.deploy_car(&car.id, details, &car_cred, 8).unwrap();

    let (_, token) = hashlock::generate();
    engine.validate_car(&car.id, token, "lot B").unwrap();
    let (_, car_commit) = hashlock::generate();
    let car_auth = HashlockAuthorization::sign(&car.keys, renter.id.clone(), car_commit);
    engine
        .renter_booking(&renter.id, &car.id, sha256(token.as_bytes()), &car_auth)
        .unwrap();

    // Self-signed consent is no consent.
    let (_, digest) = hashlock::generate();
    let self_signed = HashlockAuthorization::sign(&renter.keys, renter.id.clone(), digest);
    let err = engine.cancel_booking(&renter.id, &self_signed).unwrap_err();
    assert!(matches!(err, BookingError::Unauthorized { .. }));

    // The booking is still standing.
    assert_eq!(engine.renter_state(&renter.id), Some(RenterState::Booked));
    assert_eq!(engine.car_state(&car.id), Some(CarState::Reserved));
    assert!(engine.booking(&renter.id, &car.id).is_some());
}

#[test]
fn rebooking_works_after_cancel() {
    let (mut engine, rsp, _clock) = network();
    let renter = party();
    let car = party();

    let renter_cred = RegistrationCredential::issue(b"license", &rsp);
    engine.deploy_renter(&renter.id, &renter_cred, 30).unwrap();
    let details = b"2021 compact";
    let car_cred = RegistrationCredential::issue(details, &rsp);
    engine.deploy_car(&car.id, details, &car_cred, 8).unwrap();

    let (_, token) = hashlock::generate();
    engine.validate_car(&car.id, token, "lot B").unwrap();
    let (_, car_commit) = hashlock::generate();
    let car_auth = HashlockAuthorization::sign(&car.keys, renter.id.clone(), car_commit);
    engine
        .renter_booking(&renter.id, &car.id, sha256(token.as_bytes()), &car_auth)
        .unwrap();

    let consent = HashlockAuthorization::sign(&car.keys, renter.id.clone(), car_commit);
    engine.cancel_booking(&renter.id, &consent).unwrap();

    // The renter re-registers (it returned to Idle), the car is still
    // Available under the same token, and the dance repeats.
    engine.deploy_renter(&renter.id, &renter_cred, 30).unwrap();
    let (_, second_commit) = hashlock::generate();
    let second_auth = HashlockAuthorization::sign(&car.keys, renter.id.clone(), second_commit);
    engine
        .renter_booking(&renter.id, &car.id, sha256(token.as_bytes()), &second_auth)
        .unwrap();
    assert_eq!(engine.car_state(&car.id), Some(CarState::Reserved));
}
