//! Interactive CLI demo of the full dPACE booking lifecycle.
//!
//! Walks through identity creation, RSP credential issuance, registration,
//! availability publishing, the two-sided booking handshake, a rejected
//! premature force-end, and the real one after the escalation deadline.
//! The output uses ANSI escape codes for colored, storytelling-style
//! terminal rendering. Ledger time comes from a manual clock so the demo
//! can fast-forward past the deadline.
//!
//! Run with:
//!   cargo run --example demo --release

use std::sync::Arc;
use std::time::Instant;

use dpace_booking::engine::BookingEngine;
use dpace_booking::error::BookingError;
use dpace_booking::escalation;
use dpace_booking::records::{CarState, RenterState};
use dpace_protocol::clock::{Clock, ManualClock};
use dpace_protocol::config::{MIN_RENTER_DEPOSIT, POLICY_WINDOW_SECS};
use dpace_protocol::credential::RegistrationCredential;
use dpace_protocol::crypto::keys::DpaceKeypair;
use dpace_protocol::crypto::sha256;
use dpace_protocol::hashlock::{self, HashlockAuthorization};
use dpace_protocol::identity::PartyId;

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const ITALIC: &str = "\x1b[3m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";
const RED: &str = "\x1b[31m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    dPACE  --  Peer-to-Peer Car Booking, Interactive Demo           {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    Version 0.1.0  |  Ed25519 + SHA-256 hashlocks + Bech32          {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!(
        "{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]=============================================================={RESET}"
    );
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!(
        "{CYAN}------------------------------------------------------------------------{RESET}"
    );
}

fn subsection(text: &str) {
    println!("{DIM}{CYAN}  >> {text}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn rejected(text: &str) {
    println!("{RED}  [REJECTED] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

fn address_display(name: &str, addr: &str, color: &str) {
    let prefix = &addr[..6];
    let suffix = &addr[addr.len().saturating_sub(8)..];
    println!(
        "  {color}{BOLD}{name}{RESET}  {DIM}{prefix}...{suffix}{RESET}  {DIM}({} chars){RESET}",
        addr.len()
    );
}

fn state_row(name: &str, state: &str, color: &str) {
    println!("  {color}{BOLD}{name:<12}{RESET}  {WHITE}{state}{RESET}");
}

fn separator() {
    println!(
        "{DIM}{CYAN}  . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . {RESET}"
    );
}

fn show_states(engine: &BookingEngine, title: &str, renter: &PartyId, car: &PartyId) {
    println!();
    println!("  {BOLD}{WHITE}--- {title} ---{RESET}");
    let renter_state = engine
        .renter_state(renter)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unregistered".to_string());
    let car_state = engine
        .car_state(car)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unregistered".to_string());
    state_row("Alice", &renter_state, BLUE);
    state_row("Wagon", &car_state, GREEN);
    println!();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let demo_start = Instant::now();

    banner();

    // -----------------------------------------------------------------------
    // Step 1: Identity Creation
    // -----------------------------------------------------------------------

    section(1, "Party Identity Generation");
    subsection("Generating Ed25519 keypairs and deriving Bech32 addresses...");

    let t = Instant::now();
    let rsp_kp = DpaceKeypair::generate();
    let alice_kp = DpaceKeypair::generate();
    let wagon_kp = DpaceKeypair::generate();
    timing("keygen x3", t.elapsed());

    let alice_id = PartyId::from_public_key(&alice_kp.public_key());
    let wagon_id = PartyId::from_public_key(&wagon_kp.public_key());

    let alice_addr = alice_id.to_address();
    let wagon_addr = wagon_id.to_address();

    println!();
    address_display("Alice (renter)", &alice_addr, BLUE);
    address_display("Wagon (car)   ", &wagon_addr, GREEN);
    println!();

    let alice_recovered = PartyId::from_address(&alice_addr).unwrap();
    assert_eq!(alice_id, alice_recovered);
    success("All addresses start with 'dpace1' and pass Bech32 roundtrip verification");

    // -----------------------------------------------------------------------
    // Step 2: Engine Bootstrap + Registration
    // -----------------------------------------------------------------------

    section(2, "RSP Credentials & Registration");
    subsection("Booting the booking engine with a manual ledger clock...");

    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let mut engine = BookingEngine::new(rsp_kp.public_key(), clock.clone());
    info("Ledger time", &clock.now().to_string());

    subsection("RSP issues registration credentials to both parties...");
    let t = Instant::now();
    let alice_cred = RegistrationCredential::issue(b"driver's license #4821", &rsp_kp);
    let wagon_details = b"2021 compact wagon, silver, plate 7KPT210";
    let wagon_cred = RegistrationCredential::issue(wagon_details, &rsp_kp);
    timing("credential issuance x2", t.elapsed());

    engine
        .deploy_renter(&alice_id, &alice_cred, MIN_RENTER_DEPOSIT + 10)
        .unwrap();
    info(
        "Alice's deposit",
        &format!("{} (minimum: {})", MIN_RENTER_DEPOSIT + 10, MIN_RENTER_DEPOSIT),
    );
    engine
        .deploy_car(&wagon_id, wagon_details, &wagon_cred, 8)
        .unwrap();
    info("Wagon's price", "8 per time unit");

    show_states(&engine, "States After Registration", &alice_id, &wagon_id);
    success("Both parties registered with verified RSP credentials");

    // -----------------------------------------------------------------------
    // Step 3: Availability
    // -----------------------------------------------------------------------

    section(3, "Car Publishes Availability");
    subsection("The wagon generates a fresh availability token and parks...");

    let (_, token) = hashlock::generate();
    let events = engine
        .validate_car(&wagon_id, token, "lot B, level 2")
        .unwrap();

    info("Availability token", &token.to_hex()[..16]);
    info("Location", "lot B, level 2");
    info("Event emitted", &events[0].to_string());
    show_states(&engine, "States After Validation", &alice_id, &wagon_id);
    success("The wagon is bookable");

    // -----------------------------------------------------------------------
    // Step 4: Renter Booking
    // -----------------------------------------------------------------------

    section(4, "Renter Booking (Alice -> Wagon)");
    subsection("Alice hashes the token and collects the wagon's authorization...");

    let secret_link = sha256(token.as_bytes());
    let (_, wagon_commit) = hashlock::generate();
    let t = Instant::now();
    let wagon_auth = HashlockAuthorization::sign(&wagon_kp, alice_id.clone(), wagon_commit);
    timing("hashlock authorization sign", t.elapsed());

    engine
        .renter_booking(&alice_id, &wagon_id, secret_link, &wagon_auth)
        .unwrap();

    let booking = engine.booking(&alice_id, &wagon_id).unwrap();
    info("Booking ID", &booking.id.to_string());
    info("Created at", &booking.created_at.to_string());
    info(
        "Escalation deadline",
        &format!(
            "{} ({} s window)",
            booking.deadline, POLICY_WINDOW_SECS
        ),
    );
    show_states(&engine, "States After Renter Booking", &alice_id, &wagon_id);
    success("Booking created; the wagon's commitment is locked in");

    // -----------------------------------------------------------------------
    // Step 5: Car Confirmation
    // -----------------------------------------------------------------------

    section(5, "Car Confirmation (Wagon -> Alice)");
    subsection("The wagon collects Alice's authorization and hands over the keys...");

    let (_, alice_commit) = hashlock::generate();
    let alice_auth = HashlockAuthorization::sign(&alice_kp, wagon_id.clone(), alice_commit);
    engine
        .car_booking(&wagon_id, &alice_id, &alice_auth)
        .unwrap();

    show_states(&engine, "States After Confirmation", &alice_id, &wagon_id);
    success("The rental is underway; only a forced end can close it now");

    // -----------------------------------------------------------------------
    // Step 6: Premature Force-End (Rejected)
    // -----------------------------------------------------------------------

    section(6, "Premature Force-End Attempt");
    subsection("The wagon tries to end the rental immediately...");

    let (_, early_token) = hashlock::generate();
    let err = engine
        .force_end(&wagon_id, &alice_id, early_token, "depot")
        .unwrap_err();

    match &err {
        BookingError::PrematureForceEnd { deadline, now } => {
            rejected(&err.to_string());
            info(
                "Time remaining",
                &format!("{} s until the deadline", deadline - now),
            );
        }
        other => panic!("unexpected rejection: {other}"),
    }

    let booking = engine.booking(&alice_id, &wagon_id).unwrap();
    info(
        "Booking still live",
        &format!(
            "yes (remaining: {} s)",
            escalation::remaining_secs(booking, clock.now())
        ),
    );
    success("Every record is exactly as it was before the attempt");

    // -----------------------------------------------------------------------
    // Step 7: Escalation
    // -----------------------------------------------------------------------

    section(7, "Escalation: Past the Deadline");
    subsection("Fast-forwarding the ledger clock one full policy window...");

    clock.advance(POLICY_WINDOW_SECS);
    info("Ledger time", &clock.now().to_string());

    let (_, new_token) = hashlock::generate();
    let t = Instant::now();
    let events = engine
        .force_end(&wagon_id, &alice_id, new_token, "4th & Main")
        .unwrap();
    timing("force end", t.elapsed());

    info("Event emitted", &events[0].to_string());
    info("New token on record", &new_token.to_hex()[..16]);
    info("Final location", "4th & Main");

    separator();
    show_states(&engine, "Final States", &alice_id, &wagon_id);
    assert_eq!(engine.renter_state(&alice_id), Some(RenterState::Idle));
    assert_eq!(engine.car_state(&wagon_id), Some(CarState::Idle));
    assert_eq!(engine.booking_count(), 0);
    success("Booking destroyed; both parties are free to go around again");

    // -----------------------------------------------------------------------
    // Final Summary
    // -----------------------------------------------------------------------

    let total_elapsed = demo_start.elapsed();

    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    DEMO COMPLETE -- Final Summary                                  {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();

    println!("  {BOLD}{WHITE}Protocol Statistics:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    info("Identities created", "3 (RSP, Alice, Wagon)");
    info("Registrations", "1 renter + 1 car, both RSP-credentialed");
    info("Bookings", "1 created, 1 force-ended");
    info("Signing algorithm", "Ed25519 (ed25519-dalek 2.1)");
    info("Hash functions", "SHA-256 (commitments), BLAKE3 (identities)");
    info("Address format", "Bech32 with 'dpace' HRP");
    info(
        "Escalation window",
        &format!("{POLICY_WINDOW_SECS} s per booking"),
    );
    println!();
    println!(
        "  {ITALIC}{DIM}Every transition above was gated by a signature or a credential.{RESET}"
    );
    println!();
    println!(
        "  {BOLD}{GREEN}Total demo time: {:.2}s{RESET}",
        total_elapsed.as_secs_f64()
    );
    println!();
}
