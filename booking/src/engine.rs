//! # Booking Engine
//!
//! The heart of the protocol: one engine instance holds every party record,
//! every live booking, and every open hashlock commitment, and drives them
//! through the booking choreography:
//!
//! 1. **Deploy** — renters register with an RSP credential and a deposit;
//!    cars register with an RSP credential and a listed price.
//! 2. **Validate** — a car publishes a fresh availability token and its
//!    location, becoming bookable.
//! 3. **Renter booking** — a renter presents the hash of the car's token
//!    plus the car's signed hashlock authorization; the car's commitment
//!    opens and the booking is created.
//! 4. **Car booking** — the car presents the renter's authorization; the
//!    renter's commitment opens and the rental is underway.
//! 5. **Cancel** — before the car confirms, either party may cancel with
//!    the counterparty's signed consent.
//! 6. **Force end** — once the escalation deadline passes, the car may
//!    unilaterally close the booking and record where the car ended up.
//!
//! Every operation runs in two phases: a validate phase of cheapest-first
//! checks that can reject, then a commit phase that only touches records
//! whose existence the validate phase already established. A rejected
//! operation leaves no partial writes behind.
//!
//! The caller identity passed to each operation is the authenticated
//! transport identity — impersonation is the transport layer's problem,
//! so a wrong caller here surfaces as a state mismatch, never as a
//! signature failure.

use std::sync::Arc;

use dpace_protocol::clock::Clock;
use dpace_protocol::config::MIN_RENTER_DEPOSIT;
use dpace_protocol::credential::{self, RegistrationCredential};
use dpace_protocol::crypto::hash::{sha256, Digest};
use dpace_protocol::crypto::keys::DpacePublicKey;
use dpace_protocol::hashlock::{Commitment, HashlockAuthorization, HashlockManager};
use dpace_protocol::identity::PartyId;

use crate::error::BookingError;
use crate::escalation;
use crate::events::BookingEvent;
use crate::records::{Booking, CarRecord, CarState, RenterRecord, RenterState};
use crate::store::BookingStore;

/// State name reported for parties with no record at all.
const UNREGISTERED: &str = "unregistered";

/// The booking engine: party records, live bookings, open commitments,
/// and the RSP key that every registration credential must verify against.
pub struct BookingEngine {
    store: BookingStore,
    hashlocks: HashlockManager,
    rsp_key: DpacePublicKey,
    clock: Arc<dyn Clock>,
}

impl BookingEngine {
    /// Creates an engine trusting `rsp_key` for registrations and reading
    /// ledger time from `clock`.
    pub fn new(rsp_key: DpacePublicKey, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: BookingStore::new(),
            hashlocks: HashlockManager::new(),
            rsp_key,
            clock,
        }
    }

    /// Convenience constructor reading wall-clock time.
    pub fn with_system_clock(rsp_key: DpacePublicKey) -> Self {
        Self::new(rsp_key, Arc::new(dpace_protocol::clock::SystemClock))
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Registers a renter with an RSP credential and an escrow deposit.
    ///
    /// The renter lands in `AwaitingCar`, free to book immediately. A renter
    /// may re-register to refresh its deposit at any point except while it
    /// holds a live booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InsufficientDeposit`] if the deposit is below
    /// the protocol minimum, [`BookingError::InvalidCredential`] if the
    /// credential does not verify against the RSP key, and
    /// [`BookingError::StateMismatch`] if the renter is currently `Booked`.
    pub fn deploy_renter(
        &mut self,
        caller: &PartyId,
        credential: &RegistrationCredential,
        deposit: u64,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        // 1. Deposit floor -- the cheapest check.
        if deposit < MIN_RENTER_DEPOSIT {
            return Err(BookingError::InsufficientDeposit {
                provided: deposit,
                minimum: MIN_RENTER_DEPOSIT,
            });
        }

        // 2. The credential must carry a valid RSP signature.
        if !credential.verify(&self.rsp_key) {
            return Err(BookingError::InvalidCredential);
        }

        // 3. A booked renter cannot re-register out from under its booking.
        if let Some(existing) = self.store.renter(caller) {
            if existing.state == RenterState::Booked {
                return Err(BookingError::StateMismatch {
                    party: caller.clone(),
                    expected: "Idle or AwaitingCar".to_string(),
                    found: RenterState::Booked.to_string(),
                });
            }
        }

        self.store
            .insert_renter(RenterRecord::new(caller.clone(), deposit));
        Ok(vec![])
    }

    /// Registers a car with an RSP credential over its listing details and
    /// a listed price per time unit. The car lands in `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DuplicateRegistration`] if the identity is
    /// already registered as a car, and [`BookingError::InvalidCredential`]
    /// if the credential was not issued by the RSP over exactly `details`.
    pub fn deploy_car(
        &mut self,
        caller: &PartyId,
        details: &[u8],
        credential: &RegistrationCredential,
        price_per_unit: u64,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        // 1. Cars register exactly once.
        if self.store.car(caller).is_some() {
            return Err(BookingError::DuplicateRegistration {
                identity: caller.clone(),
            });
        }

        // 2. The credential must bind these details to the RSP's signature.
        if !credential::verify_registration(details, credential, &self.rsp_key) {
            return Err(BookingError::InvalidCredential);
        }

        self.store.insert_car(CarRecord::new(
            caller.clone(),
            sha256(details),
            price_per_unit,
        ));
        Ok(vec![])
    }

    // -----------------------------------------------------------------------
    // Availability
    // -----------------------------------------------------------------------

    /// Publishes a car's availability token and location, making it bookable.
    ///
    /// Emits [`BookingEvent::CarAvailable`] for renters watching the network.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::StateMismatch`] unless the caller is a
    /// registered car in `Idle`.
    pub fn validate_car(
        &mut self,
        caller: &PartyId,
        token: Digest,
        location: &str,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        // 1. Only a registered, idle car can publish availability.
        let state = match self.store.car(caller) {
            Some(car) => car.state,
            None => {
                return Err(BookingError::StateMismatch {
                    party: caller.clone(),
                    expected: CarState::Idle.to_string(),
                    found: UNREGISTERED.to_string(),
                })
            }
        };
        if state != CarState::Idle {
            return Err(BookingError::StateMismatch {
                party: caller.clone(),
                expected: CarState::Idle.to_string(),
                found: state.to_string(),
            });
        }

        if let Some(car) = self.store.car_mut(caller) {
            car.current_token = Some(token);
            car.current_location = Some(location.to_string());
            car.state = CarState::Available;
        }

        Ok(vec![BookingEvent::CarAvailable {
            car: caller.clone(),
            token,
        }])
    }

    // -----------------------------------------------------------------------
    // Booking
    // -----------------------------------------------------------------------

    /// Books an available car on behalf of a renter.
    ///
    /// The renter proves it has seen the car's availability token by
    /// presenting its SHA-256 (`secret_link`), and forwards the car's
    /// signed hashlock authorization. The car's commitment opens, the
    /// renter moves to `Booked`, the car to `Reserved`, and a booking with
    /// a fixed escalation deadline is created.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::StateMismatch`] unless the renter is
    /// `AwaitingCar` and the car `Available`, [`BookingError::TokenMismatch`]
    /// if `secret_link` does not hash-match the published token,
    /// [`BookingError::Unauthorized`] if the authorization is not the car's
    /// signature addressed to this renter, and
    /// [`BookingError::DuplicateCommitment`] if the car already holds an
    /// unconsumed commitment.
    pub fn renter_booking(
        &mut self,
        caller: &PartyId,
        car_id: &PartyId,
        secret_link: Digest,
        authorization: &HashlockAuthorization,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        // 1. The renter must be registered and free to book.
        let renter_state = match self.store.renter(caller) {
            Some(renter) => renter.state,
            None => {
                return Err(BookingError::StateMismatch {
                    party: caller.clone(),
                    expected: RenterState::AwaitingCar.to_string(),
                    found: UNREGISTERED.to_string(),
                })
            }
        };
        if renter_state != RenterState::AwaitingCar {
            return Err(BookingError::StateMismatch {
                party: caller.clone(),
                expected: RenterState::AwaitingCar.to_string(),
                found: renter_state.to_string(),
            });
        }

        // 2. The car must be registered and currently offered.
        let (car_state, current_token) = match self.store.car(car_id) {
            Some(car) => (car.state, car.current_token),
            None => {
                return Err(BookingError::StateMismatch {
                    party: car_id.clone(),
                    expected: CarState::Available.to_string(),
                    found: UNREGISTERED.to_string(),
                })
            }
        };
        if car_state != CarState::Available {
            return Err(BookingError::StateMismatch {
                party: car_id.clone(),
                expected: CarState::Available.to_string(),
                found: car_state.to_string(),
            });
        }

        // 3. The secret link must be the hash of the published token.
        let link_matches = current_token
            .map(|token| sha256(token.as_bytes()) == secret_link)
            .unwrap_or(false);
        if !link_matches {
            return Err(BookingError::TokenMismatch);
        }

        // 4. The authorization must be the car's, addressed to this renter.
        if authorization.sender() != *car_id || authorization.destination != *caller {
            return Err(BookingError::Unauthorized {
                party: car_id.clone(),
            });
        }

        // 5. One unconsumed commitment per party.
        if self.hashlocks.has(car_id) {
            return Err(BookingError::DuplicateCommitment {
                owner: car_id.clone(),
            });
        }

        // 6. The signature must verify over the commitment being opened.
        let now = self.clock.now();
        let commitment = Commitment::new(car_id.clone(), authorization.content, now);
        if !commitment.authorized_by(authorization) {
            return Err(BookingError::Unauthorized {
                party: car_id.clone(),
            });
        }

        // All checks passed -- open the commitment and link the booking.
        self.hashlocks.commit(commitment)?;
        if let Some(renter) = self.store.renter_mut(caller) {
            renter.state = RenterState::Booked;
        }
        if let Some(car) = self.store.car_mut(car_id) {
            car.state = CarState::Reserved;
        }
        self.store.insert_booking(Booking::new(
            caller.clone(),
            car_id.clone(),
            secret_link,
            now,
        ));
        Ok(vec![])
    }

    /// Confirms a reserved booking on behalf of the car.
    ///
    /// The car forwards the renter's signed hashlock authorization; the
    /// renter's commitment opens and the car moves to `InUse`. From here
    /// the booking can only end by forced termination.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::StateMismatch`] unless the caller is the
    /// `Reserved` car booked by a `Booked` renter,
    /// [`BookingError::Unauthorized`] if the authorization is not the
    /// renter's signature addressed to this car, and
    /// [`BookingError::DuplicateCommitment`] if the renter already holds an
    /// unconsumed commitment.
    pub fn car_booking(
        &mut self,
        caller: &PartyId,
        renter_id: &PartyId,
        authorization: &HashlockAuthorization,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        // 1. The caller must be a reserved car.
        let car_state = match self.store.car(caller) {
            Some(car) => car.state,
            None => {
                return Err(BookingError::StateMismatch {
                    party: caller.clone(),
                    expected: CarState::Reserved.to_string(),
                    found: UNREGISTERED.to_string(),
                })
            }
        };
        if car_state != CarState::Reserved {
            return Err(BookingError::StateMismatch {
                party: caller.clone(),
                expected: CarState::Reserved.to_string(),
                found: car_state.to_string(),
            });
        }

        // 2. The named renter must be booked -- with this car specifically.
        let renter_state = match self.store.renter(renter_id) {
            Some(renter) => renter.state,
            None => {
                return Err(BookingError::StateMismatch {
                    party: renter_id.clone(),
                    expected: RenterState::Booked.to_string(),
                    found: UNREGISTERED.to_string(),
                })
            }
        };
        if renter_state != RenterState::Booked {
            return Err(BookingError::StateMismatch {
                party: renter_id.clone(),
                expected: RenterState::Booked.to_string(),
                found: renter_state.to_string(),
            });
        }
        if self.store.booking(renter_id, caller).is_none() {
            return Err(BookingError::StateMismatch {
                party: renter_id.clone(),
                expected: format!("booked with {}", caller),
                found: "no booking".to_string(),
            });
        }

        // 3. The authorization must be the renter's, addressed to this car.
        if authorization.sender() != *renter_id || authorization.destination != *caller {
            return Err(BookingError::Unauthorized {
                party: renter_id.clone(),
            });
        }

        // 4. One unconsumed commitment per party.
        if self.hashlocks.has(renter_id) {
            return Err(BookingError::DuplicateCommitment {
                owner: renter_id.clone(),
            });
        }

        // 5. The signature must verify over the commitment being opened.
        let now = self.clock.now();
        let commitment = Commitment::new(renter_id.clone(), authorization.content, now);
        if !commitment.authorized_by(authorization) {
            return Err(BookingError::Unauthorized {
                party: renter_id.clone(),
            });
        }

        self.hashlocks.commit(commitment)?;
        if let Some(car) = self.store.car_mut(caller) {
            car.state = CarState::InUse;
        }
        Ok(vec![])
    }

    // -----------------------------------------------------------------------
    // Termination
    // -----------------------------------------------------------------------

    /// Cancels a booking by mutual consent.
    ///
    /// Either party may call, presenting the counterparty's signed
    /// authorization addressed to the caller — one party cannot cancel on
    /// its own signature. Cancellation is only open while the renter is
    /// `Booked` and the car `Reserved`; once the car confirms, the booking
    /// runs until a forced end.
    ///
    /// On success the renter returns to `Idle`, the car to `Available`
    /// (its published token stays live), the booking is destroyed and both
    /// parties' commitments are consumed.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::StateMismatch`] if the caller has no live
    /// booking or the cancellation window has closed, and
    /// [`BookingError::Unauthorized`] if the authorization is not the
    /// counterparty's signature addressed to the caller.
    pub fn cancel_booking(
        &mut self,
        caller: &PartyId,
        authorization: &HashlockAuthorization,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        // 1. The caller must be a party to a live booking.
        let found = match self
            .store
            .booking_for_renter(caller)
            .or_else(|| self.store.booking_for_car(caller))
        {
            Some(booking) => (booking.renter.clone(), booking.car.clone()),
            None => {
                return Err(BookingError::StateMismatch {
                    party: caller.clone(),
                    expected: "Booked or Reserved".to_string(),
                    found: self.found_state(caller),
                })
            }
        };
        let (renter_id, car_id) = found;

        // 2. The cancellation window: renter still Booked, car still Reserved.
        let renter_state = self.store.renter(&renter_id).map(|r| r.state);
        if renter_state != Some(RenterState::Booked) {
            return Err(BookingError::StateMismatch {
                party: renter_id.clone(),
                expected: RenterState::Booked.to_string(),
                found: self.found_state(&renter_id),
            });
        }
        let car_state = self.store.car(&car_id).map(|c| c.state);
        if car_state != Some(CarState::Reserved) {
            return Err(BookingError::StateMismatch {
                party: car_id.clone(),
                expected: CarState::Reserved.to_string(),
                found: self.found_state(&car_id),
            });
        }

        // 3. The counterparty must have signed off, addressed to the caller.
        let counterparty = if *caller == renter_id {
            car_id.clone()
        } else {
            renter_id.clone()
        };
        if authorization.sender() != counterparty || authorization.destination != *caller {
            return Err(BookingError::Unauthorized {
                party: counterparty,
            });
        }

        // 4. Verify against the counterparty's open commitment when one
        //    exists (it pins the digest); otherwise the message must at
        //    least verify over its own content.
        let authorized = if self.hashlocks.has(&counterparty) {
            self.hashlocks.authorize(&counterparty, authorization)
        } else {
            authorization.verify_signature()
        };
        if !authorized {
            return Err(BookingError::Unauthorized {
                party: counterparty,
            });
        }

        if let Some(renter) = self.store.renter_mut(&renter_id) {
            renter.state = RenterState::Idle;
        }
        if let Some(car) = self.store.car_mut(&car_id) {
            car.state = CarState::Available;
        }
        self.store.remove_booking(&renter_id, &car_id);
        self.hashlocks.consume(&renter_id);
        self.hashlocks.consume(&car_id);
        Ok(vec![])
    }

    /// Force-ends a booking past its escalation deadline.
    ///
    /// Only the booked car may call, from `Reserved` or `InUse`, and only
    /// once the deadline has been reached (the deadline itself counts).
    /// The car records a fresh token and its final location, both parties
    /// return to `Idle`, the booking is destroyed and both commitments are
    /// consumed. Emits [`BookingEvent::ForcedEnd`].
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PrematureForceEnd`] before the deadline —
    /// with every record left exactly as it was — and
    /// [`BookingError::StateMismatch`] if the caller is not the booked car
    /// or the named renter does not hold the booking.
    pub fn force_end(
        &mut self,
        caller: &PartyId,
        renter_id: &PartyId,
        new_token: Digest,
        new_location: &str,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        // 1. The caller must be a registered car inside a booking.
        let car_state = match self.store.car(caller) {
            Some(car) => car.state,
            None => {
                return Err(BookingError::StateMismatch {
                    party: caller.clone(),
                    expected: "Reserved or InUse".to_string(),
                    found: UNREGISTERED.to_string(),
                })
            }
        };
        if car_state != CarState::Reserved && car_state != CarState::InUse {
            return Err(BookingError::StateMismatch {
                party: caller.clone(),
                expected: "Reserved or InUse".to_string(),
                found: car_state.to_string(),
            });
        }

        // 2. The named renter must hold the booking with this car.
        if self.store.renter(renter_id).is_none() {
            return Err(BookingError::StateMismatch {
                party: renter_id.clone(),
                expected: RenterState::Booked.to_string(),
                found: UNREGISTERED.to_string(),
            });
        }
        let booking = match self.store.booking(renter_id, caller) {
            Some(booking) => booking,
            None => {
                return Err(BookingError::StateMismatch {
                    party: renter_id.clone(),
                    expected: format!("booked with {}", caller),
                    found: "no booking".to_string(),
                })
            }
        };

        // 3. The escalation deadline must have been reached. Nothing has
        //    been written yet, so a premature attempt changes nothing.
        let now = self.clock.now();
        if !escalation::is_expired(booking, now) {
            return Err(BookingError::PrematureForceEnd {
                deadline: booking.deadline,
                now,
            });
        }

        if let Some(car) = self.store.car_mut(caller) {
            car.state = CarState::Idle;
            car.current_token = Some(new_token);
            car.current_location = Some(new_location.to_string());
        }
        if let Some(renter) = self.store.renter_mut(renter_id) {
            renter.state = RenterState::Idle;
        }
        self.store.remove_booking(renter_id, caller);
        self.hashlocks.consume(renter_id);
        self.hashlocks.consume(caller);

        Ok(vec![BookingEvent::ForcedEnd {
            renter: renter_id.clone(),
            car: caller.clone(),
            new_token,
            new_location: new_location.to_string(),
        }])
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The lifecycle state of a renter, if registered.
    pub fn renter_state(&self, identity: &PartyId) -> Option<RenterState> {
        self.store.renter(identity).map(|r| r.state)
    }

    /// The lifecycle state of a car, if registered.
    pub fn car_state(&self, identity: &PartyId) -> Option<CarState> {
        self.store.car(identity).map(|c| c.state)
    }

    /// The full record of a renter.
    pub fn renter(&self, identity: &PartyId) -> Option<&RenterRecord> {
        self.store.renter(identity)
    }

    /// The full record of a car.
    pub fn car(&self, identity: &PartyId) -> Option<&CarRecord> {
        self.store.car(identity)
    }

    /// The live booking between a renter and a car, if any.
    pub fn booking(&self, renter: &PartyId, car: &PartyId) -> Option<&Booking> {
        self.store.booking(renter, car)
    }

    /// Iterates over every live booking.
    pub fn active_bookings(&self) -> impl Iterator<Item = &Booking> {
        self.store.bookings()
    }

    /// Number of registered renters.
    pub fn renter_count(&self) -> usize {
        self.store.renter_count()
    }

    /// Number of registered cars.
    pub fn car_count(&self) -> usize {
        self.store.car_count()
    }

    /// Number of live bookings.
    pub fn booking_count(&self) -> usize {
        self.store.booking_count()
    }

    /// Ledger time as the engine sees it.
    pub fn now(&self) -> dpace_protocol::clock::Timestamp {
        self.clock.now()
    }

    /// The display state of any party, for error reporting.
    fn found_state(&self, party: &PartyId) -> String {
        if let Some(renter) = self.store.renter(party) {
            return renter.state.to_string();
        }
        if let Some(car) = self.store.car(party) {
            return car.state.to_string();
        }
        UNREGISTERED.to_string()
    }
}
