//! # Booking Store
//!
//! In-memory state for the booking engine: renter records, car records,
//! and live bookings. Bookings are keyed by the `(renter, car)` pair —
//! the protocol allows at most one live booking per party, so the
//! per-party lookups scan, which stays cheap at fleet scale.

use std::collections::HashMap;

use dpace_protocol::identity::PartyId;

use crate::records::{Booking, CarRecord, RenterRecord};

/// State storage for all registered parties and live bookings.
#[derive(Debug, Default)]
pub struct BookingStore {
    /// Renter records keyed by identity.
    renters: HashMap<PartyId, RenterRecord>,
    /// Car records keyed by identity.
    cars: HashMap<PartyId, CarRecord>,
    /// Live bookings keyed by `(renter, car)`.
    bookings: HashMap<(PartyId, PartyId), Booking>,
}

impl BookingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // -- renters --

    /// Retrieve the record for a renter.
    pub fn renter(&self, identity: &PartyId) -> Option<&RenterRecord> {
        self.renters.get(identity)
    }

    /// Retrieve a mutable reference to a renter record.
    pub fn renter_mut(&mut self, identity: &PartyId) -> Option<&mut RenterRecord> {
        self.renters.get_mut(identity)
    }

    /// Insert or replace a renter record.
    pub fn insert_renter(&mut self, record: RenterRecord) {
        self.renters.insert(record.identity.clone(), record);
    }

    /// Number of registered renters.
    pub fn renter_count(&self) -> usize {
        self.renters.len()
    }

    // -- cars --

    /// Retrieve the record for a car.
    pub fn car(&self, identity: &PartyId) -> Option<&CarRecord> {
        self.cars.get(identity)
    }

    /// Retrieve a mutable reference to a car record.
    pub fn car_mut(&mut self, identity: &PartyId) -> Option<&mut CarRecord> {
        self.cars.get_mut(identity)
    }

    /// Insert or replace a car record.
    pub fn insert_car(&mut self, record: CarRecord) {
        self.cars.insert(record.identity.clone(), record);
    }

    /// Number of registered cars.
    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    // -- bookings --

    /// Retrieve the booking between a specific renter and car.
    pub fn booking(&self, renter: &PartyId, car: &PartyId) -> Option<&Booking> {
        self.bookings.get(&(renter.clone(), car.clone()))
    }

    /// Retrieve the booking a renter currently holds, if any.
    pub fn booking_for_renter(&self, renter: &PartyId) -> Option<&Booking> {
        self.bookings.values().find(|b| b.renter == *renter)
    }

    /// Retrieve the booking a car is currently in, if any.
    pub fn booking_for_car(&self, car: &PartyId) -> Option<&Booking> {
        self.bookings.values().find(|b| b.car == *car)
    }

    /// Insert a booking under its `(renter, car)` key.
    pub fn insert_booking(&mut self, booking: Booking) {
        self.bookings
            .insert((booking.renter.clone(), booking.car.clone()), booking);
    }

    /// Remove and return the booking between a renter and car.
    pub fn remove_booking(&mut self, renter: &PartyId, car: &PartyId) -> Option<Booking> {
        self.bookings.remove(&(renter.clone(), car.clone()))
    }

    /// Number of live bookings.
    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    /// Iterate over all live bookings.
    pub fn bookings(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.values()
    }
}
