//! Conflict-checking booking engine.
//!
//! Each facility owns a table of 10080 weekly minute-slots; a slot is
//! either free or bound to exactly one booking id. A global index maps
//! booking ids to their bookings. Every mutation of a facility's slots
//! happens under that facility's mutex, so check-then-claim and
//! remove-then-rebook execute as single critical sections with respect to
//! other operations on the same facility.
//!
//! A booking's slot range is always fully claimed or fully absent; a slot
//! whose recorded occupant disagrees with the booking index is an internal
//! consistency fault and is surfaced, never repaired.

use std::collections::HashMap;
use std::sync::Arc;

use bookwire_protocol::{AvailabilitySnapshot, Booking, MINUTES_IN_WEEK};
use rand::Rng;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::error::{Result, ServerError};

/// Weekly slot table of one facility. Free slots hold `FREE`.
#[derive(Debug)]
struct SlotTable {
    slots: Vec<i32>,
}

const FREE: i32 = -1;

impl SlotTable {
    fn new() -> Self {
        Self {
            slots: vec![FREE; MINUTES_IN_WEEK as usize],
        }
    }

    fn range_free(&self, start: i32, end: i32) -> bool {
        self.slots[start as usize..end as usize]
            .iter()
            .all(|&occupant| occupant == FREE)
    }

    fn claim(&mut self, start: i32, end: i32, booking_id: i32) {
        for slot in &mut self.slots[start as usize..end as usize] {
            *slot = booking_id;
        }
    }

    /// Frees the booking's slots after verifying every one of them is
    /// bound to the booking. Verification runs before any slot is touched,
    /// so a diverged table is left as evidence.
    fn release(&mut self, booking: &Booking) -> Result<()> {
        let range = booking.start_minute as usize..booking.end_minute as usize;
        for (minute, &occupant) in (range.clone()).zip(self.slots[range.clone()].iter()) {
            if occupant != booking.id {
                return Err(ServerError::Inconsistency(format!(
                    "slot {minute} of facility {} belongs to booking {occupant} \
                     but the index claims booking {}",
                    booking.facility_id, booking.id
                )));
            }
        }
        for slot in &mut self.slots[range] {
            *slot = FREE;
        }
        Ok(())
    }

    fn snapshot(&self, facility_id: i32) -> AvailabilitySnapshot {
        let mut snapshot = AvailabilitySnapshot::new(facility_id);
        for (minute, &occupant) in self.slots.iter().enumerate() {
            if occupant != FREE {
                snapshot.set_booked(minute, true);
            }
        }
        snapshot
    }
}

#[derive(Debug, Default)]
pub struct BookingEngine {
    tables: RwLock<HashMap<i32, Arc<Mutex<SlotTable>>>>,
    bookings: RwLock<HashMap<i32, Booking>>,
}

impl BookingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes a facility's slot table. Idempotent.
    pub async fn add_facility(&self, facility_id: i32) {
        self.tables
            .write()
            .await
            .entry(facility_id)
            .or_insert_with(|| Arc::new(Mutex::new(SlotTable::new())));
    }

    /// Discards a facility's slot table and every booking on it.
    pub async fn drop_facility(&self, facility_id: i32) {
        self.tables.write().await.remove(&facility_id);
        self.bookings
            .write()
            .await
            .retain(|_, booking| booking.facility_id != facility_id);
    }

    async fn table(&self, facility_id: i32) -> Result<Arc<Mutex<SlotTable>>> {
        self.tables
            .read()
            .await
            .get(&facility_id)
            .cloned()
            .ok_or_else(|| {
                ServerError::UnavailableFacility(format!("no facility with id {facility_id}"))
            })
    }

    fn validate_range(start: i32, end: i32) -> Result<()> {
        if start < 0 || start >= end || end > MINUTES_IN_WEEK {
            return Err(ServerError::MalformedRequest(format!(
                "invalid time range [{start}, {end})"
            )));
        }
        Ok(())
    }

    /// True iff every slot in `[start, end)` of the facility is free.
    pub async fn check_availability(&self, facility_id: i32, start: i32, end: i32) -> Result<bool> {
        Self::validate_range(start, end)?;
        let table = self.table(facility_id).await?;
        let slots = table.lock().await;
        Ok(slots.range_free(start, end))
    }

    /// Books `[start, end)` on the facility, returning the new booking.
    /// A range conflict is a normal negative outcome reported as an
    /// unavailable-booking error, not an internal failure.
    pub async fn book(&self, facility_id: i32, start: i32, end: i32) -> Result<Booking> {
        Self::validate_range(start, end)?;
        let table = self.table(facility_id).await?;
        let mut slots = table.lock().await;
        if !slots.range_free(start, end) {
            debug!(facility_id, start, end, "booking conflict");
            return Err(ServerError::UnavailableBooking(format!(
                "facility {facility_id} is not available during [{start}, {end})"
            )));
        }

        let mut bookings = self.bookings.write().await;
        let id = Self::generate_booking_id(&bookings);
        let booking = Booking {
            id,
            facility_id,
            start_minute: start,
            end_minute: end,
        };
        slots.claim(start, end, id);
        bookings.insert(id, booking);
        info!(booking_id = id, facility_id, start, end, "booked");
        Ok(booking)
    }

    /// Shifts a booking by `offset` minutes, keeping its length.
    ///
    /// The old slot claims are released before the shifted range is
    /// claimed, inside one facility critical section. If the new range
    /// conflicts, the original booking is already gone: the caller gets an
    /// unavailable-booking error and no booking remains. This lossy
    /// behavior is deliberate and matches the service's documented
    /// semantics.
    pub async fn change(&self, booking_id: i32, offset: i32) -> Result<Booking> {
        self.rebook(booking_id, move |booking| Booking {
            start_minute: booking.start_minute + offset,
            end_minute: booking.end_minute + offset,
            ..booking
        })
        .await
    }

    /// Lengthens a booking by `offset` minutes (same lossy remove-then-
    /// rebook semantics as [`change`]).
    ///
    /// [`change`]: BookingEngine::change
    pub async fn extend(&self, booking_id: i32, offset: i32) -> Result<Booking> {
        self.rebook(booking_id, move |booking| Booking {
            end_minute: booking.end_minute + offset,
            ..booking
        })
        .await
    }

    async fn rebook<F>(&self, booking_id: i32, reshape: F) -> Result<Booking>
    where
        F: FnOnce(Booking) -> Booking,
    {
        let original = self.booking(booking_id).await?;
        let table = self.table(original.facility_id).await?;
        let mut slots = table.lock().await;
        let mut bookings = self.bookings.write().await;

        // Re-read under the locks; the booking may have gone meanwhile.
        let original = *bookings.get(&booking_id).ok_or_else(|| {
            ServerError::UnavailableBooking(format!("no booking with id {booking_id}"))
        })?;
        slots.release(&original)?;
        bookings.remove(&booking_id);

        let moved = reshape(original);
        if !moved.is_valid_range() {
            return Err(ServerError::UnavailableBooking(format!(
                "shifted range [{}, {}) leaves the bookable week",
                moved.start_minute, moved.end_minute
            )));
        }
        if !slots.range_free(moved.start_minute, moved.end_minute) {
            debug!(booking_id, "rebook conflict, original booking discarded");
            return Err(ServerError::UnavailableBooking(format!(
                "facility {} is not available during [{}, {})",
                moved.facility_id, moved.start_minute, moved.end_minute
            )));
        }
        slots.claim(moved.start_minute, moved.end_minute, moved.id);
        bookings.insert(moved.id, moved);
        info!(
            booking_id,
            start = moved.start_minute,
            end = moved.end_minute,
            "rebooked"
        );
        Ok(moved)
    }

    /// Removes a booking and frees its slots.
    pub async fn remove(&self, booking_id: i32) -> Result<()> {
        let booking = self.booking(booking_id).await?;
        let table = self.table(booking.facility_id).await?;
        let mut slots = table.lock().await;
        let mut bookings = self.bookings.write().await;

        let booking = *bookings.get(&booking_id).ok_or_else(|| {
            ServerError::UnavailableBooking(format!("no booking with id {booking_id}"))
        })?;
        if let Err(fault) = slots.release(&booking) {
            error!(%fault, booking_id, "slot table diverged from booking index");
            return Err(fault);
        }
        bookings.remove(&booking_id);
        Ok(())
    }

    pub async fn booking(&self, booking_id: i32) -> Result<Booking> {
        self.bookings
            .read()
            .await
            .get(&booking_id)
            .copied()
            .ok_or_else(|| {
                ServerError::UnavailableBooking(format!("no booking with id {booking_id}"))
            })
    }

    /// Full weekly occupancy vector of the facility, for monitoring pushes.
    pub async fn export_availability(&self, facility_id: i32) -> Result<AvailabilitySnapshot> {
        let table = self.table(facility_id).await?;
        let slots = table.lock().await;
        Ok(slots.snapshot(facility_id))
    }

    fn generate_booking_id(bookings: &HashMap<i32, Booking>) -> i32 {
        let mut rng = rand::thread_rng();
        loop {
            let id = rng.gen_range(1..=i32::MAX);
            if !bookings.contains_key(&id) {
                return id;
            }
        }
    }
}
