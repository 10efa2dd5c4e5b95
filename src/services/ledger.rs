use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    passenger::{BookingStatus, NewPassenger, PaymentStatus},
    search::{TripSearch, DEFAULT_RADIUS_KM},
    trip::{NewTrip, Trip, TripStatus},
    validation::ValidationError,
};

use super::{
    seed::demo_trips,
    store::{DocumentStore, Filter, FilterOp, Sort, StoreError},
};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid {entity} id: {id:?}")]
    InvalidId { entity: &'static str, id: String },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("trip {trip_id} is full: {occupied} of {capacity} seats confirmed")]
    Capacity {
        trip_id: String,
        occupied: u32,
        capacity: u32,
    },
    #[error("cannot change {entity} status from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Per-trip async locks serialising read-modify-write cycles on one record.
#[derive(Clone, Default)]
struct TripLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl TripLocks {
    async fn acquire(&self, trip_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop locks nobody holds or waits on.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(trip_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Owns trip records and their embedded bookings.
#[derive(Clone)]
pub struct TripLedger {
    store: Arc<dyn DocumentStore>,
    locks: TripLocks,
    default_radius_km: f64,
}

impl TripLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            locks: TripLocks::default(),
            default_radius_km: DEFAULT_RADIUS_KM,
        }
    }

    pub fn with_default_radius(mut self, radius_km: f64) -> Self {
        self.default_radius_km = radius_km;
        self
    }

    pub async fn create_trip(&self, request: NewTrip) -> LedgerResult<Trip> {
        let trip = request.into_trip(Utc::now())?;
        let stored = self.insert(&trip).await?;
        info!(trip_id = %stored.id, driver = %stored.driver_name, "trip created");
        Ok(stored)
    }

    pub async fn get_trip(&self, trip_id: &str) -> LedgerResult<Trip> {
        let id = parse_id("trip", trip_id)?;
        self.load(&id).await
    }

    /// Every trip not cancelled, by departure date then time.
    pub async fn list_trips(&self) -> LedgerResult<Vec<Trip>> {
        let filter = Filter::all().with("status", FilterOp::Ne, TripStatus::Cancelled.as_str());
        let sort = Sort::none().asc("departureDate").asc("departureTime");
        self.find(&filter, &sort).await
    }

    pub async fn search_trips(&self, search: TripSearch) -> LedgerResult<Vec<Trip>> {
        let criteria = search.validate(self.default_radius_km)?;

        let mut filter =
            Filter::all().with("status", FilterOp::Eq, TripStatus::Scheduled.as_str());
        if let Some(place) = &criteria.from_place {
            filter = filter.with("from.place", FilterOp::ContainsIgnoreCase, place.as_str());
        }
        if let Some(place) = &criteria.to_place {
            filter = filter.with("to.place", FilterOp::ContainsIgnoreCase, place.as_str());
        }
        if let Some(day) = criteria.day {
            filter = filter
                .with("departureDate", FilterOp::Gte, day.start.to_rfc3339())
                .with("departureDate", FilterOp::Lt, day.end.to_rfc3339());
        }

        let mut trips = self
            .find(&filter, &Sort::none().asc("departureTime"))
            .await?;
        if criteria.has_proximity() {
            trips.retain(|trip| criteria.matches_proximity(&trip.from, &trip.to));
        }
        debug!(results = trips.len(), ?criteria, "trip search");
        Ok(trips)
    }

    /// Adds a pending booking. Pending bookings do not hold a seat; the
    /// capacity check that matters happens on confirmation.
    pub async fn book_seat(&self, trip_id: &str, request: NewPassenger) -> LedgerResult<Trip> {
        let booking = request.into_booking(Utc::now())?;
        let booking_id = booking.id.clone();
        let trip = self
            .mutate(trip_id, |trip| {
                if trip.status != TripStatus::Scheduled {
                    return Err(ValidationError::Rejected(format!(
                        "trip is {}, bookings are closed",
                        trip.status
                    ))
                    .into());
                }
                if trip.is_full() {
                    return Err(capacity_error(trip));
                }
                trip.passengers.push(booking);
                Ok(true)
            })
            .await?;
        info!(trip_id = %trip.id, passenger_id = %booking_id, "seat booked");
        Ok(trip)
    }

    pub async fn confirm_passenger(&self, trip_id: &str, passenger_id: &str) -> LedgerResult<Trip> {
        let passenger_id = parse_id("passenger", passenger_id)?;
        let trip = self
            .mutate(trip_id, |trip| {
                if trip.status.is_terminal() {
                    return Err(ValidationError::Rejected(format!(
                        "trip is {}, bookings cannot be confirmed",
                        trip.status
                    ))
                    .into());
                }
                let occupied = trip.occupied_seats();
                let capacity = trip.available_seats;
                let full = capacity_error(trip);
                let passenger = trip
                    .passenger_mut(&passenger_id)
                    .ok_or_else(|| not_found("passenger", &passenger_id))?;
                match passenger.status {
                    BookingStatus::Confirmed => Ok(false),
                    BookingStatus::Cancelled => Err(LedgerError::InvalidTransition {
                        entity: "passenger",
                        from: BookingStatus::Cancelled.to_string(),
                        to: BookingStatus::Confirmed.to_string(),
                    }),
                    BookingStatus::Pending if occupied >= capacity => Err(full),
                    BookingStatus::Pending => {
                        passenger.status = BookingStatus::Confirmed;
                        Ok(true)
                    }
                }
            })
            .await
            .inspect_err(|err| {
                if matches!(err, LedgerError::Capacity { .. }) {
                    warn!(%trip_id, %passenger_id, "confirmation rejected: {err}");
                }
            })?;
        info!(trip_id = %trip.id, %passenger_id, remaining = trip.remaining_seats(), "passenger confirmed");
        Ok(trip)
    }

    /// Idempotent: cancelling an already cancelled booking changes nothing.
    pub async fn cancel_passenger(&self, trip_id: &str, passenger_id: &str) -> LedgerResult<Trip> {
        let passenger_id = parse_id("passenger", passenger_id)?;
        let trip = self
            .mutate(trip_id, |trip| {
                let passenger = trip
                    .passenger_mut(&passenger_id)
                    .ok_or_else(|| not_found("passenger", &passenger_id))?;
                if passenger.status == BookingStatus::Cancelled {
                    return Ok(false);
                }
                passenger.status = BookingStatus::Cancelled;
                Ok(true)
            })
            .await?;
        info!(trip_id = %trip.id, %passenger_id, "passenger cancelled");
        Ok(trip)
    }

    pub async fn update_payment_status(
        &self,
        trip_id: &str,
        passenger_id: &str,
        next: PaymentStatus,
    ) -> LedgerResult<Trip> {
        let passenger_id = parse_id("passenger", passenger_id)?;
        self.mutate(trip_id, |trip| {
            let passenger = trip
                .passenger_mut(&passenger_id)
                .ok_or_else(|| not_found("passenger", &passenger_id))?;
            if !passenger.payment_status.can_transition_to(next) {
                return Err(LedgerError::InvalidTransition {
                    entity: "payment",
                    from: passenger.payment_status.to_string(),
                    to: next.to_string(),
                });
            }
            passenger.payment_status = next;
            Ok(true)
        })
        .await
    }

    pub async fn update_trip_status(&self, trip_id: &str, next: TripStatus) -> LedgerResult<Trip> {
        let trip = self
            .mutate(trip_id, |trip| {
                if !trip.status.can_transition_to(next) {
                    return Err(LedgerError::InvalidTransition {
                        entity: "trip",
                        from: trip.status.to_string(),
                        to: next.to_string(),
                    });
                }
                trip.status = next;
                Ok(true)
            })
            .await?;
        info!(trip_id = %trip.id, status = %trip.status, "trip status changed");
        Ok(trip)
    }

    /// Wipes every trip and loads the demonstration dataset.
    pub async fn seed_demo_trips(&self) -> LedgerResult<Vec<Trip>> {
        let removed = self.store.delete_many(&Filter::all()).await?;
        warn!(removed, "all trips deleted for demo seed");
        let now = Utc::now();
        let mut seeded = Vec::new();
        for request in demo_trips() {
            let trip = request.into_trip(now)?;
            seeded.push(self.insert(&trip).await?);
        }
        info!(count = seeded.len(), "demo trips seeded");
        Ok(seeded)
    }

    async fn mutate<F>(&self, trip_id: &str, change: F) -> LedgerResult<Trip>
    where
        F: FnOnce(&mut Trip) -> LedgerResult<bool>,
    {
        let id = parse_id("trip", trip_id)?;
        let _guard = self.locks.acquire(&id).await;
        let mut trip = self.load(&id).await?;
        if !change(&mut trip)? {
            return Ok(trip);
        }
        trip.touch(Utc::now());
        self.save(&trip).await
    }

    async fn load(&self, id: &str) -> LedgerResult<Trip> {
        let doc = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found("trip", id))?;
        decode(doc)
    }

    async fn find(&self, filter: &Filter, sort: &Sort) -> LedgerResult<Vec<Trip>> {
        self.store
            .find_many(filter, sort)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn insert(&self, trip: &Trip) -> LedgerResult<Trip> {
        let doc = serde_json::to_value(trip).map_err(StoreError::from)?;
        decode(self.store.insert(doc).await?)
    }

    async fn save(&self, trip: &Trip) -> LedgerResult<Trip> {
        let doc = serde_json::to_value(trip).map_err(StoreError::from)?;
        let stored = self
            .store
            .update_by_id(&trip.id, doc)
            .await?
            .ok_or_else(|| not_found("trip", &trip.id))?;
        decode(stored)
    }
}

fn decode(doc: Value) -> LedgerResult<Trip> {
    Ok(serde_json::from_value(doc).map_err(StoreError::from)?)
}

fn parse_id(entity: &'static str, raw: &str) -> LedgerResult<String> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| LedgerError::InvalidId {
            entity,
            id: raw.to_string(),
        })
}

fn not_found(entity: &'static str, id: &str) -> LedgerError {
    LedgerError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn capacity_error(trip: &Trip) -> LedgerError {
    LedgerError::Capacity {
        trip_id: trip.id.clone(),
        occupied: trip.occupied_seats(),
        capacity: trip.available_seats,
    }
}
