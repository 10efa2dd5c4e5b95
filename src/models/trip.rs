use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt;

use super::{
    location::{validate_location, Location, LocationInput},
    passenger::PassengerBooking,
    validation::{
        normalize_optional, positive_amount, required, required_text, ValidationError,
        ValidationResult,
    },
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "scheduled",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        matches!(
            (self, next),
            (TripStatus::Scheduled, TripStatus::InProgress)
                | (TripStatus::InProgress, TripStatus::Completed)
                | (TripStatus::Scheduled, TripStatus::Cancelled)
                | (TripStatus::InProgress, TripStatus::Cancelled)
        )
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Conversation {
    Quiet,
    Chatty,
    #[default]
    Depends,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LuggageSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub smoking: bool,
    pub pets: bool,
    pub music: bool,
    pub conversation: Conversation,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            smoking: false,
            pets: false,
            music: true,
            conversation: Conversation::Depends,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub driver_id: String,
    pub driver_name: String,
    pub from: Location,
    pub to: Location,
    pub departure_date: DateTime<Utc>,
    pub departure_time: String,
    pub estimated_arrival_time: Option<String>,
    #[serde(default)]
    pub route: Vec<Location>,
    pub available_seats: u32,
    pub price_per_seat: f64,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub license_plate: String,
    #[serde(default)]
    pub passengers: Vec<PassengerBooking>,
    #[serde(default)]
    pub preferences: Preferences,
    pub description: Option<String>,
    pub luggage_allowed: bool,
    pub max_luggage_size: LuggageSize,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn occupied_seats(&self) -> u32 {
        self.passengers.iter().filter(|p| p.is_confirmed()).count() as u32
    }

    pub fn remaining_seats(&self) -> i64 {
        i64::from(self.available_seats) - i64::from(self.occupied_seats())
    }

    pub fn is_full(&self) -> bool {
        self.occupied_seats() >= self.available_seats
    }

    pub fn passenger_mut(&mut self, passenger_id: &str) -> Option<&mut PassengerBooking> {
        self.passengers.iter_mut().find(|p| p.id == passenger_id)
    }

    /// Refreshes `updated_at`, never letting it fall behind `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    pub fn view(self) -> TripView {
        TripView::from(self)
    }
}

/// A trip as returned to clients, with seat availability computed on read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripView {
    #[serde(flatten)]
    pub trip: Trip,
    pub occupied_seats: u32,
    pub remaining_seats: i64,
}

impl From<Trip> for TripView {
    fn from(trip: Trip) -> Self {
        let occupied_seats = trip.occupied_seats();
        let remaining_seats = trip.remaining_seats();
        Self {
            trip,
            occupied_seats,
            remaining_seats,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub from: Option<LocationInput>,
    pub to: Option<LocationInput>,
    pub departure_date: Option<String>,
    pub departure_time: Option<String>,
    pub estimated_arrival_time: Option<String>,
    pub route: Option<Vec<LocationInput>>,
    pub available_seats: Option<i64>,
    pub price_per_seat: Option<f64>,
    pub vehicle_model: Option<String>,
    pub vehicle_color: Option<String>,
    pub license_plate: Option<String>,
    pub preferences: Option<Preferences>,
    pub description: Option<String>,
    pub luggage_allowed: Option<bool>,
    pub max_luggage_size: Option<LuggageSize>,
}

impl NewTrip {
    /// Validates the request and builds a scheduled trip with no passengers.
    pub fn into_trip(self, now: DateTime<Utc>) -> ValidationResult<Trip> {
        let route = self
            .route
            .unwrap_or_default()
            .into_iter()
            .map(|stop| stop.validate("route"))
            .collect::<ValidationResult<Vec<_>>>()?;

        let departure_date =
            parse_departure_date(&required_text(self.departure_date, "departureDate")?)?;
        let departure_time =
            parse_time_of_day(&required_text(self.departure_time, "departureTime")?, "departureTime")?;
        let estimated_arrival_time = normalize_optional(self.estimated_arrival_time);

        Ok(Trip {
            id: String::new(),
            driver_id: required_text(self.driver_id, "driverId")?,
            driver_name: required_text(self.driver_name, "driverName")?,
            from: validate_location(self.from, "from")?,
            to: validate_location(self.to, "to")?,
            departure_date,
            departure_time,
            estimated_arrival_time,
            route,
            available_seats: seat_capacity(self.available_seats)?,
            price_per_seat: positive_amount(self.price_per_seat, "pricePerSeat")?,
            vehicle_model: required_text(self.vehicle_model, "vehicleModel")?,
            vehicle_color: required_text(self.vehicle_color, "vehicleColor")?,
            license_plate: required_text(self.license_plate, "licensePlate")?,
            passengers: Vec::new(),
            preferences: self.preferences.unwrap_or_default(),
            description: normalize_optional(self.description),
            luggage_allowed: self.luggage_allowed.unwrap_or(true),
            max_luggage_size: self.max_luggage_size.unwrap_or_default(),
            status: TripStatus::Scheduled,
            created_at: now,
            updated_at: now,
        })
    }
}

fn seat_capacity(value: Option<i64>) -> ValidationResult<u32> {
    let seats = required(value, "availableSeats")?;
    if seats < 1 {
        return Err(ValidationError::NoSeats);
    }
    u32::try_from(seats).map_err(|_| ValidationError::Malformed {
        field: "availableSeats",
        expected: "seat count",
        value: seats.to_string(),
    })
}

/// Accepts a calendar date (`2025-04-23`, read as UTC midnight) or an RFC 3339 timestamp.
pub fn parse_departure_date(raw: &str) -> ValidationResult<DateTime<Utc>> {
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| ValidationError::Malformed {
            field: "departureDate",
            expected: "date",
            value: raw.to_string(),
        })
}

/// Normalises `H:MM` / `HH:MM` to zero-padded `HH:MM` so text order matches time order.
pub fn parse_time_of_day(raw: &str, field: &'static str) -> ValidationResult<String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|time| time.format("%H:%M").to_string())
        .map_err(|_| ValidationError::Malformed {
            field,
            expected: "HH:MM time",
            value: raw.to_string(),
        })
}
