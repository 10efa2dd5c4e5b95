use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{
    location::{validate_location, Location, LocationInput},
    validation::{positive_amount, required_text, ValidationResult},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// pending -> paid -> refunded, or pending -> refunded. Refunded is final.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Pending, PaymentStatus::Refunded)
                | (PaymentStatus::Paid, PaymentStatus::Refunded)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A seat reservation embedded in its trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerBooking {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub pickup_location: Location,
    pub dropoff_location: Location,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub price: f64,
    pub payment_status: PaymentStatus,
}

impl PassengerBooking {
    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPassenger {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub pickup_location: Option<LocationInput>,
    pub dropoff_location: Option<LocationInput>,
    pub price: Option<f64>,
}

impl NewPassenger {
    /// Validates the request and builds a pending, unpaid booking.
    pub fn into_booking(self, now: DateTime<Utc>) -> ValidationResult<PassengerBooking> {
        Ok(PassengerBooking {
            id: Uuid::new_v4().to_string(),
            user_id: required_text(self.user_id, "userId")?,
            name: required_text(self.name, "name")?,
            pickup_location: validate_location(self.pickup_location, "pickupLocation")?,
            dropoff_location: validate_location(self.dropoff_location, "dropoffLocation")?,
            booking_date: now,
            status: BookingStatus::Pending,
            price: positive_amount(self.price, "price")?,
            payment_status: PaymentStatus::Pending,
        })
    }
}
