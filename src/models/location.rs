use serde::{Deserialize, Serialize};

use super::validation::{required, required_text, within, ValidationResult};

/// A named place with WGS84 coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub place: String,
    pub lat: f64,
    pub lng: f64,
}

/// Location as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationInput {
    pub place: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationInput {
    pub fn new(place: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            place: Some(place.into()),
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    pub fn validate(self, field: &'static str) -> ValidationResult<Location> {
        let place = required_text(self.place, place_field(field))?;
        let lat = within(required(self.lat, lat_field(field))?, lat_field(field), -90.0, 90.0)?;
        let lng = within(
            required(self.lng, lng_field(field))?,
            lng_field(field),
            -180.0,
            180.0,
        )?;
        Ok(Location { place, lat, lng })
    }
}

pub fn validate_location(
    input: Option<LocationInput>,
    field: &'static str,
) -> ValidationResult<Location> {
    required(input, field)?.validate(field)
}

fn place_field(field: &'static str) -> &'static str {
    match field {
        "from" => "from.place",
        "to" => "to.place",
        "pickupLocation" => "pickupLocation.place",
        "dropoffLocation" => "dropoffLocation.place",
        "route" => "route.place",
        _ => "place",
    }
}

fn lat_field(field: &'static str) -> &'static str {
    match field {
        "from" => "from.lat",
        "to" => "to.lat",
        "pickupLocation" => "pickupLocation.lat",
        "dropoffLocation" => "dropoffLocation.lat",
        "route" => "route.lat",
        _ => "lat",
    }
}

fn lng_field(field: &'static str) -> &'static str {
    match field {
        "from" => "from.lng",
        "to" => "to.lng",
        "pickupLocation" => "pickupLocation.lng",
        "dropoffLocation" => "dropoffLocation.lng",
        "route" => "route.lng",
        _ => "lng",
    }
}
