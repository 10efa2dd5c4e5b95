use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};

use super::{
    location::Location,
    trip::parse_departure_date,
    validation::{normalize_optional, within, ValidationError, ValidationResult},
};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Raw search parameters as they arrive on the query string. Empty numeric
/// values (`fromLat=`) count as absent.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSearch {
    pub from_place: Option<String>,
    pub to_place: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub from_lat: Option<f64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub from_lng: Option<f64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub to_lat: Option<f64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub to_lng: Option<f64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }
}

impl From<&Location> for GeoPoint {
    fn from(location: &Location) -> Self {
        Self {
            lat: location.lat,
            lng: location.lng,
        }
    }
}

/// Half-open UTC window `[start, end)` covering one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn for_day(day: NaiveDate) -> Self {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    #[cfg(test)]
    fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Search parameters after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub from_place: Option<String>,
    pub to_place: Option<String>,
    pub day: Option<DayWindow>,
    pub near_from: Option<GeoPoint>,
    pub near_to: Option<GeoPoint>,
    pub radius_km: f64,
}

impl SearchCriteria {
    pub fn has_proximity(&self) -> bool {
        self.near_from.is_some() || self.near_to.is_some()
    }

    pub fn matches_proximity(&self, from: &Location, to: &Location) -> bool {
        let within_radius = |point: Option<GeoPoint>, location: &Location| {
            point
                .map(|p| p.distance_km(&GeoPoint::from(location)) <= self.radius_km)
                .unwrap_or(true)
        };
        within_radius(self.near_from, from) && within_radius(self.near_to, to)
    }
}

impl TripSearch {
    pub fn validate(self, default_radius_km: f64) -> ValidationResult<SearchCriteria> {
        let day = normalize_optional(self.date)
            .map(|raw| parse_departure_date(&raw).map(|ts| DayWindow::for_day(ts.date_naive())))
            .transpose()?;

        let radius_km = match self.radius {
            Some(r) if !r.is_finite() || r <= 0.0 => {
                return Err(ValidationError::NotPositive {
                    field: "radius",
                    value: r,
                })
            }
            Some(r) => r,
            None => default_radius_km,
        };

        let criteria = SearchCriteria {
            from_place: normalize_optional(self.from_place),
            to_place: normalize_optional(self.to_place),
            day,
            near_from: geo_point(self.from_lat, self.from_lng, "fromLat", "fromLng")?,
            near_to: geo_point(self.to_lat, self.to_lng, "toLat", "toLng")?,
            radius_km,
        };
        if self.radius.is_some() && !criteria.has_proximity() {
            return Err(ValidationError::Rejected(
                "radius needs fromLat/fromLng or toLat/toLng".into(),
            ));
        }
        Ok(criteria)
    }
}

fn geo_point(
    lat: Option<f64>,
    lng: Option<f64>,
    lat_field: &'static str,
    lng_field: &'static str,
) -> ValidationResult<Option<GeoPoint>> {
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => Ok(Some(GeoPoint {
            lat: within(lat, lat_field, -90.0, 90.0)?,
            lng: within(lng, lng_field, -180.0, 180.0)?,
        })),
        (Some(_), None) => Err(ValidationError::Missing(lng_field)),
        (None, Some(_)) => Err(ValidationError::Missing(lat_field)),
    }
}
