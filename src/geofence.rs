//! Geofence matching for clock actions.
//!
//! Everything here is pure: callers fetch the active locations and hand them in.

use serde::Serialize;
use thiserror::Error;

use crate::database::models::Location;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("Coordinates must be finite numbers")]
    NonFinite,

    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A validated WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Great-circle distance in meters between two points.
pub fn haversine_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let half_dlat = (lat_b - lat_a) / 2.0;
    let half_dlng = (b.longitude - a.longitude).to_radians() / 2.0;

    let h = half_dlat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_dlng.sin().powi(2);

    // Rounding can push h a hair past 1 for antipodal points.
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeofenceMatch<'a> {
    /// The point lies within this location's radius; it was the nearest such location.
    Inside {
        location: &'a Location,
        distance_meters: f64,
    },
    /// No geofence contained the point; this is the first ADHOC template.
    Adhoc(&'a Location),
    Unmatched,
}

impl<'a> GeofenceMatch<'a> {
    /// Location id to store on a shift. ADHOC shifts carry none.
    pub fn location_id(&self) -> Option<i64> {
        match self {
            GeofenceMatch::Inside { location, .. } => Some(location.id),
            GeofenceMatch::Adhoc(_) | GeofenceMatch::Unmatched => None,
        }
    }

    pub fn is_adhoc(&self) -> bool {
        !matches!(self, GeofenceMatch::Inside { .. })
    }

    pub fn location(&self) -> Option<&'a Location> {
        match self {
            GeofenceMatch::Inside { location, .. } => Some(location),
            GeofenceMatch::Adhoc(_) | GeofenceMatch::Unmatched => None,
        }
    }

    pub fn distance_meters(&self) -> Option<f64> {
        match self {
            GeofenceMatch::Inside {
                distance_meters, ..
            } => Some(*distance_meters),
            GeofenceMatch::Adhoc(_) | GeofenceMatch::Unmatched => None,
        }
    }
}

/// Finds the nearest location whose geofence contains `point`.
///
/// Only locations with a positive radius take part in distance matching; the
/// first one found wins a tie. When nothing contains the point, the first
/// location with a zero (or negative) radius is returned as the ADHOC template.
pub fn match_location<'a>(point: Coordinates, locations: &'a [Location]) -> GeofenceMatch<'a> {
    let mut best: Option<(&'a Location, f64)> = None;

    for location in locations.iter().filter(|l| l.radius_meters > 0.0) {
        let Ok(center) = Coordinates::new(location.latitude, location.longitude) else {
            log::warn!(
                "Skipping location {} with invalid center ({}, {})",
                location.id,
                location.latitude,
                location.longitude
            );
            continue;
        };

        let distance = haversine_meters(point, center);
        if distance > location.radius_meters {
            continue;
        }

        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((location, distance)),
        }
    }

    if let Some((location, distance_meters)) = best {
        return GeofenceMatch::Inside {
            location,
            distance_meters,
        };
    }

    locations
        .iter()
        .find(|l| l.is_adhoc_template())
        .map_or(GeofenceMatch::Unmatched, GeofenceMatch::Adhoc)
}
