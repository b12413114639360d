use std::{fmt, str::FromStr};

use thiserror::Error;

const LAT_DEG_MAX: f64 = 90.0;
const LAT_DEG_MIN: f64 = -90.0;
const LNG_DEG_MAX: f64 = 180.0;
const LNG_DEG_MIN: f64 = -180.0;

/// A geographical position in degrees (WGS 84).
///
/// Positions are plain values: a new interaction produces a new
/// coordinate instead of mutating an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub const fn from_lat_lng_deg(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn try_from_lat_lng_deg(lat: f64, lng: f64) -> Option<Self> {
        let pos = Self::from_lat_lng_deg(lat, lng);
        pos.is_valid().then_some(pos)
    }

    pub const fn lat(self) -> f64 {
        self.lat
    }

    pub const fn lng(self) -> f64 {
        self.lng
    }

    pub fn is_valid(self) -> bool {
        (LAT_DEG_MIN..=LAT_DEG_MAX).contains(&self.lat)
            && (LNG_DEG_MIN..=LNG_DEG_MAX).contains(&self.lng)
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(from: Coordinate) -> Self {
        (from.lat, from.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid coordinate: {0}")]
pub struct InvalidCoordinate(String);

impl FromStr for Coordinate {
    type Err = InvalidCoordinate;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCoordinate(s.to_string());
        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat = lat.trim().parse().map_err(|_| invalid())?;
        let lng = lng.trim().parse().map_err(|_| invalid())?;
        Self::try_from_lat_lng_deg(lat, lng).ok_or_else(invalid)
    }
}
