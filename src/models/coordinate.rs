// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Validated WGS84 coordinate.

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A point in decimal degrees.
///
/// Construction always goes through [`Coordinate::new`], including serde
/// deserialization, so every instance satisfies the lat/lng range invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateInput")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ScoringError> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lng_ok = lng.is_finite() && (-180.0..=180.0).contains(&lng);
        if !lat_ok || !lng_ok {
            return Err(ScoringError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Point at fraction `t` of the straight line from `self` to `other`.
    ///
    /// `t` is clamped to [0, 1], so the result stays inside the valid range.
    pub fn lerp(&self, other: &Coordinate, t: f64) -> Coordinate {
        let t = t.clamp(0.0, 1.0);
        Coordinate {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Coord { x: c.lng, y: c.lat }
    }
}

/// Wire shape accepted on input; validated into [`Coordinate`].
///
/// Request bodies deserialize into this so a bad value surfaces as
/// `InvalidCoordinate` rather than a generic parse failure.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoordinateInput {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
}

impl TryFrom<CoordinateInput> for Coordinate {
    type Error = ScoringError;

    fn try_from(raw: CoordinateInput) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng)
    }
}
