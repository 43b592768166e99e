// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Great-circle distance.

use crate::models::Coordinate;

/// Mean Earth radius used by all distance figures in the app.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres, rounded to 2 decimals.
///
/// This is the only place distances are rounded; everything downstream
/// (durations, emissions, points) works from the rounded value.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    round_km(haversine_km(a, b))
}

fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lng = (b.lng() - a.lng()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat().to_radians().cos() * b.lat().to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).max(0.0).sqrt())
}

fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}
