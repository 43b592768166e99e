// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generic per-mode CO2 estimates (kg per km).
//!
//! This table is the one used for route scoring. The national-rail figures in
//! [`crate::services::rail`] come from a different source and are kept apart.

use crate::models::TransportMode;

/// Factor for modes without a table entry.
pub const UNLISTED_MODE_KG_PER_KM: f64 = 0.1;

/// kg CO2 per km for a mode.
pub fn co2_per_km(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Car => 0.192,
        TransportMode::Bus => 0.089,
        TransportMode::Train => 0.041,
        TransportMode::Tram => 0.038,
        TransportMode::Ebike => 0.022,
        TransportMode::Scooter => 0.025,
        TransportMode::Bike | TransportMode::Walk => 0.0,
        TransportMode::Carpool => UNLISTED_MODE_KG_PER_KM,
    }
}

/// Emissions for travelling `distance_km` by `mode`.
pub fn emissions_kg(distance_km: f64, mode: TransportMode) -> f64 {
    distance_km.max(0.0) * co2_per_km(mode)
}

/// CO2 avoided compared with driving the same distance alone. Never negative.
pub fn co2_saved_kg(distance_km: f64, mode: TransportMode) -> f64 {
    (emissions_kg(distance_km, TransportMode::Car) - emissions_kg(distance_km, mode)).max(0.0)
}
