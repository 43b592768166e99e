// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip → points conversion.

use crate::models::{RouteCandidate, TransportMode};

/// Base points per kilometre before multipliers.
pub const POINTS_PER_KM: f64 = 10.0;

/// Multiplier rewarding lower-emission modes.
pub fn mode_bonus(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Walk => 2.0,
        TransportMode::Bike => 1.8,
        TransportMode::Ebike => 1.5,
        TransportMode::Scooter => 1.3,
        TransportMode::Bus | TransportMode::Tram => 1.2,
        TransportMode::Train => 1.1,
        TransportMode::Carpool => 0.8,
        TransportMode::Car => 0.3,
    }
}

fn unrounded_points(distance_km: f64, eco_score: f64, mode: TransportMode) -> f64 {
    let distance_km = if distance_km.is_finite() {
        distance_km.max(0.0)
    } else {
        0.0
    };
    let eco_score = if eco_score.is_finite() {
        eco_score.clamp(0.0, 100.0)
    } else {
        0.0
    };
    distance_km * POINTS_PER_KM * (1.0 + eco_score / 100.0) * mode_bonus(mode)
}

/// Points for a single-mode trip.
///
/// Out-of-range inputs are clamped (distance to >= 0, eco-score to 0..=100),
/// which keeps the result monotonic in both.
pub fn calculate_points(distance_km: f64, eco_score: f64, mode: TransportMode) -> u32 {
    // f64::round rounds half away from zero; inputs are non-negative here
    unrounded_points(distance_km, eco_score, mode).round() as u32
}

/// Points for a candidate, summing each leg with its own mode bonus.
///
/// Single-leg candidates give exactly [`calculate_points`].
pub fn route_points(candidate: &RouteCandidate) -> u32 {
    let eco_score = f64::from(candidate.eco_score);
    let total: f64 = if candidate.legs.is_empty() {
        candidate
            .mode_sequence
            .first()
            .map(|&mode| unrounded_points(candidate.distance_km, eco_score, mode))
            .unwrap_or(0.0)
    } else {
        candidate
            .legs
            .iter()
            .map(|leg| unrounded_points(leg.distance_km, eco_score, leg.mode))
            .sum()
    };
    total.round() as u32
}
