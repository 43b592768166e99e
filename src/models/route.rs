// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route candidates and completed trips.

use crate::models::{Coordinate, TransportMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One leg of a candidate route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RouteLeg {
    pub mode: TransportMode,
    pub from: Coordinate,
    pub to: Coordinate,
    pub distance_km: f64,
    pub duration_minutes: f64,
}

/// A proposed way to travel from origin to destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RouteCandidate {
    /// Mode sequence key, e.g. `walk+bus`
    pub id: String,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode_sequence: Vec<TransportMode>,
    pub legs: Vec<RouteLeg>,
    pub distance_km: f64,
    pub duration_minutes: f64,
    /// 0-100, higher is greener
    pub eco_score: u8,
    pub co2_emissions_kg: f64,
    pub co2_saved_kg: f64,
    /// Encoded polyline (precision 5) through the leg waypoints
    pub polyline: String,
}

/// Shortcuts into a ranked candidate list.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RouteRecommendations {
    pub most_eco: RouteCandidate,
    pub fastest: RouteCandidate,
    pub balanced: RouteCandidate,
}

/// Named eco/speed presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePreference {
    Eco,
    Balanced,
    #[serde(alias = "time")]
    Fast,
}

impl RoutePreference {
    pub fn eco_balance(&self) -> f64 {
        match self {
            RoutePreference::Eco => 100.0,
            RoutePreference::Balanced => 50.0,
            RoutePreference::Fast => 0.0,
        }
    }
}

/// A finished trip, stored in the route history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedRoute {
    /// Trip id (document ID, idempotency key)
    pub id: String,
    pub user_id: String,
    pub candidate_id: String,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode_sequence: Vec<TransportMode>,
    pub distance_km: f64,
    /// Heuristic estimate from the route menu
    pub duration_minutes: f64,
    pub eco_score: u8,
    pub co2_emissions_kg: f64,
    pub co2_saved_kg: f64,
    pub points_earned: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
}

impl CompletedRoute {
    /// Build the history record for a candidate the user just finished.
    pub fn from_candidate(
        id: String,
        user_id: &str,
        candidate: &RouteCandidate,
        points_earned: u32,
        started_at: Option<DateTime<Utc>>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            candidate_id: candidate.id.clone(),
            origin: candidate.origin,
            destination: candidate.destination,
            mode_sequence: candidate.mode_sequence.clone(),
            distance_km: candidate.distance_km,
            duration_minutes: candidate.duration_minutes,
            eco_score: candidate.eco_score,
            co2_emissions_kg: candidate.co2_emissions_kg,
            co2_saved_kg: candidate.co2_saved_kg,
            points_earned,
            started_at,
            completed_at,
            favorite: false,
        }
    }

    /// Wall-clock minutes between start and completion, if the start is known.
    pub fn elapsed_minutes(&self) -> Option<i64> {
        self.started_at
            .map(|start| self.completed_at.signed_duration_since(start).num_minutes())
            .filter(|m| *m >= 0)
    }
}
