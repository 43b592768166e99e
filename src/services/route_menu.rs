// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Heuristic route menu and candidate generation.
//!
//! There is no routing engine behind this: every option covers the same
//! great-circle distance and differs only by its mode sequence, eco-score and
//! time factor. The table can be replaced from a JSON file at startup.

use crate::error::ScoringError;
use crate::models::transport::mode_key;
use crate::models::{Coordinate, RouteCandidate, RouteLeg, TransportMode};
use crate::services::{distance, emissions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One row of the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOption {
    pub modes: Vec<TransportMode>,
    pub eco_score: u8,
    /// Hours per km
    pub time_factor: f64,
}

impl RouteOption {
    fn new(modes: &[TransportMode], eco_score: u8, time_factor: f64) -> Self {
        Self {
            modes: modes.to_vec(),
            eco_score,
            time_factor,
        }
    }
}

/// Ordered table of route options.
#[derive(Debug, Clone)]
pub struct RouteMenu {
    options: Vec<RouteOption>,
}

impl Default for RouteMenu {
    fn default() -> Self {
        use TransportMode::*;
        Self {
            options: vec![
                RouteOption::new(&[Walk], 100, 1.0),
                RouteOption::new(&[Bike], 98, 0.3),
                RouteOption::new(&[Bus], 85, 0.25),
                RouteOption::new(&[Train], 90, 0.2),
                RouteOption::new(&[Walk, Bus], 82, 0.22),
                RouteOption::new(&[Bike, Train], 88, 0.18),
            ],
        }
    }
}

impl RouteMenu {
    /// Build a menu from explicit options, validating every row.
    pub fn new(options: Vec<RouteOption>) -> Result<Self, RouteMenuError> {
        if options.is_empty() {
            return Err(RouteMenuError::Empty);
        }

        let mut seen = HashSet::new();
        for option in &options {
            let key = mode_key(&option.modes);
            if option.modes.is_empty() {
                return Err(RouteMenuError::InvalidOption {
                    key,
                    reason: "no modes".to_string(),
                });
            }
            if option.eco_score > 100 {
                return Err(RouteMenuError::InvalidOption {
                    key,
                    reason: format!("eco_score {} above 100", option.eco_score),
                });
            }
            if !option.time_factor.is_finite() || option.time_factor <= 0.0 {
                return Err(RouteMenuError::InvalidOption {
                    key,
                    reason: format!("time_factor {} must be positive", option.time_factor),
                });
            }
            if !seen.insert(key.clone()) {
                return Err(RouteMenuError::Duplicate(key));
            }
        }

        Ok(Self { options })
    }

    /// Load the menu from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RouteMenuError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| RouteMenuError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load the menu from a JSON array of options.
    pub fn load_from_json(json_data: &str) -> Result<Self, RouteMenuError> {
        let options: Vec<RouteOption> = serde_json::from_str(json_data)
            .map_err(|e| RouteMenuError::ParseError(e.to_string()))?;
        let menu = Self::new(options)?;
        tracing::info!(count = menu.options.len(), "Loaded route menu");
        Ok(menu)
    }

    pub fn options(&self) -> &[RouteOption] {
        &self.options
    }

    /// Produce one candidate per option whose modes are all allowed.
    ///
    /// Candidates come out in menu order. Fails with `NoCandidateRoutes` when
    /// nothing matches.
    pub fn generate_candidates(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        allowed_modes: &HashSet<TransportMode>,
    ) -> Result<Vec<RouteCandidate>, ScoringError> {
        let distance_km = distance::distance_km(&origin, &destination);

        let candidates: Vec<RouteCandidate> = self
            .options
            .iter()
            .filter(|option| option.modes.iter().all(|m| allowed_modes.contains(m)))
            .map(|option| build_candidate(option, origin, destination, distance_km))
            .collect();

        if candidates.is_empty() {
            return Err(ScoringError::NoCandidateRoutes);
        }

        tracing::debug!(
            distance_km,
            count = candidates.len(),
            "Generated route candidates"
        );
        Ok(candidates)
    }

    /// Rebuild the candidate for an exact mode sequence, if the menu has it.
    pub fn candidate_for(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        modes: &[TransportMode],
    ) -> Option<RouteCandidate> {
        let option = self.options.iter().find(|o| o.modes == modes)?;
        let distance_km = distance::distance_km(&origin, &destination);
        Some(build_candidate(option, origin, destination, distance_km))
    }
}

/// Shortest distance used for duration estimates, so every candidate has a
/// positive duration.
const MIN_TIMED_DISTANCE_KM: f64 = 0.01;

fn build_candidate(
    option: &RouteOption,
    origin: Coordinate,
    destination: Coordinate,
    distance_km: f64,
) -> RouteCandidate {
    // Very short trips round to 0 km; time them as the minimum distance
    let duration_minutes = distance_km.max(MIN_TIMED_DISTANCE_KM) * option.time_factor * 60.0;
    let legs = split_legs(&option.modes, origin, destination, distance_km, duration_minutes);

    let co2_emissions_kg: f64 = legs
        .iter()
        .map(|leg| emissions::emissions_kg(leg.distance_km, leg.mode))
        .sum();
    let co2_saved_kg =
        (emissions::emissions_kg(distance_km, TransportMode::Car) - co2_emissions_kg).max(0.0);

    RouteCandidate {
        id: mode_key(&option.modes),
        origin,
        destination,
        mode_sequence: option.modes.clone(),
        polyline: encode_path(&legs),
        legs,
        distance_km,
        duration_minutes,
        eco_score: option.eco_score,
        co2_emissions_kg,
        co2_saved_kg,
    }
}

/// Split the straight line into equal legs, one per mode.
fn split_legs(
    modes: &[TransportMode],
    origin: Coordinate,
    destination: Coordinate,
    distance_km: f64,
    duration_minutes: f64,
) -> Vec<RouteLeg> {
    let n = modes.len() as f64;
    modes
        .iter()
        .enumerate()
        .map(|(i, &mode)| {
            let from = origin.lerp(&destination, i as f64 / n);
            let to = if i + 1 == modes.len() {
                destination
            } else {
                origin.lerp(&destination, (i + 1) as f64 / n)
            };
            RouteLeg {
                mode,
                from,
                to,
                distance_km: distance_km / n,
                duration_minutes: duration_minutes / n,
            }
        })
        .collect()
}

fn encode_path(legs: &[RouteLeg]) -> String {
    let mut points: Vec<geo::Coord<f64>> = Vec::with_capacity(legs.len() + 1);
    if let Some(first) = legs.first() {
        points.push(first.from.into());
    }
    points.extend(legs.iter().map(|leg| geo::Coord::from(leg.to)));

    match polyline::encode_coordinates(points, 5) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode route polyline");
            String::new()
        }
    }
}

/// Errors from loading or validating a route menu.
#[derive(Debug, thiserror::Error)]
pub enum RouteMenuError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse route menu: {0}")]
    ParseError(String),

    #[error("Route menu has no options")]
    Empty,

    #[error("Invalid route option {key}: {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("Duplicate route option: {0}")]
    Duplicate(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransportMode::*;

    fn vienna() -> (Coordinate, Coordinate) {
        (
            Coordinate::new(48.2082, 16.3738).unwrap(),
            Coordinate::new(48.2208, 16.3500).unwrap(),
        )
    }

    fn allowed(modes: &[TransportMode]) -> HashSet<TransportMode> {
        modes.iter().copied().collect()
    }

    #[test]
    fn test_subset_filter() {
        let (o, d) = vienna();
        let menu = RouteMenu::default();

        let only_walk_bike = menu
            .generate_candidates(o, d, &allowed(&[Walk, Bike]))
            .unwrap();
        let ids: Vec<&str> = only_walk_bike.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["walk", "bike"]);

        let with_bus = menu
            .generate_candidates(o, d, &allowed(&[Walk, Bus]))
            .unwrap();
        let ids: Vec<&str> = with_bus.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["walk", "bus", "walk+bus"]);
    }

    #[test]
    fn test_no_match_is_error() {
        let (o, d) = vienna();
        let err = RouteMenu::default()
            .generate_candidates(o, d, &allowed(&[Car, Carpool]))
            .unwrap_err();
        assert_eq!(err, ScoringError::NoCandidateRoutes);
    }

    #[test]
    fn test_candidate_fields() {
        let (o, d) = vienna();
        let candidates = RouteMenu::default()
            .generate_candidates(o, d, &allowed(&[Bike]))
            .unwrap();
        let bike = &candidates[0];

        assert_eq!(bike.distance_km, 2.25);
        assert!((bike.duration_minutes - 40.5).abs() < 1e-9);
        assert_eq!(bike.eco_score, 98);
        assert_eq!(bike.co2_emissions_kg, 0.0);
        assert!((bike.co2_saved_kg - 2.25 * 0.192).abs() < 1e-9);
        assert_eq!(bike.legs.len(), 1);
        assert!(!bike.polyline.is_empty());
    }

    #[test]
    fn test_nearby_points_still_get_positive_durations() {
        let o = Coordinate::new(48.2082, 16.3738).unwrap();
        let d = Coordinate::new(48.20822, 16.37381).unwrap();
        let candidates = RouteMenu::default()
            .generate_candidates(o, d, &allowed(&[Walk, Bike]))
            .unwrap();

        for c in &candidates {
            assert_eq!(c.distance_km, 0.0);
            assert!(c.duration_minutes > 0.0);
            assert!(c.legs.iter().all(|leg| leg.duration_minutes > 0.0));
        }
        // Walking 10 m at the walk time factor
        assert!((candidates[0].duration_minutes - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_multi_leg_split() {
        let (o, d) = vienna();
        let candidate = RouteMenu::default()
            .candidate_for(o, d, &[Bike, Train])
            .unwrap();

        assert_eq!(candidate.legs.len(), 2);
        assert_eq!(candidate.legs[0].from, o);
        assert_eq!(candidate.legs[1].to, d);
        assert_eq!(candidate.legs[0].to, candidate.legs[1].from);
        assert!((candidate.legs[0].distance_km - 1.125).abs() < 1e-9);

        let expected_emissions = 1.125 * 0.041;
        assert!((candidate.co2_emissions_kg - expected_emissions).abs() < 1e-9);
    }

    #[test]
    fn test_candidate_for_unknown_sequence() {
        let (o, d) = vienna();
        assert!(RouteMenu::default().candidate_for(o, d, &[Train, Bike]).is_none());
    }

    #[test]
    fn test_load_from_json() {
        let menu = RouteMenu::load_from_json(
            r#"[{"modes": ["tram"], "eco_score": 87, "time_factor": 0.23},
                {"modes": ["e-bike"], "eco_score": 95, "time_factor": 0.25}]"#,
        )
        .unwrap();
        assert_eq!(menu.options().len(), 2);
        assert_eq!(menu.options()[1].modes, vec![Ebike]);
    }

    #[test]
    fn test_rejects_bad_menus() {
        assert!(matches!(
            RouteMenu::load_from_json("[]"),
            Err(RouteMenuError::Empty)
        ));
        assert!(matches!(
            RouteMenu::load_from_json(r#"[{"modes": ["bus"], "eco_score": 80, "time_factor": 0}]"#),
            Err(RouteMenuError::InvalidOption { .. })
        ));
        assert!(matches!(
            RouteMenu::load_from_json(
                r#"[{"modes": ["bus"], "eco_score": 80, "time_factor": 0.2},
                    {"modes": ["bus"], "eco_score": 70, "time_factor": 0.3}]"#
            ),
            Err(RouteMenuError::Duplicate(_))
        ));
        assert!(matches!(
            RouteMenu::load_from_json("not json"),
            Err(RouteMenuError::ParseError(_))
        ));
    }
}
