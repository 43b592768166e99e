//! Per-user commute aggregates for the statistics and achievements views.
//!
//! Updated in the same Firestore transaction as the route history and the
//! points account, so reading them is a single document fetch.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::CompletedRoute;

/// Pre-computed statistics for a user.
///
/// Stored at: `user_stats/{user_id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    // ─── Totals ──────────────────────────────────────────────────
    #[serde(default)]
    pub total_routes: u32,
    #[serde(default)]
    pub total_distance_km: f64,
    #[serde(default)]
    pub total_co2_saved_kg: f64,
    /// Points from route completions only (achievement bonuses excluded)
    #[serde(default)]
    pub route_points: u64,
    /// Sum of eco-scores, for the running average
    #[serde(default)]
    pub eco_score_sum: u64,

    // ─── By Transport Mode ───────────────────────────────────────
    /// Legs travelled per mode
    #[serde(default)]
    pub legs_by_mode: HashMap<String, u32>,
    /// Distance per mode (km)
    #[serde(default)]
    pub distance_by_mode: HashMap<String, f64>,

    // ─── Time Series ─────────────────────────────────────────────
    /// Route count per month ("YYYY-MM")
    #[serde(default)]
    pub routes_by_month: HashMap<String, u32>,

    // ─── Streaks ─────────────────────────────────────────────────
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub last_route_day: Option<NaiveDate>,

    // ─── Idempotency / Unlocks ───────────────────────────────────
    #[serde(default)]
    pub processed_route_ids: HashSet<String>,
    #[serde(default)]
    pub unlocked_achievements: HashSet<String>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserStats {
    /// Fold a completed route into the aggregates.
    ///
    /// Returns `false` without touching anything if the route id was already
    /// counted.
    pub fn update_from_route(&mut self, route: &CompletedRoute, now: DateTime<Utc>) -> bool {
        if !self.processed_route_ids.insert(route.id.clone()) {
            return false;
        }
        self.updated_at = Some(now);

        self.total_routes += 1;
        self.total_distance_km += route.distance_km;
        self.total_co2_saved_kg += route.co2_saved_kg;
        self.route_points += u64::from(route.points_earned);
        self.eco_score_sum += u64::from(route.eco_score);

        // Legs split the distance evenly, matching the candidate generator
        let leg_count = route.mode_sequence.len().max(1) as f64;
        for mode in &route.mode_sequence {
            *self.legs_by_mode.entry(mode.to_string()).or_insert(0) += 1;
            *self
                .distance_by_mode
                .entry(mode.to_string())
                .or_insert(0.0) += route.distance_km / leg_count;
        }

        let month_key = route.completed_at.format("%Y-%m").to_string();
        *self.routes_by_month.entry(month_key).or_insert(0) += 1;

        self.record_day(route.completed_at.date_naive());

        true
    }

    fn record_day(&mut self, day: NaiveDate) {
        match self.last_route_day {
            Some(last) if day == last => return,
            // Out-of-order completion, streak bookkeeping only moves forward
            Some(last) if day < last => return,
            Some(last) if last.succ_opt() == Some(day) => self.current_streak += 1,
            _ => self.current_streak = 1,
        }
        self.last_route_day = Some(day);
        self.longest_streak = self.longest_streak.max(self.current_streak);
    }

    pub fn average_eco_score(&self) -> f64 {
        if self.total_routes == 0 {
            0.0
        } else {
            self.eco_score_sum as f64 / self.total_routes as f64
        }
    }

    pub fn legs_for(&self, mode: crate::models::TransportMode) -> u32 {
        self.legs_by_mode.get(mode.as_str()).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, TransportMode};
    use chrono::TimeZone;

    fn make_route(id: &str, modes: Vec<TransportMode>, distance: f64, day: u32) -> CompletedRoute {
        let at = Utc.with_ymd_and_hms(2025, 3, day, 8, 0, 0).unwrap();
        CompletedRoute {
            id: id.to_string(),
            user_id: "u1".to_string(),
            candidate_id: crate::models::transport::mode_key(&modes),
            origin: Coordinate::new(48.2082, 16.3738).unwrap(),
            destination: Coordinate::new(48.2208, 16.35).unwrap(),
            mode_sequence: modes,
            distance_km: distance,
            duration_minutes: 10.0,
            eco_score: 90,
            co2_emissions_kg: 0.0,
            co2_saved_kg: distance * 0.192,
            points_earned: 40,
            started_at: None,
            completed_at: at,
            favorite: false,
        }
    }

    #[test]
    fn test_update_from_route_basic() {
        let mut stats = UserStats::default();
        let route = make_route("r1", vec![TransportMode::Bike, TransportMode::Train], 4.0, 3);

        assert!(stats.update_from_route(&route, Utc::now()));
        assert_eq!(stats.total_routes, 1);
        assert_eq!(stats.total_distance_km, 4.0);
        assert_eq!(stats.route_points, 40);
        assert_eq!(stats.legs_for(TransportMode::Train), 1);
        assert_eq!(stats.distance_by_mode.get("bike"), Some(&2.0));
        assert_eq!(stats.routes_by_month.get("2025-03"), Some(&1));
        assert_eq!(stats.average_eco_score(), 90.0);
    }

    #[test]
    fn test_idempotency_skips_duplicate() {
        let mut stats = UserStats::default();
        let route = make_route("r1", vec![TransportMode::Walk], 1.0, 3);

        stats.update_from_route(&route, Utc::now());
        assert!(!stats.update_from_route(&route, Utc::now()));
        assert_eq!(stats.total_routes, 1);
    }

    #[test]
    fn test_streak_tracking() {
        let mut stats = UserStats::default();
        for (i, day) in [3, 4, 4, 5, 9, 10].iter().enumerate() {
            let route = make_route(&format!("r{}", i), vec![TransportMode::Walk], 1.0, *day);
            stats.update_from_route(&route, Utc::now());
        }
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.total_routes, 6);
    }

    #[test]
    fn test_out_of_order_day_keeps_streak() {
        let mut stats = UserStats::default();
        stats.update_from_route(&make_route("a", vec![TransportMode::Walk], 1.0, 10), Utc::now());
        stats.update_from_route(&make_route("b", vec![TransportMode::Walk], 1.0, 11), Utc::now());
        stats.update_from_route(&make_route("c", vec![TransportMode::Walk], 1.0, 2), Utc::now());
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.last_route_day, NaiveDate::from_ymd_opt(2025, 3, 11));
    }
}
