// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement catalog and evaluation against user stats.

use crate::models::{TransportMode, UserStats};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Requirement {
    Routes(u32),
    DistanceKm(f64),
    Co2SavedKg(f64),
    StreakDays(u32),
    ModeLegs { mode: TransportMode, legs: u32 },
}

impl Requirement {
    /// Fraction of the requirement met, in 0..=1.
    pub fn progress(&self, stats: &UserStats) -> f64 {
        let (have, need) = match *self {
            Requirement::Routes(n) => (f64::from(stats.total_routes), f64::from(n)),
            Requirement::DistanceKm(km) => (stats.total_distance_km, km),
            Requirement::Co2SavedKg(kg) => (stats.total_co2_saved_kg, kg),
            Requirement::StreakDays(days) => (f64::from(stats.longest_streak), f64::from(days)),
            Requirement::ModeLegs { mode, legs } => (f64::from(stats.legs_for(mode)), f64::from(legs)),
        };
        if need <= 0.0 {
            1.0
        } else {
            (have / need).clamp(0.0, 1.0)
        }
    }

    pub fn is_met(&self, stats: &UserStats) -> bool {
        self.progress(stats) >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub points: u32,
    pub requirement: Requirement,
}

pub const CATALOG: [Achievement; 5] = [
    Achievement {
        id: "first-journey",
        name: "First Journey",
        description: "Complete your first eco-friendly route",
        icon: "trail-sign",
        points: 50,
        requirement: Requirement::Routes(1),
    },
    Achievement {
        id: "eco-warrior",
        name: "Eco Warrior",
        description: "Save 10 kg of CO2",
        icon: "leaf",
        points: 100,
        requirement: Requirement::Co2SavedKg(10.0),
    },
    Achievement {
        id: "distance-champion",
        name: "Distance Champion",
        description: "Travel 100 km by eco-friendly transport",
        icon: "speedometer",
        points: 200,
        requirement: Requirement::DistanceKm(100.0),
    },
    Achievement {
        id: "week-streak",
        name: "Green Week",
        description: "Commute green seven days in a row",
        icon: "calendar",
        points: 150,
        requirement: Requirement::StreakDays(7),
    },
    Achievement {
        id: "train-regular",
        name: "Train Regular",
        description: "Take the train on ten route legs",
        icon: "train",
        points: 100,
        requirement: Requirement::ModeLegs {
            mode: TransportMode::Train,
            legs: 10,
        },
    },
];

/// Achievements whose requirement is met but which are not unlocked yet.
pub fn newly_unlocked(stats: &UserStats) -> Vec<&'static Achievement> {
    CATALOG
        .iter()
        .filter(|a| !stats.unlocked_achievements.contains(a.id) && a.requirement.is_met(stats))
        .collect()
}

/// Catalog entry with the user's state, for the stats view.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementProgress {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub progress: f64,
    pub unlocked: bool,
}

pub fn progress_for(stats: &UserStats) -> Vec<AchievementProgress> {
    CATALOG
        .iter()
        .map(|a| AchievementProgress {
            achievement: *a,
            progress: a.requirement.progress(stats),
            unlocked: stats.unlocked_achievements.contains(a.id),
        })
        .collect()
}
