// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transport mode tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The closed set of ways a leg can be travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum TransportMode {
    Walk,
    Bike,
    #[serde(alias = "e-bike")]
    Ebike,
    #[serde(alias = "e-scooter")]
    Scooter,
    Bus,
    Train,
    Tram,
    Car,
    Carpool,
}

impl TransportMode {
    pub const ALL: [TransportMode; 9] = [
        TransportMode::Walk,
        TransportMode::Bike,
        TransportMode::Ebike,
        TransportMode::Scooter,
        TransportMode::Bus,
        TransportMode::Train,
        TransportMode::Tram,
        TransportMode::Car,
        TransportMode::Carpool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Walk => "walk",
            TransportMode::Bike => "bike",
            TransportMode::Ebike => "ebike",
            TransportMode::Scooter => "scooter",
            TransportMode::Bus => "bus",
            TransportMode::Train => "train",
            TransportMode::Tram => "tram",
            TransportMode::Car => "car",
            TransportMode::Carpool => "carpool",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown transport mode: {0}")]
pub struct UnknownModeError(pub String);

impl FromStr for TransportMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" => Ok(TransportMode::Walk),
            "bike" => Ok(TransportMode::Bike),
            "ebike" | "e-bike" => Ok(TransportMode::Ebike),
            "scooter" | "e-scooter" => Ok(TransportMode::Scooter),
            "bus" => Ok(TransportMode::Bus),
            "train" => Ok(TransportMode::Train),
            "tram" => Ok(TransportMode::Tram),
            "car" => Ok(TransportMode::Car),
            "carpool" => Ok(TransportMode::Carpool),
            other => Err(UnknownModeError(other.to_string())),
        }
    }
}

/// Join a mode sequence into its canonical key, e.g. `bike+train`.
pub fn mode_key(modes: &[TransportMode]) -> String {
    modes
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("+")
}
