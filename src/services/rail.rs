// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! National-rail (ÖBB) helpers: station list, emission figures and rough
//! connection estimates.
//!
//! The emission figures here are grams per passenger-km from the operator's
//! environmental reports. They are a separate source from the generic
//! per-mode table in [`crate::services::emissions`] and are never mixed into
//! route scoring.

use crate::models::{Coordinate, TransportMode};
use crate::services::distance;
use serde::Serialize;

/// Average scheduled speed used for connection estimates.
const AVERAGE_TRAIN_KMH: f64 = 80.0;
/// Approximate fare per km.
const FARE_PER_KM: f64 = 0.15;

/// Grams CO2 per passenger-km; `None` where the reports give no figure.
pub fn rail_grams_per_km(mode: TransportMode) -> Option<f64> {
    match mode {
        TransportMode::Train => Some(14.0),
        TransportMode::Bus => Some(68.0),
        TransportMode::Car => Some(142.0),
        TransportMode::Bike | TransportMode::Walk => Some(0.0),
        TransportMode::Ebike => Some(5.0),
        TransportMode::Scooter => Some(8.0),
        TransportMode::Tram | TransportMode::Carpool => None,
    }
}

/// CO2 grams for a train journey.
pub fn rail_co2_grams(distance_km: f64) -> f64 {
    distance_km.max(0.0) * 14.0
}

/// Grams saved versus driving, floored at zero. Modes without a figure count
/// as zero-emission, as the operator data does.
pub fn rail_co2_saved_grams(distance_km: f64, mode: TransportMode) -> f64 {
    let distance_km = distance_km.max(0.0);
    let car = distance_km * 142.0;
    let by_mode = distance_km * rail_grams_per_km(mode).unwrap_or(0.0);
    (car - by_mode).max(0.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct Station {
    pub id: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub eva_number: &'static str,
}

impl Station {
    fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::new(self.lat, self.lng).ok()
    }
}

macro_rules! station {
    ($id:expr, $name:expr, $lat:expr, $lng:expr, $eva:expr) => {
        Station {
            id: $id,
            name: $name,
            lat: $lat,
            lng: $lng,
            eva_number: $eva,
        }
    };
}

pub const MAJOR_STATIONS: [Station; 9] = [
    station!("wien-hbf", "Wien Hauptbahnhof", 48.1851, 16.3794, "8103000"),
    station!("wien-meidling", "Wien Meidling", 48.1757, 16.3337, "8101003"),
    station!("salzburg-hbf", "Salzburg Hauptbahnhof", 47.8129, 13.0461, "8100002"),
    station!("graz-hbf", "Graz Hauptbahnhof", 47.0735, 15.4157, "8100173"),
    station!("linz-hbf", "Linz Hauptbahnhof", 48.2901, 14.2913, "8100013"),
    station!("innsbruck-hbf", "Innsbruck Hauptbahnhof", 47.2632, 11.4004, "8100108"),
    station!("klagenfurt-hbf", "Klagenfurt Hauptbahnhof", 46.6182, 14.3094, "8100085"),
    station!("bregenz", "Bregenz", 47.5038, 9.7387, "8100044"),
    station!("st-poelten-hbf", "St. Pölten Hauptbahnhof", 48.2076, 15.6214, "8100008"),
];

pub fn station(id: &str) -> Option<&'static Station> {
    MAJOR_STATIONS.iter().find(|s| s.id == id)
}

/// Case-insensitive substring match on the station name.
pub fn search_stations(query: &str) -> Vec<&'static Station> {
    let query = query.trim().to_lowercase();
    MAJOR_STATIONS
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&query))
        .collect()
}

/// Closest major station and its distance in km.
pub fn nearest_station(point: &Coordinate) -> Option<(&'static Station, f64)> {
    MAJOR_STATIONS
        .iter()
        .filter_map(|s| s.coordinate().map(|c| (s, distance::distance_km(point, &c))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Rough check against Austria's bounding box.
pub fn is_in_network(point: &Coordinate) -> bool {
    (46.4..=49.0).contains(&point.lat()) && (9.5..=17.2).contains(&point.lng())
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionEstimate {
    pub from: &'static str,
    pub to: &'static str,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub co2_grams: f64,
    pub co2_saved_grams: f64,
    /// Euros, rounded to cents
    pub fare: f64,
}

/// Straight-line estimate between two known stations.
pub fn estimate_connection(from_id: &str, to_id: &str) -> Option<ConnectionEstimate> {
    let from = station(from_id)?;
    let to = station(to_id)?;
    let distance_km = distance::distance_km(&from.coordinate()?, &to.coordinate()?);

    Some(ConnectionEstimate {
        from: from.name,
        to: to.name,
        distance_km,
        duration_minutes: (distance_km / AVERAGE_TRAIN_KMH * 60.0).round() as u32,
        co2_grams: rail_co2_grams(distance_km),
        co2_saved_grams: rail_co2_saved_grams(distance_km, TransportMode::Train),
        fare: (distance_km * FARE_PER_KM * 100.0).round() / 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rail_table_is_separate() {
        // 14 g/km here versus 0.041 kg/km in the generic table
        assert_eq!(rail_co2_grams(10.0), 140.0);
        assert_eq!(rail_co2_saved_grams(10.0, TransportMode::Train), 1280.0);
        assert_eq!(rail_co2_saved_grams(10.0, TransportMode::Car), 0.0);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let found = search_stations("WIEN");
        assert_eq!(found.len(), 2);
        assert!(search_stations("nowhere").is_empty());
    }

    #[test]
    fn test_nearest_station() {
        let stephansplatz = Coordinate::new(48.2082, 16.3738).unwrap();
        let (station, km) = nearest_station(&stephansplatz).unwrap();
        assert_eq!(station.id, "wien-hbf");
        assert!(km < 3.0);
    }

    #[test]
    fn test_network_bounds() {
        assert!(is_in_network(&Coordinate::new(47.0735, 15.4157).unwrap()));
        assert!(!is_in_network(&Coordinate::new(52.52, 13.405).unwrap()));
    }

    #[test]
    fn test_estimate_connection() {
        let est = estimate_connection("wien-hbf", "salzburg-hbf").unwrap();
        assert!(est.distance_km > 200.0 && est.distance_km < 300.0);
        assert_eq!(
            est.duration_minutes,
            (est.distance_km / 80.0 * 60.0).round() as u32
        );
        assert!(estimate_connection("wien-hbf", "paris").is_none());
    }
}
