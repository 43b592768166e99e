// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public national-rail lookups.

use crate::error::{AppError, Result};
use crate::models::Coordinate;
use crate::services::rail::{self, ConnectionEstimate, Station};
use crate::AppState;
use axum::{extract::Query, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_QUERY_LEN: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rail/stations", get(search_stations))
        .route("/api/rail/nearest", get(nearest_station))
        .route("/api/rail/estimate", get(estimate_connection))
}

#[derive(Deserialize)]
struct StationQuery {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
pub struct StationsResponse {
    pub stations: Vec<&'static Station>,
}

async fn search_stations(Query(params): Query<StationQuery>) -> Result<Json<StationsResponse>> {
    if params.q.len() > MAX_QUERY_LEN {
        return Err(AppError::BadRequest("Query too long".to_string()));
    }
    Ok(Json(StationsResponse {
        stations: rail::search_stations(&params.q),
    }))
}

#[derive(Deserialize)]
struct NearestQuery {
    lat: f64,
    lng: f64,
}

#[derive(Serialize)]
pub struct NearestResponse {
    pub station: &'static Station,
    pub distance_km: f64,
    pub in_network: bool,
}

async fn nearest_station(Query(params): Query<NearestQuery>) -> Result<Json<NearestResponse>> {
    let point = Coordinate::new(params.lat, params.lng)?;
    let (station, distance_km) = rail::nearest_station(&point)
        .ok_or_else(|| AppError::NotFound("No stations available".to_string()))?;
    Ok(Json(NearestResponse {
        station,
        distance_km,
        in_network: rail::is_in_network(&point),
    }))
}

#[derive(Deserialize)]
struct EstimateQuery {
    from: String,
    to: String,
}

async fn estimate_connection(
    Query(params): Query<EstimateQuery>,
) -> Result<Json<ConnectionEstimate>> {
    rail::estimate_connection(&params.from, &params.to)
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!("Unknown station: {} or {}", params.from, params.to))
        })
}
