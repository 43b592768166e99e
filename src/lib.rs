// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! GreenCommute: eco-friendly commute planning and rewards
//!
//! This crate provides the backend API that ranks commute options by
//! emissions and travel time, awards points for completed trips, and lets
//! users spend them on partner offers.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{CommuteService, RouteMenu};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub route_menu: Arc<RouteMenu>,
    pub commute: CommuteService,
}

impl AppState {
    pub fn new(config: Config, db: FirestoreDb, route_menu: RouteMenu) -> Self {
        let route_menu = Arc::new(route_menu);
        let commute = CommuteService::new(route_menu.clone(), db.clone());
        Self {
            config,
            db,
            route_menu,
            commute,
        }
    }
}
