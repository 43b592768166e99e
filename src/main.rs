// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GreenCommute API Server
//!
//! Plans eco-friendly commutes and rewards users with points they can
//! redeem at partner businesses.

use greencommute::{config::Config, db::FirestoreDb, services::RouteMenu, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting GreenCommute API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Load route menu
    let route_menu = match &config.route_menu_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading route menu");
            RouteMenu::load_from_file(path).expect("Failed to load route menu")
        }
        None => RouteMenu::default(),
    };
    tracing::info!(
        options = route_menu.options().len(),
        default_eco_balance = config.default_eco_balance,
        "Route menu ready"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, route_menu));

    // Build router
    let app = greencommute::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("greencommute=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
