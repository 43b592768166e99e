// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::ledger::LedgerError;
use crate::services::rewards::RewardError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors raised by the scoring core (distance, generation, ranking).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Eco/speed balance must be within 0..=100, got {0}")]
    InvalidEcoBalance(f64),

    #[error("No route option matches the allowed transport modes")]
    NoCandidateRoutes,

    #[error("Route {route_id} has a non-positive duration")]
    DegenerateDuration { route_id: String },
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Reward(#[from] RewardError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn ledger_parts(err: &LedgerError) -> (StatusCode, &'static str, Option<String>) {
    match err {
        LedgerError::InsufficientPoints { balance, requested } => (
            StatusCode::CONFLICT,
            "insufficient_points",
            Some(format!(
                "Need {} more points (balance {}, requested {})",
                u64::from(*requested).saturating_sub(*balance),
                balance,
                requested
            )),
        ),
        LedgerError::ZeroAmount => (
            StatusCode::BAD_REQUEST,
            "bad_request",
            Some(err.to_string()),
        ),
        LedgerError::BalanceOverflow => {
            tracing::error!(error = %err, "Ledger overflow");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Scoring(err) => match err {
                ScoringError::InvalidCoordinate { .. } => (
                    StatusCode::BAD_REQUEST,
                    "invalid_coordinate",
                    Some(err.to_string()),
                ),
                ScoringError::InvalidEcoBalance(_) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_eco_balance",
                    Some(err.to_string()),
                ),
                ScoringError::NoCandidateRoutes => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "no_candidate_routes",
                    Some("Allow more transport modes to get route options".to_string()),
                ),
                ScoringError::DegenerateDuration { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "degenerate_duration",
                    Some(err.to_string()),
                ),
            },
            AppError::Ledger(err) => ledger_parts(err),
            AppError::Reward(err) => match err {
                RewardError::Ledger(inner) => ledger_parts(inner),
                RewardError::OfferInactive(_) | RewardError::OutOfStock(_) => (
                    StatusCode::CONFLICT,
                    "offer_unavailable",
                    Some(err.to_string()),
                ),
                RewardError::RedemptionNotActive { .. } => (
                    StatusCode::CONFLICT,
                    "redemption_not_active",
                    Some(err.to_string()),
                ),
            },
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
