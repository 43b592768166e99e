// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    AffiliateOffer, CompletedRoute, Coordinate, CoordinateInput, LeaderboardEntry, PointsSummary,
    PointsTransaction, Redemption, RoutePreference, TransportMode, UserStats,
};
use crate::routes::json_body;
use crate::services::achievements::{self, AchievementProgress};
use crate::services::commute::{self, CompletionRequest, CompletionResult, RoutePlan};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/routes/plan", post(plan_routes))
        .route("/api/routes/complete", post(complete_route))
        .route("/api/routes/history", get(get_route_history))
        .route("/api/routes/{id}/favorite", post(set_route_favorite))
        .route("/api/points", get(get_points))
        .route("/api/points/transactions", get(get_transactions))
        .route("/api/stats", get(get_stats))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/offers", get(list_offers))
        .route("/api/offers/{id}/redeem", post(redeem_offer))
        .route("/api/redemptions", get(get_redemptions))
        .route("/api/redemptions/{id}/use", post(use_redemption))
}

const MAX_TRIP_ID_LEN: usize = 128;
/// `{user_id}_{trip_id}` or a uuid
const MAX_ROUTE_ID_LEN: usize = 512;
const MAX_CATEGORY_LEN: usize = 50;

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

impl LimitQuery {
    fn resolve(&self, default: u32, max: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, max)
    }
}

// ─── Route Planning ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct PlanRequest {
    origin: CoordinateInput,
    destination: CoordinateInput,
    #[validate(length(min = 1, max = 16))]
    allowed_modes: Vec<TransportMode>,
    /// 0 = fastest, 100 = greenest; wins over `preference`
    eco_balance: Option<f64>,
    preference: Option<RoutePreference>,
}

/// Rank route options between two points.
async fn plan_routes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<RoutePlan>> {
    let req = json_body(payload)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let origin = Coordinate::try_from(req.origin)?;
    let destination = Coordinate::try_from(req.destination)?;
    let allowed: HashSet<TransportMode> = req.allowed_modes.into_iter().collect();
    let eco_balance = req
        .eco_balance
        .or_else(|| req.preference.map(|p| p.eco_balance()))
        .unwrap_or(state.config.default_eco_balance);

    tracing::debug!(
        user_id = %user.user_id,
        eco_balance,
        modes = allowed.len(),
        "Planning routes"
    );

    let plan = commute::plan_routes(&state.route_menu, origin, destination, &allowed, eco_balance)?;
    Ok(Json(plan))
}

// ─── Route Completion ────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CompleteRequest {
    origin: CoordinateInput,
    destination: CoordinateInput,
    #[validate(length(min = 1, max = 8))]
    mode_sequence: Vec<TransportMode>,
    /// Client-generated id; retries with the same id are no-ops
    #[validate(length(min = 1, max = 128))]
    trip_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
}

/// Record a finished trip and award points.
async fn complete_route(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CompleteRequest>, JsonRejection>,
) -> Result<Json<CompletionResult>> {
    let req = json_body(payload)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if let Some(trip_id) = &req.trip_id {
        // Becomes part of a Firestore document id
        let valid = trip_id.len() <= MAX_TRIP_ID_LEN
            && trip_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::BadRequest(
                "trip_id may only contain letters, digits, '-' and '_'".to_string(),
            ));
        }
    }

    let request = CompletionRequest {
        origin: Coordinate::try_from(req.origin)?,
        destination: Coordinate::try_from(req.destination)?,
        mode_sequence: req.mode_sequence,
        trip_id: req.trip_id,
        started_at: req.started_at,
    };

    let result = state.commute.complete_route(&user.user_id, request).await?;
    Ok(Json(result))
}

#[derive(Serialize)]
pub struct RouteHistoryResponse {
    pub routes: Vec<RouteHistoryEntry>,
}

#[derive(Serialize)]
pub struct RouteHistoryEntry {
    #[serde(flatten)]
    pub route: CompletedRoute,
    /// Wall-clock minutes, when the client reported a start time
    pub elapsed_minutes: Option<i64>,
}

impl From<CompletedRoute> for RouteHistoryEntry {
    fn from(route: CompletedRoute) -> Self {
        Self {
            elapsed_minutes: route.elapsed_minutes(),
            route,
        }
    }
}

async fn get_route_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<RouteHistoryResponse>> {
    let routes = state
        .db
        .get_route_history(&user.user_id, params.resolve(20, 100))
        .await?;
    Ok(Json(RouteHistoryResponse {
        routes: routes.into_iter().map(RouteHistoryEntry::from).collect(),
    }))
}

#[derive(Deserialize)]
struct FavoriteRequest {
    favorite: bool,
}

async fn set_route_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(route_id): Path<String>,
    payload: std::result::Result<Json<FavoriteRequest>, JsonRejection>,
) -> Result<Json<RouteHistoryEntry>> {
    let req = json_body(payload)?;
    if route_id.is_empty() || route_id.len() > MAX_ROUTE_ID_LEN || route_id.contains('/') {
        return Err(AppError::BadRequest("Invalid route id".to_string()));
    }

    let route = state
        .db
        .set_route_favorite(&user.user_id, &route_id, req.favorite)
        .await?;
    Ok(Json(route.into()))
}

// ─── Points ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PointsResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub balance: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_earned: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_spent: u64,
}

async fn get_points(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PointsResponse>> {
    let account = state.db.get_account(&user.user_id).await?;
    Ok(Json(match account {
        Some(a) => PointsResponse {
            balance: a.balance,
            total_earned: a.total_earned,
            total_spent: a.total_spent,
        },
        None => PointsResponse {
            balance: 0,
            total_earned: 0,
            total_spent: 0,
        },
    }))
}

#[derive(Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<PointsTransaction>,
    /// Totals over the returned page
    pub summary: PointsSummary,
}

async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<TransactionsResponse>> {
    let transactions = state
        .db
        .get_transactions(&user.user_id, params.resolve(50, 200))
        .await?;
    let summary = PointsSummary::from_transactions(&transactions);
    Ok(Json(TransactionsResponse {
        transactions,
        summary,
    }))
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let entries = state.db.get_leaderboard(params.resolve(10, 50)).await?;
    Ok(Json(LeaderboardResponse { entries }))
}

// ─── Stats ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StatsView,
    pub average_eco_score: f64,
    pub achievements: Vec<AchievementProgress>,
}

/// Public subset of [`UserStats`]; bookkeeping sets are left out.
#[derive(Serialize)]
pub struct StatsView {
    pub total_routes: u32,
    pub total_distance_km: f64,
    pub total_co2_saved_kg: f64,
    pub route_points: u64,
    pub legs_by_mode: std::collections::HashMap<String, u32>,
    pub distance_by_mode: std::collections::HashMap<String, f64>,
    pub routes_by_month: std::collections::HashMap<String, u32>,
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl From<&UserStats> for StatsView {
    fn from(stats: &UserStats) -> Self {
        Self {
            total_routes: stats.total_routes,
            total_distance_km: stats.total_distance_km,
            total_co2_saved_kg: stats.total_co2_saved_kg,
            route_points: stats.route_points,
            legs_by_mode: stats.legs_by_mode.clone(),
            distance_by_mode: stats.distance_by_mode.clone(),
            routes_by_month: stats.routes_by_month.clone(),
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
        }
    }
}

/// Commute statistics and achievement progress (1 Firestore read).
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StatsResponse>> {
    let stats = state
        .db
        .get_user_stats(&user.user_id)
        .await?
        .unwrap_or_default();

    Ok(Json(StatsResponse {
        stats: StatsView::from(&stats),
        average_eco_score: stats.average_eco_score(),
        achievements: achievements::progress_for(&stats),
    }))
}

// ─── Offers & Redemptions ────────────────────────────────────

#[derive(Deserialize)]
struct OffersQuery {
    category: Option<String>,
}

#[derive(Serialize)]
pub struct OffersResponse {
    pub offers: Vec<AffiliateOffer>,
}

async fn list_offers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OffersQuery>,
) -> Result<Json<OffersResponse>> {
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    if category.is_some_and(|c| c.len() > MAX_CATEGORY_LEN) {
        return Err(AppError::BadRequest("Category name too long".to_string()));
    }

    let offers = state.db.list_offers(category).await?;
    Ok(Json(OffersResponse { offers }))
}

#[derive(Serialize)]
pub struct RedeemResponse {
    pub redemption: Redemption,
    pub balance: u64,
}

async fn redeem_offer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(offer_id): Path<String>,
) -> Result<Json<RedeemResponse>> {
    let outcome = state
        .db
        .redeem_offer_atomic(&user.user_id, &offer_id, Utc::now())
        .await?;
    Ok(Json(RedeemResponse {
        redemption: outcome.redemption,
        balance: outcome.account.balance,
    }))
}

#[derive(Serialize)]
pub struct RedemptionsResponse {
    pub redemptions: Vec<Redemption>,
}

async fn get_redemptions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RedemptionsResponse>> {
    let now = Utc::now();
    let redemptions = state
        .db
        .get_redemptions(&user.user_id)
        .await?
        .into_iter()
        .map(|r| Redemption {
            status: r.effective_status(now),
            ..r
        })
        .collect();
    Ok(Json(RedemptionsResponse { redemptions }))
}

async fn use_redemption(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(redemption_id): Path<String>,
) -> Result<Json<Redemption>> {
    let redemption = state
        .db
        .mark_redemption_used(&user.user_id, &redemption_id, Utc::now())
        .await?;
    Ok(Json(redemption))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(LimitQuery { limit: None }.resolve(20, 100), 20);
        assert_eq!(LimitQuery { limit: Some(0) }.resolve(20, 100), 1);
        assert_eq!(LimitQuery { limit: Some(500) }.resolve(20, 100), 100);
    }

    #[test]
    fn test_plan_request_validation() {
        let req: PlanRequest = serde_json::from_str(
            r#"{"origin": {"lat": 48.2, "lng": 16.37},
                "destination": {"latitude": 48.22, "longitude": 16.35},
                "allowed_modes": []}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_history_entry_reports_elapsed_minutes() {
        let o = Coordinate::new(48.2082, 16.3738).unwrap();
        let d = Coordinate::new(48.2208, 16.3500).unwrap();
        let candidate = crate::services::RouteMenu::default()
            .candidate_for(o, d, &[TransportMode::Bike])
            .unwrap();
        let completed_at = Utc::now();
        let started_at = completed_at - chrono::Duration::minutes(14);

        let entry = RouteHistoryEntry::from(CompletedRoute::from_candidate(
            "u1_t1".to_string(),
            "u1",
            &candidate,
            61,
            Some(started_at),
            completed_at,
        ));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["elapsed_minutes"], 14);
        assert_eq!(json["id"], "u1_t1");
        assert_eq!(json["favorite"], false);

        // Start after completion is ignored
        let entry = RouteHistoryEntry::from(CompletedRoute::from_candidate(
            "u1_t2".to_string(),
            "u1",
            &candidate,
            61,
            Some(completed_at + chrono::Duration::minutes(5)),
            completed_at,
        ));
        assert_eq!(entry.elapsed_minutes, None);
    }

    #[test]
    fn test_stats_view_hides_bookkeeping() {
        let mut stats = UserStats::default();
        stats.processed_route_ids.insert("r1".to_string());
        let json = serde_json::to_value(StatsView::from(&stats)).unwrap();
        assert!(json.get("processed_route_ids").is_none());
        assert_eq!(json["total_routes"], 0);
    }
}
