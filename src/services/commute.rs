// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Commute workflow: planning and route completion.
//!
//! Completion handles the core workflow:
//! 1. Regenerate the candidate from the route menu
//! 2. Compute points for it
//! 3. Fold it into the user's stats and unlock achievements
//! 4. Store route, transactions, account and stats in one Firestore transaction

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::FirestoreDb;
use crate::error::{AppError, Result, ScoringError};
use crate::models::transport::mode_key;
use crate::models::{
    CompletedRoute, Coordinate, PointsAccount, PointsTransaction, RouteCandidate,
    RouteRecommendations, TransactionReason, TransportMode, UserStats,
};
use crate::services::achievements::{self, Achievement};
use crate::services::ledger::LedgerError;
use crate::services::route_menu::RouteMenu;
use crate::services::{points, ranker};

/// Ranked candidates plus the three headline picks.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub routes: Vec<RouteCandidate>,
    pub recommendations: RouteRecommendations,
}

/// Generate, rank and summarize candidates for a trip.
pub fn plan_routes(
    menu: &RouteMenu,
    origin: Coordinate,
    destination: Coordinate,
    allowed_modes: &HashSet<TransportMode>,
    eco_balance: f64,
) -> std::result::Result<RoutePlan, ScoringError> {
    let candidates = menu.generate_candidates(origin, destination, allowed_modes)?;
    let routes = ranker::rank(candidates, eco_balance)?;
    let recommendations = ranker::recommend(&routes).ok_or(ScoringError::NoCandidateRoutes)?;
    Ok(RoutePlan {
        routes,
        recommendations,
    })
}

/// Everything a completion changes, ready to be written together.
#[derive(Debug, Clone)]
pub struct RouteSettlement {
    pub route: CompletedRoute,
    pub account: PointsAccount,
    pub stats: UserStats,
    /// Route earn first, then one per unlocked achievement
    pub transactions: Vec<PointsTransaction>,
    pub unlocked: Vec<&'static Achievement>,
}

/// Apply a completed route to a user's account and stats.
///
/// Returns `None` if the route id was already processed; nothing is
/// changed in that case.
pub fn settle_route(
    account: PointsAccount,
    mut stats: UserStats,
    route: CompletedRoute,
    now: DateTime<Utc>,
) -> std::result::Result<Option<RouteSettlement>, LedgerError> {
    if !stats.update_from_route(&route, now) {
        return Ok(None);
    }

    let mut account = account;
    let mut transactions = Vec::new();

    if route.points_earned > 0 {
        let entry = account.award(
            route.points_earned,
            TransactionReason::RouteCompletion,
            format!("Completed {} route", route.candidate_id),
            Some(&route.id),
            now,
        )?;
        account = entry.account;
        transactions.push(entry.transaction);
    }

    let unlocked = achievements::newly_unlocked(&stats);
    for achievement in &unlocked {
        stats.unlocked_achievements.insert(achievement.id.to_string());

        let mut entry = account.award(
            achievement.points,
            TransactionReason::Achievement,
            format!("Achievement unlocked: {}", achievement.name),
            None,
            now,
        )?;
        // Each achievement unlocks once per user
        entry.transaction.id = format!(
            "{}-{}-{}",
            TransactionReason::Achievement.as_str(),
            route.user_id,
            achievement.id
        );
        account = entry.account;
        transactions.push(entry.transaction);
    }

    Ok(Some(RouteSettlement {
        route,
        account,
        stats,
        transactions,
        unlocked,
    }))
}

/// Stored id of a completed route. Client trip ids are scoped to the user.
pub fn route_id(user_id: &str, trip_id: Option<&str>) -> String {
    match trip_id {
        Some(trip) => format!("{}_{}", user_id, trip),
        None => uuid::Uuid::new_v4().to_string(),
    }
}

/// What the client reports when a trip ends.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode_sequence: Vec<TransportMode>,
    pub trip_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Result of a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionResult {
    pub route_id: String,
    pub points_earned: u32,
    pub balance: u64,
    pub achievements_unlocked: Vec<String>,
    pub already_processed: bool,
}

/// Build the history record for a reported trip from server-side data.
pub fn completed_route(
    menu: &RouteMenu,
    user_id: &str,
    request: &CompletionRequest,
    now: DateTime<Utc>,
) -> Result<CompletedRoute> {
    let candidate = menu
        .candidate_for(request.origin, request.destination, &request.mode_sequence)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown mode sequence: {}",
                mode_key(&request.mode_sequence)
            ))
        })?;

    let points = points::route_points(&candidate);
    Ok(CompletedRoute::from_candidate(
        route_id(user_id, request.trip_id.as_deref()),
        user_id,
        &candidate,
        points,
        request.started_at,
        now,
    ))
}

/// Route completion service.
#[derive(Clone)]
pub struct CommuteService {
    menu: Arc<RouteMenu>,
    db: FirestoreDb,
}

impl CommuteService {
    pub fn new(menu: Arc<RouteMenu>, db: FirestoreDb) -> Self {
        Self { menu, db }
    }

    /// Record a finished trip and award its points.
    pub async fn complete_route(
        &self,
        user_id: &str,
        request: CompletionRequest,
    ) -> Result<CompletionResult> {
        let now = Utc::now();
        let route = completed_route(&self.menu, user_id, &request, now)?;
        let route_id = route.id.clone();

        tracing::info!(
            user_id,
            route_id = %route_id,
            modes = %route.candidate_id,
            distance_km = route.distance_km,
            points = route.points_earned,
            "Completing route"
        );

        match self.db.complete_route_atomic(route, now).await? {
            Some(settlement) => {
                let achievements_unlocked: Vec<String> = settlement
                    .unlocked
                    .iter()
                    .map(|a| a.id.to_string())
                    .collect();
                if !achievements_unlocked.is_empty() {
                    tracing::info!(user_id, achievements = ?achievements_unlocked, "Unlocked achievements");
                }
                Ok(CompletionResult {
                    route_id,
                    points_earned: settlement.route.points_earned,
                    balance: settlement.account.balance,
                    achievements_unlocked,
                    already_processed: false,
                })
            }
            None => {
                tracing::debug!(user_id, route_id = %route_id, "Route already processed (idempotent skip)");
                let balance = self
                    .db
                    .get_account(user_id)
                    .await?
                    .map(|a| a.balance)
                    .unwrap_or(0);
                Ok(CompletionResult {
                    route_id,
                    points_earned: 0,
                    balance,
                    achievements_unlocked: Vec::new(),
                    already_processed: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;

    fn vienna() -> (Coordinate, Coordinate) {
        (
            Coordinate::new(48.2082, 16.3738).unwrap(),
            Coordinate::new(48.2208, 16.3500).unwrap(),
        )
    }

    fn request(modes: Vec<TransportMode>, trip_id: Option<&str>) -> CompletionRequest {
        let (origin, destination) = vienna();
        CompletionRequest {
            origin,
            destination,
            mode_sequence: modes,
            trip_id: trip_id.map(String::from),
            started_at: None,
        }
    }

    #[test]
    fn test_plan_routes() {
        let (o, d) = vienna();
        let allowed: HashSet<TransportMode> = [
            TransportMode::Walk,
            TransportMode::Bike,
            TransportMode::Bus,
            TransportMode::Train,
        ]
        .into_iter()
        .collect();

        let plan = plan_routes(&RouteMenu::default(), o, d, &allowed, 80.0).unwrap();
        assert_eq!(plan.routes.len(), 6);
        assert_eq!(plan.routes[0].id, "walk");
        assert_eq!(plan.recommendations.most_eco.id, "walk");
        assert_eq!(plan.recommendations.fastest.id, "bike+train");
    }

    #[test]
    fn test_plan_same_origin_and_destination() {
        let (o, _) = vienna();
        let allowed: HashSet<TransportMode> = [TransportMode::Walk, TransportMode::Bike]
            .into_iter()
            .collect();

        let plan = plan_routes(&RouteMenu::default(), o, o, &allowed, 80.0).unwrap();
        assert_eq!(plan.routes.len(), 2);
        assert!(plan.routes.iter().all(|r| r.distance_km == 0.0));
        assert!(plan.routes.iter().all(|r| r.duration_minutes > 0.0));
        assert_eq!(plan.recommendations.most_eco.id, "walk");
    }

    #[test]
    fn test_plan_rejects_bad_balance() {
        let (o, d) = vienna();
        let allowed: HashSet<TransportMode> = [TransportMode::Walk].into_iter().collect();
        assert_eq!(
            plan_routes(&RouteMenu::default(), o, d, &allowed, 120.0).unwrap_err(),
            ScoringError::InvalidEcoBalance(120.0)
        );
    }

    #[test]
    fn test_completed_route_uses_menu_values() {
        let route = completed_route(
            &RouteMenu::default(),
            "u1",
            &request(vec![TransportMode::Bike, TransportMode::Train], Some("t1")),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(route.id, "u1_t1");
        assert_eq!(route.eco_score, 88);
        assert_eq!(route.points_earned, 61);
    }

    #[test]
    fn test_completed_route_unknown_sequence() {
        let err = completed_route(
            &RouteMenu::default(),
            "u1",
            &request(vec![TransportMode::Car], None),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_first_settlement_awards_route_and_achievement() {
        let now = Utc::now();
        let route = completed_route(
            &RouteMenu::default(),
            "u1",
            &request(vec![TransportMode::Bike], Some("t1")),
            now,
        )
        .unwrap();
        let points = route.points_earned;

        let settlement = settle_route(PointsAccount::new("u1"), UserStats::default(), route, now)
            .unwrap()
            .unwrap();

        assert_eq!(settlement.transactions.len(), 2);
        assert_eq!(settlement.transactions[0].id, "route-completion-u1_t1");
        assert_eq!(settlement.transactions[1].reason, TransactionReason::Achievement);
        assert_eq!(settlement.transactions[1].id, "achievement-u1-first-journey");
        assert!(settlement
            .transactions
            .iter()
            .all(|t| t.kind == TransactionKind::Earn));
        assert_eq!(settlement.account.balance, u64::from(points) + 50);
        assert!(settlement.stats.unlocked_achievements.contains("first-journey"));
        assert_eq!(settlement.stats.route_points, u64::from(points));
    }

    #[test]
    fn test_settlement_is_idempotent() {
        let now = Utc::now();
        let route = completed_route(
            &RouteMenu::default(),
            "u1",
            &request(vec![TransportMode::Walk], Some("t1")),
            now,
        )
        .unwrap();

        let first = settle_route(
            PointsAccount::new("u1"),
            UserStats::default(),
            route.clone(),
            now,
        )
        .unwrap()
        .unwrap();
        let again = settle_route(first.account, first.stats, route, now).unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn test_zero_point_route_has_no_route_transaction() {
        let (o, _) = vienna();
        let route = completed_route(
            &RouteMenu::default(),
            "u1",
            &CompletionRequest {
                origin: o,
                destination: o,
                mode_sequence: vec![TransportMode::Walk],
                trip_id: None,
                started_at: None,
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(route.points_earned, 0);

        let settlement = settle_route(PointsAccount::new("u1"), UserStats::default(), route, Utc::now())
            .unwrap()
            .unwrap();
        // Only the first-journey bonus
        assert_eq!(settlement.transactions.len(), 1);
        assert_eq!(settlement.account.balance, 50);
    }
}
