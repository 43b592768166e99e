// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and are skipped
//! when FIRESTORE_EMULATOR_HOST is not set.

use chrono::Utc;
use greencommute::error::AppError;
use greencommute::models::{
    AffiliateOffer, Coordinate, OfferType, RedemptionStatus, TransactionKind, TransportMode,
};
use greencommute::services::commute::{completed_route, CompletionRequest};
use greencommute::services::{CommuteService, LedgerError, RewardError, RouteMenu};
use std::sync::Arc;

mod common;
use common::{test_db, unique_id};

fn bike_trip(trip_id: &str) -> CompletionRequest {
    CompletionRequest {
        origin: Coordinate::new(48.2082, 16.3738).unwrap(),
        destination: Coordinate::new(48.2208, 16.3500).unwrap(),
        mode_sequence: vec![TransportMode::Bike],
        trip_id: Some(trip_id.to_string()),
        started_at: None,
    }
}

fn test_offer(id: &str, cost: u32, stock: Option<u32>) -> AffiliateOffer {
    AffiliateOffer {
        id: id.to_string(),
        partner_id: "partner-1".to_string(),
        partner_name: "Radhaus".to_string(),
        title: "Bike service".to_string(),
        description: "Basic tune-up".to_string(),
        points_cost: cost,
        value: "€15".to_string(),
        offer_type: OfferType::Voucher,
        terms: String::new(),
        expiry_days: 30,
        stock,
        active: true,
        category: Some("mobility".to_string()),
        image_url: None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUTE COMPLETION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_complete_route_is_atomic_and_idempotent() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("user");
    let service = CommuteService::new(Arc::new(RouteMenu::default()), db.clone());

    let first = service
        .complete_route(&user_id, bike_trip("trip-1"))
        .await
        .unwrap();
    assert!(!first.already_processed);
    assert!(first.points_earned > 0);
    assert_eq!(first.achievements_unlocked, vec!["first-journey".to_string()]);
    assert_eq!(first.balance, u64::from(first.points_earned) + 50);

    // Retrying the same trip changes nothing
    let retry = service
        .complete_route(&user_id, bike_trip("trip-1"))
        .await
        .unwrap();
    assert!(retry.already_processed);
    assert_eq!(retry.balance, first.balance);

    let account = db.get_account(&user_id).await.unwrap().unwrap();
    assert_eq!(account.balance, first.balance);

    let stats = db.get_user_stats(&user_id).await.unwrap().unwrap();
    assert_eq!(stats.total_routes, 1);
    assert_eq!(stats.legs_for(TransportMode::Bike), 1);

    let history = db.get_route_history(&user_id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].points_earned, first.points_earned);

    let transactions = db.get_transactions(&user_id, 10).await.unwrap();
    assert_eq!(transactions.len(), 2);
    assert!(transactions.iter().all(|t| t.kind == TransactionKind::Earn));
}

#[tokio::test]
async fn test_favorite_flag_shows_in_history() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("user");
    let service = CommuteService::new(Arc::new(RouteMenu::default()), db.clone());
    let done = service
        .complete_route(&user_id, bike_trip("trip-1"))
        .await
        .unwrap();

    let route = db
        .set_route_favorite(&user_id, &done.route_id, true)
        .await
        .unwrap();
    assert!(route.favorite);

    let history = db.get_route_history(&user_id, 10).await.unwrap();
    assert!(history[0].favorite);

    // Another user's route is not visible
    let err = db
        .set_route_favorite("someone-else", &done.route_id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_settlement_read_directly() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("user");
    let route = completed_route(&RouteMenu::default(), &user_id, &bike_trip("t"), Utc::now())
        .unwrap();

    let settled = db
        .complete_route_atomic(route.clone(), Utc::now())
        .await
        .unwrap();
    assert!(settled.is_some());
    assert!(db
        .complete_route_atomic(route, Utc::now())
        .await
        .unwrap()
        .is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// REDEMPTIONS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_redeem_offer_flow() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("user");
    let service = CommuteService::new(Arc::new(RouteMenu::default()), db.clone());
    let earned = service
        .complete_route(&user_id, bike_trip("trip-1"))
        .await
        .unwrap();

    let offer_id = unique_id("offer");
    db.upsert_offer(&test_offer(&offer_id, 100, Some(1)))
        .await
        .unwrap();

    let outcome = db
        .redeem_offer_atomic(&user_id, &offer_id, Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome.account.balance, earned.balance - 100);
    assert_eq!(outcome.redemption.status, RedemptionStatus::Active);

    let offer = db.get_offer(&offer_id).await.unwrap().unwrap();
    assert_eq!(offer.stock, Some(0));

    // Stock exhausted
    let err = db
        .redeem_offer_atomic(&user_id, &offer_id, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Reward(RewardError::OutOfStock(_))));

    let used = db
        .mark_redemption_used(&user_id, &outcome.redemption.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(used.status, RedemptionStatus::Used);

    // Someone else's redemption is not visible
    let err = db
        .mark_redemption_used("someone-else", &outcome.redemption.id, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_redeem_without_points_leaves_account_untouched() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("user");
    let offer_id = unique_id("offer");
    db.upsert_offer(&test_offer(&offer_id, 500, None))
        .await
        .unwrap();

    let err = db
        .redeem_offer_atomic(&user_id, &offer_id, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Reward(RewardError::Ledger(LedgerError::InsufficientPoints {
            balance: 0,
            requested: 500
        }))
    ));

    assert!(db.get_account(&user_id).await.unwrap().is_none());
    assert!(db.get_redemptions(&user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_offer_is_not_found() {
    require_emulator!();

    let db = test_db().await;
    let err = db
        .redeem_offer_atomic(&unique_id("user"), "no-such-offer", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_concurrent_use_of_redemption_succeeds_once() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_id("user");
    let service = CommuteService::new(Arc::new(RouteMenu::default()), db.clone());
    service
        .complete_route(&user_id, bike_trip("trip-1"))
        .await
        .unwrap();

    let offer_id = unique_id("offer");
    db.upsert_offer(&test_offer(&offer_id, 50, None))
        .await
        .unwrap();
    let outcome = db
        .redeem_offer_atomic(&user_id, &offer_id, Utc::now())
        .await
        .unwrap();

    let mut handles = vec![];
    for _ in 0..2 {
        let db = db.clone();
        let user_id = user_id.clone();
        let redemption_id = outcome.redemption.id.clone();
        handles.push(tokio::spawn(async move {
            db.mark_redemption_used(&user_id, &redemption_id, Utc::now())
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);

    let redemptions = db.get_redemptions(&user_id).await.unwrap();
    assert_eq!(redemptions[0].status, RedemptionStatus::Used);
}
