// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Points accounts and the append-only transaction log
//! - Route history and user stats
//! - Affiliate offers and redemptions

use chrono::{DateTime, Utc};

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    AffiliateOffer, CompletedRoute, LeaderboardEntry, PointsAccount, PointsTransaction,
    Redemption, UserStats,
};
use crate::services::commute::{self, RouteSettlement};
use crate::services::rewards::{self, RedemptionOutcome};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Points Operations ───────────────────────────────────────

    /// Get the points account for a user.
    pub async fn get_account(&self, user_id: &str) -> Result<Option<PointsAccount>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::POINTS_ACCOUNTS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent transactions for a user, newest first.
    pub async fn get_transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<PointsTransaction>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::POINTS_TRANSACTIONS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Top accounts by total points earned.
    pub async fn get_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, AppError> {
        let accounts: Vec<PointsAccount> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POINTS_ACCOUNTS)
            .order_by([(
                "total_earned",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(LeaderboardEntry::ranked(accounts))
    }

    // ─── Route Operations ────────────────────────────────────────

    /// Completed routes for a user, newest first.
    pub async fn get_route_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<CompletedRoute>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ROUTES)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([(
                "completed_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set or clear the favorite flag on one of the user's routes.
    pub async fn set_route_favorite(
        &self,
        user_id: &str,
        route_id: &str,
        favorite: bool,
    ) -> Result<CompletedRoute, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let route: Option<CompletedRoute> = bound_to(client, &transaction)
            .fluent()
            .select()
            .by_id_in(collections::ROUTES)
            .obj()
            .one(route_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read route in transaction: {}", e))
            })?;

        let Some(mut route) = route.filter(|r| r.user_id == user_id) else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Route {}", route_id)));
        };
        route.favorite = favorite;

        client
            .fluent()
            .update()
            .in_col(collections::ROUTES)
            .document_id(&route.id)
            .object(&route)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add route to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(user_id, route_id, favorite, "Route favorite updated");
        Ok(route)
    }

    // ─── User Stats Operations ──────────────────────────────────

    /// Get user stats aggregate document.
    ///
    /// Stored in `user_stats` collection, keyed by user_id.
    pub async fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_STATS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Route Completion ────────────────────────────────

    /// Atomically record a completed route: history entry, earn transactions,
    /// points account and stats.
    ///
    /// If another request modifies the account or stats concurrently, Firestore
    /// rejects the commit instead of losing an update.
    ///
    /// Returns `None` if the route was already processed (idempotent duplicate).
    pub async fn complete_route_atomic(
        &self,
        route: CompletedRoute,
        now: DateTime<Utc>,
    ) -> Result<Option<RouteSettlement>, AppError> {
        let client = self.get_client()?;
        let user_id = route.user_id.clone();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Read current account and stats within the transaction
        //    This registers the documents for conflict detection
        let tx_client = bound_to(client, &transaction);
        let account: Option<PointsAccount> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::POINTS_ACCOUNTS)
            .obj()
            .one(&user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read account in transaction: {}", e))
            })?;
        let stats: Option<UserStats> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::USER_STATS)
            .obj()
            .one(&user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read stats in transaction: {}", e))
            })?;

        // 2. Apply in memory; `None` means the route id was already counted
        let settlement = match commute::settle_route(
            account.unwrap_or_else(|| PointsAccount::new(&user_id)),
            stats.unwrap_or_default(),
            route,
            now,
        ) {
            Ok(Some(settlement)) => settlement,
            Ok(None) => {
                let _ = transaction.rollback().await;
                return Ok(None);
            }
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e.into());
            }
        };

        // 3. Queue all writes
        client
            .fluent()
            .update()
            .in_col(collections::ROUTES)
            .document_id(&settlement.route.id)
            .object(&settlement.route)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add route to transaction: {}", e))
            })?;

        for points_tx in &settlement.transactions {
            client
                .fluent()
                .update()
                .in_col(collections::POINTS_TRANSACTIONS)
                .document_id(&points_tx.id)
                .object(points_tx)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add points transaction to transaction: {}",
                        e
                    ))
                })?;
        }

        client
            .fluent()
            .update()
            .in_col(collections::POINTS_ACCOUNTS)
            .document_id(&user_id)
            .object(&settlement.account)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add account to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::USER_STATS)
            .document_id(&user_id)
            .object(&settlement.stats)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add stats to transaction: {}", e))
            })?;

        // 4. Commit
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %user_id,
            route_id = %settlement.route.id,
            balance = settlement.account.balance,
            transactions = settlement.transactions.len(),
            "Route completion stored atomically"
        );

        Ok(Some(settlement))
    }

    // ─── Offer Operations ────────────────────────────────────────

    /// Active offers, cheapest first, optionally limited to one category.
    pub async fn list_offers(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<AffiliateOffer>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::AFFILIATE_OFFERS)
            .filter(|q| {
                q.for_all([
                    q.field("active").eq(true),
                    category.and_then(|c| q.field("category").eq(c)),
                ])
            })
            .order_by([(
                "points_cost",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_offer(&self, offer_id: &str) -> Result<Option<AffiliateOffer>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::AFFILIATE_OFFERS)
            .obj()
            .one(offer_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update an offer (partner onboarding, seeding).
    pub async fn upsert_offer(&self, offer: &AffiliateOffer) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::AFFILIATE_OFFERS)
            .document_id(&offer.id)
            .object(offer)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Redemption Operations ───────────────────────────────────

    /// Redemptions for a user, newest first.
    pub async fn get_redemptions(&self, user_id: &str) -> Result<Vec<Redemption>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REDEMPTIONS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([(
                "redeemed_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically spend points on an offer: redemption record, spend
    /// transaction, account and (for limited offers) stock.
    pub async fn redeem_offer_atomic(
        &self,
        user_id: &str,
        offer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RedemptionOutcome, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_client = bound_to(client, &transaction);
        let offer: Option<AffiliateOffer> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::AFFILIATE_OFFERS)
            .obj()
            .one(offer_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read offer in transaction: {}", e))
            })?;
        let Some(offer) = offer else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Offer {}", offer_id)));
        };

        let account: Option<PointsAccount> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::POINTS_ACCOUNTS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read account in transaction: {}", e))
            })?;

        let outcome = match rewards::redeem(
            account.unwrap_or_else(|| PointsAccount::new(user_id)),
            &offer,
            now,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e.into());
            }
        };

        client
            .fluent()
            .update()
            .in_col(collections::REDEMPTIONS)
            .document_id(&outcome.redemption.id)
            .object(&outcome.redemption)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add redemption to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::POINTS_TRANSACTIONS)
            .document_id(&outcome.transaction.id)
            .object(&outcome.transaction)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add points transaction to transaction: {}",
                    e
                ))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::POINTS_ACCOUNTS)
            .document_id(user_id)
            .object(&outcome.account)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add account to transaction: {}", e))
            })?;

        if let Some(offer) = &outcome.offer {
            client
                .fluent()
                .update()
                .in_col(collections::AFFILIATE_OFFERS)
                .document_id(&offer.id)
                .object(offer)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add offer to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id,
            offer_id,
            redemption_id = %outcome.redemption.id,
            points = outcome.redemption.points_spent,
            balance = outcome.account.balance,
            "Offer redeemed"
        );

        Ok(outcome)
    }

    /// Mark one of the user's redemptions as used.
    ///
    /// The status check and the write share a transaction, so two concurrent
    /// requests cannot both use the same code.
    pub async fn mark_redemption_used(
        &self,
        user_id: &str,
        redemption_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Redemption, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let redemption: Option<Redemption> = bound_to(client, &transaction)
            .fluent()
            .select()
            .by_id_in(collections::REDEMPTIONS)
            .obj()
            .one(redemption_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read redemption in transaction: {}", e))
            })?;

        // Other users' redemptions look the same as missing ones
        let Some(redemption) = redemption.filter(|r| r.user_id == user_id) else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Redemption {}", redemption_id)));
        };

        let used = match rewards::mark_used(redemption, now) {
            Ok(used) => used,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e.into());
            }
        };

        client
            .fluent()
            .update()
            .in_col(collections::REDEMPTIONS)
            .document_id(&used.id)
            .object(&used)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add redemption to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(user_id, redemption_id, "Redemption marked used");
        Ok(used)
    }
}

/// Client whose reads run inside `transaction`, so a concurrent write to a
/// document read here makes the commit fail instead of being overwritten.
fn bound_to(
    client: &firestore::FirestoreDb,
    transaction: &firestore::FirestoreTransaction<'_>,
) -> firestore::FirestoreDb {
    client.clone_with_consistency_selector(firestore::FirestoreConsistencySelector::Transaction(
        transaction.transaction_id().clone(),
    ))
}
