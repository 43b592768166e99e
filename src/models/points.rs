// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Points ledger records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Direction of a transaction. The sign lives here, never in the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum TransactionKind {
    Earn,
    Spend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum TransactionReason {
    RouteCompletion,
    Redemption,
    Bonus,
    Achievement,
}

impl TransactionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionReason::RouteCompletion => "route-completion",
            TransactionReason::Redemption => "redemption",
            TransactionReason::Bonus => "bonus",
            TransactionReason::Achievement => "achievement",
        }
    }
}

/// Immutable, append-only ledger entry.
///
/// Stored at: `points_transactions/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PointsTransaction {
    pub id: String,
    pub user_id: String,
    pub kind: TransactionKind,
    /// Always > 0
    pub amount: u32,
    pub reason: TransactionReason,
    pub description: String,
    /// Set only on earn transactions
    pub route_id: Option<String>,
    /// Set only on spend transactions
    pub offer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Running balance for one user.
///
/// Stored at: `points_accounts/{user_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsAccount {
    pub user_id: String,
    #[serde(default)]
    pub balance: u64,
    #[serde(default)]
    pub total_earned: u64,
    #[serde(default)]
    pub total_spent: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PointsAccount {
    /// Empty account for a user that has never earned anything.
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            balance: 0,
            total_earned: 0,
            total_spent: 0,
            updated_at: None,
        }
    }

    /// Account with an opening balance, mostly useful for tests and imports.
    pub fn with_balance(user_id: &str, balance: u64) -> Self {
        Self {
            balance,
            total_earned: balance,
            ..Self::new(user_id)
        }
    }
}

/// Totals recomputed from a transaction list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PointsSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_earned: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_spent: u64,
    /// Signed so that a truncated or inconsistent log is visible
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub balance: i64,
    pub routes_completed: u32,
}

impl PointsSummary {
    pub fn from_transactions(transactions: &[PointsTransaction]) -> Self {
        let mut summary = Self::default();
        for t in transactions {
            match t.kind {
                TransactionKind::Earn => {
                    summary.total_earned += u64::from(t.amount);
                    if t.route_id.is_some() {
                        summary.routes_completed += 1;
                    }
                }
                TransactionKind::Spend => summary.total_spent += u64::from(t.amount),
            }
        }
        summary.balance = summary.total_earned as i64 - summary.total_spent as i64;
        summary
    }
}

/// One row of the points leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    /// 1-based
    pub rank: u32,
    pub user_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_earned: u64,
}

impl LeaderboardEntry {
    /// Number accounts that are already sorted by points earned.
    pub fn ranked(accounts: Vec<PointsAccount>) -> Vec<Self> {
        accounts
            .into_iter()
            .zip(1..)
            .map(|(account, rank)| Self {
                rank,
                user_id: account.user_id,
                total_earned: account.total_earned,
            })
            .collect()
    }
}
