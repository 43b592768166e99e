// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Points bookkeeping.
//!
//! `award` and `spend` are pure transitions: they take an account by value
//! and hand back the updated account together with the transaction record to
//! append. Persisting both atomically is the caller's job (see
//! `FirestoreDb::complete_route_atomic` and `FirestoreDb::redeem_offer_atomic`).

use crate::models::{PointsAccount, PointsTransaction, TransactionKind, TransactionReason};
use chrono::{DateTime, Utc};

/// Result of a successful ledger operation.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub account: PointsAccount,
    pub transaction: PointsTransaction,
}

impl LedgerEntry {
    pub fn balance(&self) -> u64 {
        self.account.balance
    }
}

/// Transaction id: derived from the linked record when there is one, so a
/// retried write lands on the same document.
fn transaction_id(reason: TransactionReason, link: Option<&str>) -> String {
    match link {
        Some(id) => format!("{}-{}", reason.as_str(), id),
        None => format!("{}-{}", reason.as_str(), uuid::Uuid::new_v4()),
    }
}

impl PointsAccount {
    /// Credit `amount` points.
    pub fn award(
        self,
        amount: u32,
        reason: TransactionReason,
        description: impl Into<String>,
        linked_route_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let balance = self
            .balance
            .checked_add(u64::from(amount))
            .ok_or(LedgerError::BalanceOverflow)?;

        let transaction = PointsTransaction {
            id: transaction_id(reason, linked_route_id),
            user_id: self.user_id.clone(),
            kind: TransactionKind::Earn,
            amount,
            reason,
            description: description.into(),
            route_id: linked_route_id.map(String::from),
            offer_id: None,
            created_at: now,
        };

        let account = PointsAccount {
            balance,
            total_earned: self.total_earned.saturating_add(u64::from(amount)),
            updated_at: Some(now),
            ..self
        };

        Ok(LedgerEntry {
            account,
            transaction,
        })
    }

    /// Debit `amount` points.
    ///
    /// Fails with `InsufficientPoints` when the balance would go negative; in
    /// that case nothing is produced and the caller's account is untouched.
    pub fn spend(
        self,
        amount: u32,
        reason: TransactionReason,
        description: impl Into<String>,
        linked_offer_id: Option<&str>,
        link_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let balance = self
            .balance
            .checked_sub(u64::from(amount))
            .ok_or(LedgerError::InsufficientPoints {
                balance: self.balance,
                requested: amount,
            })?;

        let transaction = PointsTransaction {
            id: transaction_id(reason, link_key),
            user_id: self.user_id.clone(),
            kind: TransactionKind::Spend,
            amount,
            reason,
            description: description.into(),
            route_id: None,
            offer_id: linked_offer_id.map(String::from),
            created_at: now,
        };

        let account = PointsAccount {
            balance,
            total_spent: self.total_spent.saturating_add(u64::from(amount)),
            updated_at: Some(now),
            ..self
        };

        Ok(LedgerEntry {
            account,
            transaction,
        })
    }
}

/// Errors from ledger transitions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Transaction amount must be positive")]
    ZeroAmount,

    #[error("Insufficient points: balance {balance}, requested {requested}")]
    InsufficientPoints { balance: u64, requested: u32 },

    #[error("Points balance overflow")]
    BalanceOverflow,
}
