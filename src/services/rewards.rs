// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Affiliate offer redemption.

use crate::models::{
    AffiliateOffer, PointsAccount, PointsTransaction, Redemption, RedemptionStatus,
    TransactionReason,
};
use crate::services::ledger::LedgerError;
use chrono::{DateTime, Duration, Utc};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 12;
const CODE_GROUP: usize = 4;

/// Everything a redemption changes, to be written in one transaction.
#[derive(Debug, Clone)]
pub struct RedemptionOutcome {
    pub account: PointsAccount,
    pub transaction: PointsTransaction,
    pub redemption: Redemption,
    /// Present when the offer's stock changed
    pub offer: Option<AffiliateOffer>,
}

/// Spend points on an offer and issue a code.
///
/// All checks happen before anything is built; on error the account and the
/// offer are unchanged.
pub fn redeem(
    account: PointsAccount,
    offer: &AffiliateOffer,
    now: DateTime<Utc>,
) -> Result<RedemptionOutcome, RewardError> {
    if !offer.active {
        return Err(RewardError::OfferInactive(offer.id.clone()));
    }
    if offer.stock == Some(0) {
        return Err(RewardError::OutOfStock(offer.id.clone()));
    }

    let redemption_id = uuid::Uuid::new_v4().to_string();
    let user_id = account.user_id.clone();
    let entry = account.spend(
        offer.points_cost,
        TransactionReason::Redemption,
        format!("Redeemed {} ({})", offer.title, offer.partner_name),
        Some(&offer.id),
        Some(&redemption_id),
        now,
    )?;

    let redemption = Redemption {
        id: redemption_id,
        user_id,
        offer_id: offer.id.clone(),
        offer_title: offer.title.clone(),
        partner_id: offer.partner_id.clone(),
        partner_name: offer.partner_name.clone(),
        points_spent: offer.points_cost,
        code: redemption_code(),
        status: RedemptionStatus::Active,
        redeemed_at: now,
        used_at: None,
        expires_at: now + Duration::days(i64::from(offer.expiry_days)),
    };

    let offer = offer.stock.map(|stock| AffiliateOffer {
        stock: Some(stock - 1),
        ..offer.clone()
    });

    Ok(RedemptionOutcome {
        account: entry.account,
        transaction: entry.transaction,
        redemption,
        offer,
    })
}

/// Mark an issued code as used at the partner.
pub fn mark_used(redemption: Redemption, now: DateTime<Utc>) -> Result<Redemption, RewardError> {
    match redemption.effective_status(now) {
        RedemptionStatus::Active => Ok(Redemption {
            status: RedemptionStatus::Used,
            used_at: Some(now),
            ..redemption
        }),
        status => Err(RewardError::RedemptionNotActive {
            id: redemption.id,
            status,
        }),
    }
}

/// Random `XXXX-XXXX-XXXX` code over A-Z0-9.
pub fn redemption_code() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let mut code = String::with_capacity(CODE_LENGTH + CODE_LENGTH / CODE_GROUP);
    for (i, b) in bytes.iter().take(CODE_LENGTH).enumerate() {
        if i > 0 && i % CODE_GROUP == 0 {
            code.push('-');
        }
        code.push(CODE_ALPHABET[usize::from(*b) % CODE_ALPHABET.len()] as char);
    }
    code
}

/// Errors from offer redemption.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RewardError {
    #[error("Offer {0} is not active")]
    OfferInactive(String),

    #[error("Offer {0} is out of stock")]
    OutOfStock(String),

    #[error("Redemption {id} is {status:?}")]
    RedemptionNotActive { id: String, status: RedemptionStatus },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
