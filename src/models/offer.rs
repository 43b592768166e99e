// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Affiliate offers and redemptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Discount,
    Voucher,
    Certificate,
}

/// A partner offer that can be bought with points.
///
/// Stored at: `affiliate_offers/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateOffer {
    pub id: String,
    pub partner_id: String,
    pub partner_name: String,
    pub title: String,
    pub description: String,
    pub points_cost: u32,
    /// Human-readable value, e.g. "€10 off"
    pub value: String,
    pub offer_type: OfferType,
    #[serde(default)]
    pub terms: String,
    /// How long an issued code stays valid
    pub expiry_days: u32,
    /// Remaining quantity; `None` means unlimited
    pub stock: Option<u32>,
    pub active: bool,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Active,
    Used,
    Expired,
}

/// An issued offer code.
///
/// Stored at: `redemptions/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    pub id: String,
    pub user_id: String,
    pub offer_id: String,
    pub offer_title: String,
    pub partner_id: String,
    pub partner_name: String,
    pub points_spent: u32,
    /// `XXXX-XXXX-XXXX`
    pub code: String,
    pub status: RedemptionStatus,
    pub redeemed_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl Redemption {
    /// Status as seen at `now`; an active code past its expiry reads as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> RedemptionStatus {
        if self.status == RedemptionStatus::Active && self.expires_at < now {
            RedemptionStatus::Expired
        } else {
            self.status
        }
    }
}
