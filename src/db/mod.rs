//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// Balance documents (keyed by user_id)
    pub const POINTS_ACCOUNTS: &str = "points_accounts";
    pub const POINTS_TRANSACTIONS: &str = "points_transactions";
    /// Completed routes (route history)
    pub const ROUTES: &str = "routes";
    /// User stats aggregates (keyed by user_id)
    pub const USER_STATS: &str = "user_stats";
    pub const AFFILIATE_OFFERS: &str = "affiliate_offers";
    pub const REDEMPTIONS: &str = "redemptions";
}
