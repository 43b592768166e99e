// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod coordinate;
pub mod offer;
pub mod points;
pub mod route;
pub mod stats;
pub mod transport;

pub use coordinate::{Coordinate, CoordinateInput};
pub use offer::{AffiliateOffer, OfferType, Redemption, RedemptionStatus};
pub use points::{
    LeaderboardEntry, PointsAccount, PointsSummary, PointsTransaction, TransactionKind,
    TransactionReason,
};
pub use route::{CompletedRoute, RouteCandidate, RouteLeg, RoutePreference, RouteRecommendations};
pub use stats::UserStats;
pub use transport::TransportMode;
