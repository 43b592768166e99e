// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod achievements;
pub mod commute;
pub mod distance;
pub mod emissions;
pub mod ledger;
pub mod points;
pub mod rail;
pub mod ranker;
pub mod rewards;
pub mod route_menu;

pub use commute::{CommuteService, CompletionRequest, CompletionResult, RoutePlan};
pub use ledger::{LedgerEntry, LedgerError};
pub use rewards::{RedemptionOutcome, RewardError};
pub use route_menu::{RouteMenu, RouteMenuError};
