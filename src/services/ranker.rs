// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Eco/speed ranking of route candidates.

use crate::error::ScoringError;
use crate::models::{RouteCandidate, RouteRecommendations};

/// Eco/speed balance used for the "balanced" recommendation.
pub const BALANCED_ECO_BALANCE: f64 = 50.0;

/// Blended score: eco-score weighted by `eco_balance`, inverse duration by
/// the remainder.
pub fn score(candidate: &RouteCandidate, eco_balance: f64) -> f64 {
    f64::from(candidate.eco_score) * (eco_balance / 100.0)
        + (1.0 / candidate.duration_minutes) * (100.0 - eco_balance)
}

/// Order candidates by descending score.
///
/// The sort is stable, so candidates with equal scores keep their input
/// order and ranking an already ranked list is a no-op.
///
/// Fails with `DegenerateDuration` if any candidate has a non-positive or
/// non-finite duration. The whole list is rejected in that case; nothing is
/// ranked and no candidate is dropped or clamped.
pub fn rank(
    mut candidates: Vec<RouteCandidate>,
    eco_balance: f64,
) -> Result<Vec<RouteCandidate>, ScoringError> {
    if !eco_balance.is_finite() || !(0.0..=100.0).contains(&eco_balance) {
        return Err(ScoringError::InvalidEcoBalance(eco_balance));
    }
    if let Some(bad) = candidates
        .iter()
        .find(|c| !(c.duration_minutes.is_finite() && c.duration_minutes > 0.0))
    {
        return Err(ScoringError::DegenerateDuration {
            route_id: bad.id.clone(),
        });
    }

    candidates.sort_by(|a, b| score(b, eco_balance).total_cmp(&score(a, eco_balance)));
    Ok(candidates)
}

/// Pick the greenest, fastest and balanced options from a candidate list.
///
/// Returns `None` for an empty list.
pub fn recommend(candidates: &[RouteCandidate]) -> Option<RouteRecommendations> {
    let first = candidates.first()?;

    // Strict comparisons keep the earliest candidate on ties
    let most_eco = candidates
        .iter()
        .fold(first, |best, c| if c.eco_score > best.eco_score { c } else { best });
    let fastest = candidates.iter().fold(first, |best, c| {
        if c.duration_minutes < best.duration_minutes {
            c
        } else {
            best
        }
    });
    let balanced = candidates.iter().fold(first, |best, c| {
        if score(c, BALANCED_ECO_BALANCE) > score(best, BALANCED_ECO_BALANCE) {
            c
        } else {
            best
        }
    });

    Some(RouteRecommendations {
        most_eco: most_eco.clone(),
        fastest: fastest.clone(),
        balanced: balanced.clone(),
    })
}
