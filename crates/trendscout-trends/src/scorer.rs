//! Multi-factor trend score.
//!
//! Four additive components whose maxima sum to 100:
//!
//! | Component   | Max | Signal                                   |
//! |-------------|-----|------------------------------------------|
//! | interest    | 40  | search-interest velocity + volume        |
//! | recency     | 30  | best-seller rank                         |
//! | price       | 20  | distance from the 25-75 sweet spot       |
//! | competition | 10  | inverse of current search volume         |
//!
//! Missing data never errors: each component has a neutral value.

use serde::Serialize;
use trendscout_core::{InterestSummary, RawListing};

/// Interest credit for a listing with no usable interest data: it is a
/// best seller, so it gets something.
pub const NEUTRAL_INTEREST: f64 = 10.0;
pub const NEUTRAL_COMPETITION: f64 = 5.0;
pub const UNKNOWN_RANK_RECENCY: f64 = 20.0;
pub const UNKNOWN_PRICE: f64 = 10.0;

const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub interest: f64,
    pub recency: f64,
    pub price: f64,
    pub competition: f64,
    /// Sum of the components, clamped to `[0, 100]`.
    pub total: f64,
}

/// Scores `listing`, using `interest` only when it carries real data.
#[must_use]
pub fn score(listing: &RawListing, interest: Option<&InterestSummary>) -> f64 {
    score_breakdown(listing, interest).total
}

#[must_use]
pub fn score_breakdown(listing: &RawListing, interest: Option<&InterestSummary>) -> ScoreBreakdown {
    let interest = InterestSummary::with_data(interest);

    let interest_part = interest.map_or(NEUTRAL_INTEREST, |i| {
        velocity_points(i.velocity) + volume_points(i.current_volume)
    });
    let recency = recency_points(listing.rank);
    let price = price_points(listing.price);
    let competition = interest.map_or(NEUTRAL_COMPETITION, |i| {
        competition_points(i.current_volume)
    });

    let total = (interest_part + recency + price + competition).clamp(0.0, MAX_SCORE);

    ScoreBreakdown {
        interest: interest_part,
        recency,
        price,
        competition,
        total,
    }
}

fn velocity_points(velocity: f64) -> f64 {
    if velocity > 100.0 {
        25.0
    } else if velocity > 50.0 {
        20.0
    } else if velocity > 20.0 {
        15.0
    } else if velocity > 0.0 {
        10.0
    } else {
        // Also covers NaN.
        5.0
    }
}

fn volume_points(volume: i32) -> f64 {
    match volume {
        v if v > 75 => 15.0,
        v if v > 50 => 12.0,
        v if v > 25 => 8.0,
        v if v > 10 => 5.0,
        _ => 2.0,
    }
}

fn recency_points(rank: Option<u32>) -> f64 {
    match rank {
        None => UNKNOWN_RANK_RECENCY,
        Some(r) if r <= 10 => 30.0,
        Some(r) if r <= 25 => 25.0,
        Some(r) if r <= 50 => 20.0,
        Some(_) => 15.0,
    }
}

fn price_points(price: Option<f64>) -> f64 {
    let Some(p) = price else {
        return UNKNOWN_PRICE;
    };
    if (25.0..=75.0).contains(&p) {
        20.0
    } else if (15.0..25.0).contains(&p) || (p > 75.0 && p <= 150.0) {
        15.0
    } else if (10.0..15.0).contains(&p) || (p > 150.0 && p <= 200.0) {
        10.0
    } else {
        5.0
    }
}

fn competition_points(volume: i32) -> f64 {
    match volume {
        v if v < 30 => 10.0,
        v if v < 60 => 7.0,
        v if v < 85 => 4.0,
        _ => 2.0,
    }
}

/// Rounds to two decimal places for storage and display.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
