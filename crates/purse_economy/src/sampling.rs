//! # Weighted Sampling
//!
//! Pure selection functions. They take an immutable snapshot of weights and a
//! draw that was already produced by a [`Randomizer`](crate::randomness::Randomizer),
//! so they can be tested without a store or a randomness source.
//!
//! ## Bucket Selection
//!
//! ```text
//! weights:    [45, 25, 20, 7, 3]
//! cumulative: [45, 70, 90, 97, 100]
//! draw 44 -> 0   draw 45 -> 1   draw 97 -> 4   draw 100 -> none
//! ```
//!
//! The first bucket whose cumulative weight strictly exceeds the draw wins.
//! Zero-weight buckets can never be selected.

use crate::category::{Category, RewardDistribution, RewardKind, PERCENT_TOTAL};

/// Exclusive upper bound for every draw made by the engines.
#[allow(clippy::cast_possible_truncation)]
pub const DRAW_BOUND: u32 = PERCENT_TOTAL as u32;

/// Selects a bucket index from cumulative weights.
///
/// Returns `None` when `draw` is not below the total weight, including the
/// empty case.
#[must_use]
pub fn select_bucket<I>(weights: I, draw: u32) -> Option<usize>
where
    I: IntoIterator<Item = u32>,
{
    let draw = u64::from(draw);
    let mut cumulative = 0u64;

    for (index, weight) in weights.into_iter().enumerate() {
        cumulative += u64::from(weight);
        if draw < cumulative {
            return Some(index);
        }
    }

    None
}

/// Selects a category by rarity weight.
#[must_use]
pub fn select_category(categories: &[Category], draw: u32) -> Option<usize> {
    select_bucket(categories.iter().map(|c| c.rarity), draw)
}

/// Samples a reward quantity for one reward type.
///
/// A draw in `[0, 100)` below the distribution's percentage pays the full
/// amount, anything else pays zero.
#[inline]
#[must_use]
pub const fn sample_reward(distribution: RewardDistribution, draw: u32) -> u64 {
    if draw < distribution.percentage {
        distribution.amount
    } else {
        0
    }
}

/// Expected units of `kind` per redemption, in hundredths of a unit.
///
/// Used by reports to compare observed payouts with configured ones.
/// Saturates at `u64::MAX` for amounts near the top of the range.
#[must_use]
pub fn expected_reward_centi(category: &Category, kind: RewardKind) -> u64 {
    let distribution = category.reward(kind);
    u64::from(distribution.percentage).saturating_mul(distribution.amount)
}
