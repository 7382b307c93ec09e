//! # Mint Engine
//!
//! ```text
//! mint(caller, to, quantity)
//!   1. Minter check
//!   2. Draw one value in [0, 100) per unit   <- may block / fail, nothing mutated yet
//!   3. Weighted-bucket selection per draw
//!   4. Commit: bump minted counters, allocate ids, assign ownership
//! ```
//!
//! Units are drawn independently. A batch of 100 approximates the configured
//! rarity weights but is not partitioned proportionally.

use alloy_primitives::Address;

use crate::access::AccessControl;
use crate::category::{Category, CategoryRegistry};
use crate::error::{PurseError, PurseResult};
use crate::ledger::{TokenId, TokenLedger};
use crate::randomness::Randomizer;
use crate::sampling::{select_category, DRAW_BOUND};

/// A purse created by a mint call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintedPurse {
    /// The new token.
    pub token_id: TokenId,
    /// Category it was drawn into.
    pub category: usize,
}

/// Draws a category for each of `quantity` units without touching any state.
///
/// # Errors
///
/// - [`PurseError::InvalidQuantity`] if `quantity` is zero
/// - [`PurseError::NoCategories`] if `categories` is empty
/// - [`PurseError::Randomness`] if a draw fails
pub fn draw_categories(
    categories: &[Category],
    randomizer: &mut dyn Randomizer,
    quantity: u32,
) -> PurseResult<Vec<usize>> {
    if quantity == 0 {
        return Err(PurseError::InvalidQuantity);
    }
    if categories.is_empty() {
        return Err(PurseError::NoCategories);
    }

    (0..quantity)
        .map(|_| {
            let draw = randomizer.next_below(DRAW_BOUND)?;
            // The registry keeps weights summing to DRAW_BOUND, so every draw lands.
            select_category(categories, draw).ok_or(PurseError::NoCategories)
        })
        .collect()
}

/// Mints `quantity` purses for `to`.
///
/// All draws are taken before anything is committed; on error neither the
/// registry nor the ledger changes.
///
/// # Errors
///
/// - [`PurseError::Unauthorized`] unless `caller` is a minter
/// - any error of [`draw_categories`]
pub fn mint(
    access: &AccessControl,
    registry: &mut CategoryRegistry,
    ledger: &mut TokenLedger,
    randomizer: &mut dyn Randomizer,
    caller: Address,
    to: Address,
    quantity: u32,
) -> PurseResult<Vec<MintedPurse>> {
    access.ensure_minter(caller)?;
    if to == Address::ZERO {
        return Err(PurseError::InvalidRecipient);
    }

    let picks = draw_categories(registry.categories(), randomizer, quantity)?;

    Ok(picks
        .into_iter()
        .map(|category| {
            registry.record_mint(category);
            MintedPurse {
                token_id: ledger.issue(to, category),
                category,
            }
        })
        .collect())
}
