//! # Redemption Engine
//!
//! ```text
//! redeem(caller, token)
//!   1. Token exists, unconsumed, held by caller
//!   2. One draw per reward kind: Food, LevelingPotion, LotteryTicket
//!   3. Issue the non-zero grants in one batch      <- may fail, token untouched
//!   4. Consume
//! ```
//!
//! Each reward kind pays its full amount with probability `percentage / 100`.

use alloy_primitives::Address;

use crate::category::{CategoryRegistry, RewardKind};
use crate::error::PurseResult;
use crate::ledger::{TokenId, TokenLedger};
use crate::randomness::Randomizer;
use crate::rewards::{RewardGrant, RewardIssuer, RewardTokenIds};
use crate::sampling::{sample_reward, DRAW_BOUND};

/// Outcome of a successful redemption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Redemption {
    /// The consumed purse.
    pub token_id: TokenId,
    /// Holder credited with the rewards.
    pub owner: Address,
    /// Category of the purse.
    pub category: usize,
    /// One grant per reward kind in [`RewardKind::ALL`] order, zeros included.
    pub grants: [RewardGrant; 3],
}

impl Redemption {
    /// Grants that actually pay out.
    pub fn paid(&self) -> impl Iterator<Item = &RewardGrant> {
        self.grants.iter().filter(|g| g.amount > 0)
    }

    /// Amount granted for a reward kind.
    #[must_use]
    pub const fn amount(&self, kind: RewardKind) -> u64 {
        self.grants[kind.index()].amount
    }
}

/// Redeems `token_id` for `caller`.
///
/// The token is consumed only after the issuer accepted the grants.
///
/// # Errors
///
/// - [`crate::PurseError::UnknownToken`], [`crate::PurseError::AlreadyConsumed`],
///   [`crate::PurseError::NotOwner`] from the ledger
/// - [`crate::PurseError::Randomness`] if a draw fails
/// - [`crate::PurseError::Issuance`] if the issuer rejects the batch
pub fn redeem(
    registry: &CategoryRegistry,
    ledger: &mut TokenLedger,
    randomizer: &mut dyn Randomizer,
    issuer: &dyn RewardIssuer,
    reward_ids: &RewardTokenIds,
    caller: Address,
    token_id: TokenId,
) -> PurseResult<Redemption> {
    let token = ledger.spendable(caller, token_id)?;
    let category = registry.category(token.category)?;

    let mut grants = [RewardGrant {
        kind: RewardKind::Food,
        token_id: 0,
        amount: 0,
    }; 3];
    for (slot, kind) in grants.iter_mut().zip(RewardKind::ALL) {
        let draw = randomizer.next_below(DRAW_BOUND)?;
        *slot = RewardGrant {
            kind,
            token_id: reward_ids.get(kind),
            amount: sample_reward(category.reward(kind), draw),
        };
    }

    let paid: Vec<RewardGrant> = grants.iter().copied().filter(|g| g.amount > 0).collect();
    if !paid.is_empty() {
        issuer.issue(token.owner, &paid)?;
    }

    ledger.consume(token_id);

    Ok(Redemption {
        token_id,
        owner: token.owner,
        category: token.category,
        grants,
    })
}
