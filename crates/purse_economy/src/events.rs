//! Events emitted by the purse facade, buffered in commit order.

use alloy_primitives::Address;

use crate::category::RewardKind;
use crate::ledger::TokenId;
use crate::rewards::RewardGrant;

/// A committed state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurseEvent {
    /// Ownership changed hands.
    OwnershipTransferred {
        /// Previous owner.
        previous: Address,
        /// New owner.
        new_owner: Address,
    },
    /// Minter role granted or revoked.
    MinterUpdated {
        /// Affected account.
        account: Address,
        /// True if the role is now held.
        enabled: bool,
    },
    /// Categories were appended.
    CategoriesAdded {
        /// Index of the first new category.
        first_index: usize,
        /// Number of categories appended.
        count: usize,
    },
    /// Every category was rewritten in place.
    CategoriesUpdated {
        /// Number of categories.
        count: usize,
    },
    /// A reward token type identifier changed.
    RewardTokenIdSet {
        /// Reward kind.
        kind: RewardKind,
        /// New token type.
        token_id: u64,
    },
    /// The randomness source was replaced.
    RandomizerSet {
        /// Address of the new source.
        randomizer: Address,
    },
    /// A purse was minted.
    PurseMinted {
        /// The new token.
        token_id: TokenId,
        /// Holder.
        owner: Address,
        /// Category drawn.
        category: usize,
    },
    /// A purse changed holder.
    PurseTransferred {
        /// The token.
        token_id: TokenId,
        /// Previous holder.
        from: Address,
        /// New holder.
        to: Address,
    },
    /// A purse was redeemed and consumed.
    PurseRedeemed {
        /// The token.
        token_id: TokenId,
        /// Holder credited with the rewards.
        owner: Address,
        /// Category of the purse.
        category: usize,
        /// Sampled rewards, zeros included.
        grants: [RewardGrant; 3],
    },
}
