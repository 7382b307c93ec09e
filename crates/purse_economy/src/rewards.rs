//! # Reward Issuance
//!
//! Redemption hands its grants to a [`RewardIssuer`]. The issuer owns reward
//! token balances and metadata; the purse only decides how much of which type.
//!
//! [`RewardShop`] is an in-memory multi-token balance book that implements the
//! issuer contract. A batch is credited entirely or not at all.

use alloy_primitives::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::category::RewardKind;
use crate::error::IssuanceError;

/// Reward token type identifiers, set by the purse owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTokenIds {
    /// Token type credited for food rewards.
    pub food: u64,
    /// Token type credited for leveling potion rewards.
    pub leveling_potion: u64,
    /// Token type credited for lottery ticket rewards.
    pub lottery_ticket: u64,
}

impl Default for RewardTokenIds {
    fn default() -> Self {
        Self {
            food: 0,
            leveling_potion: 1,
            lottery_ticket: 2,
        }
    }
}

impl RewardTokenIds {
    /// Token type for a reward kind.
    #[inline]
    #[must_use]
    pub const fn get(&self, kind: RewardKind) -> u64 {
        match kind {
            RewardKind::Food => self.food,
            RewardKind::LevelingPotion => self.leveling_potion,
            RewardKind::LotteryTicket => self.lottery_ticket,
        }
    }

    /// Replaces the token type for a reward kind, returning the previous one.
    pub fn set(&mut self, kind: RewardKind, token_id: u64) -> u64 {
        let slot = match kind {
            RewardKind::Food => &mut self.food,
            RewardKind::LevelingPotion => &mut self.leveling_potion,
            RewardKind::LotteryTicket => &mut self.lottery_ticket,
        };
        std::mem::replace(slot, token_id)
    }
}

/// One sampled reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardGrant {
    /// Which reward this is.
    pub kind: RewardKind,
    /// Reward token type to credit.
    pub token_id: u64,
    /// Units to credit, possibly zero.
    pub amount: u64,
}

/// Credits reward tokens to accounts.
pub trait RewardIssuer: Send + Sync {
    /// Credits every grant in `grants` to `to`.
    ///
    /// Implementations must apply the whole batch or nothing.
    ///
    /// [`Purse::redeem`](crate::purse::Purse::redeem) calls this while holding
    /// the purse's write lock, which is not reentrant. An issuer must not call
    /// back into the same [`Purse`](crate::purse::Purse), or it deadlocks.
    ///
    /// # Errors
    ///
    /// Returns [`IssuanceError`] if the batch was not applied.
    fn issue(&self, to: Address, grants: &[RewardGrant]) -> Result<(), IssuanceError>;
}

impl<T: RewardIssuer + ?Sized> RewardIssuer for Arc<T> {
    fn issue(&self, to: Address, grants: &[RewardGrant]) -> Result<(), IssuanceError> {
        (**self).issue(to, grants)
    }
}

/// In-memory reward token balances.
///
/// `RewardShop` is `Send + Sync`; share it with `Arc` to keep a handle for
/// balance queries after giving it to a purse.
#[derive(Debug, Default)]
pub struct RewardShop {
    /// Registered token types and their metadata URI.
    token_types: RwLock<HashMap<u64, String>>,
    /// Balances keyed by (account, token type).
    balances: RwLock<HashMap<(Address, u64), u64>>,
}

impl RewardShop {
    /// Creates a shop with no token types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a shop with the three default reward types registered.
    #[must_use]
    pub fn with_default_types() -> Self {
        let shop = Self::new();
        let ids = RewardTokenIds::default();
        shop.register_token_type(ids.food, "ANTFoodURI");
        shop.register_token_type(ids.leveling_potion, "LevelingPotionsURI");
        shop.register_token_type(ids.lottery_ticket, "LotteryTicketURI");
        shop
    }

    /// Registers or re-labels a token type.
    pub fn register_token_type(&self, token_id: u64, uri: impl Into<String>) {
        self.token_types.write().insert(token_id, uri.into());
    }

    /// Metadata URI of a token type.
    #[must_use]
    pub fn token_uri(&self, token_id: u64) -> Option<String> {
        self.token_types.read().get(&token_id).cloned()
    }

    /// Balance of `account` in token type `token_id`.
    #[must_use]
    pub fn balance_of(&self, account: Address, token_id: u64) -> u64 {
        self.balances
            .read()
            .get(&(account, token_id))
            .copied()
            .unwrap_or(0)
    }
}

impl RewardIssuer for RewardShop {
    fn issue(&self, to: Address, grants: &[RewardGrant]) -> Result<(), IssuanceError> {
        let types = self.token_types.read();
        if let Some(unknown) = grants.iter().find(|g| !types.contains_key(&g.token_id)) {
            return Err(IssuanceError::UnknownTokenType(unknown.token_id));
        }

        let mut balances = self.balances.write();

        // Stage every new balance first so an overflow credits nothing.
        let mut staged: HashMap<u64, u64> = HashMap::new();
        for grant in grants {
            let current = match staged.get(&grant.token_id) {
                Some(&value) => value,
                None => balances.get(&(to, grant.token_id)).copied().unwrap_or(0),
            };
            let next = current
                .checked_add(grant.amount)
                .ok_or_else(|| IssuanceError::Rejected(format!("balance overflow for token {}", grant.token_id)))?;
            staged.insert(grant.token_id, next);
        }

        for (token_id, balance) in staged {
            balances.insert((to, token_id), balance);
        }
        Ok(())
    }
}
