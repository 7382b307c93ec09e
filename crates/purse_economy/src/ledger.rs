//! # Purse Token Ledger
//!
//! Arena of purse tokens indexed by id. Ids start at 1 and are never reused.
//!
//! A token moves through exactly one transition:
//!
//! ```text
//! Minted ──redeem──▶ Consumed (terminal)
//! ```
//!
//! Consumed tokens stay in the arena so their history can be inspected, but
//! they can no longer be transferred or redeemed.

use alloy_primitives::Address;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{PurseError, PurseResult};

/// Unique identifier of a purse token.
pub type TokenId = u64;

/// A minted purse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurseToken {
    /// Unique id, assigned at mint.
    pub id: TokenId,
    /// Current holder.
    pub owner: Address,
    /// Category index, fixed at mint.
    pub category: usize,
    /// True once redeemed.
    pub consumed: bool,
}

/// Ownership and consumption state of every purse token.
#[derive(Clone, Debug)]
pub struct TokenLedger {
    tokens: BTreeMap<TokenId, PurseToken>,
    /// Unconsumed token ids per holder.
    holdings: HashMap<Address, BTreeSet<TokenId>>,
    next_id: TokenId,
}

impl Default for TokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenLedger {
    /// Creates an empty ledger. The first minted id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: BTreeMap::new(),
            holdings: HashMap::new(),
            next_id: 1,
        }
    }

    /// Id the next minted token will receive.
    #[inline]
    #[must_use]
    pub const fn next_id(&self) -> TokenId {
        self.next_id
    }

    /// Number of tokens ever minted, consumed ones included.
    #[must_use]
    pub fn total_minted(&self) -> usize {
        self.tokens.len()
    }

    /// Looks up a token.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::UnknownToken`] if no token has this id.
    pub fn token(&self, id: TokenId) -> PurseResult<PurseToken> {
        self.tokens.get(&id).copied().ok_or(PurseError::UnknownToken(id))
    }

    /// Current holder of a token.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::UnknownToken`] if no token has this id.
    pub fn owner_of(&self, id: TokenId) -> PurseResult<Address> {
        self.token(id).map(|t| t.owner)
    }

    /// Number of unconsumed tokens held by `owner`.
    #[must_use]
    pub fn balance_of(&self, owner: Address) -> usize {
        self.holdings.get(&owner).map_or(0, BTreeSet::len)
    }

    /// Ids of unconsumed tokens held by `owner`, ascending.
    #[must_use]
    pub fn tokens_of(&self, owner: Address) -> Vec<TokenId> {
        self.holdings
            .get(&owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Allocates a new token for `owner` in `category`.
    pub(crate) fn issue(&mut self, owner: Address, category: usize) -> TokenId {
        let id = self.next_id;
        self.next_id += 1;
        self.tokens.insert(
            id,
            PurseToken {
                id,
                owner,
                category,
                consumed: false,
            },
        );
        self.holdings.entry(owner).or_default().insert(id);
        id
    }

    fn release(&mut self, owner: Address, id: TokenId) {
        if let Some(ids) = self.holdings.get_mut(&owner) {
            ids.remove(&id);
            if ids.is_empty() {
                self.holdings.remove(&owner);
            }
        }
    }

    /// Returns the token if `caller` may spend it.
    ///
    /// Consumption is checked before ownership: a consumed token reports
    /// [`PurseError::AlreadyConsumed`] to every caller.
    ///
    /// # Errors
    ///
    /// - [`PurseError::UnknownToken`] if no token has this id
    /// - [`PurseError::AlreadyConsumed`] if it was redeemed
    /// - [`PurseError::NotOwner`] if `caller` does not hold it
    pub fn spendable(&self, caller: Address, id: TokenId) -> PurseResult<PurseToken> {
        let token = self.token(id)?;
        if token.consumed {
            return Err(PurseError::AlreadyConsumed(id));
        }
        if token.owner != caller {
            return Err(PurseError::NotOwner {
                token_id: id,
                caller,
            });
        }
        Ok(token)
    }

    /// Moves an unconsumed token from `caller` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::InvalidRecipient`] for the zero address, or any
    /// error of [`TokenLedger::spendable`].
    pub fn transfer(&mut self, caller: Address, to: Address, id: TokenId) -> PurseResult<()> {
        if to == Address::ZERO {
            return Err(PurseError::InvalidRecipient);
        }
        self.spendable(caller, id)?;
        if let Some(token) = self.tokens.get_mut(&id) {
            token.owner = to;
        }
        self.release(caller, id);
        self.holdings.entry(to).or_default().insert(id);
        Ok(())
    }

    /// Marks a token consumed. The caller has already checked [`TokenLedger::spendable`].
    pub(crate) fn consume(&mut self, id: TokenId) {
        let Some(token) = self.tokens.get_mut(&id) else {
            return;
        };
        token.consumed = true;
        let owner = token.owner;
        self.release(owner, id);
    }
}
