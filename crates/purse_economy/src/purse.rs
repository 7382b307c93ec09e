//! # Purse
//!
//! The single entry point for purse minting, redemption and configuration.
//!
//! ```text
//! Marketplace ──mint()──▶ Purse ──next_below()──▶ Randomizer
//!                          │
//! Holder ─────redeem()────▶│──issue()──────────▶ RewardIssuer
//!                          │
//!                          ▼
//!                   drain_events()
//! ```
//!
//! ## Thread Safety
//!
//! `Purse` is `Send + Sync`. All state lives in one `parking_lot::RwLock`;
//! every mutation holds the write lock from validation to commit, including
//! the blocking randomness draws and the reward issuance call. Readers see
//! either the state before a mutation or after it.
//!
//! Events are pushed while the write lock is still held, so the buffer is in
//! commit order.

use alloy_primitives::Address;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::access::AccessControl;
use crate::category::{Category, CategoryBatch, CategoryRegistry, RewardKind};
use crate::config::PurseConfig;
use crate::error::PurseResult;
use crate::events::PurseEvent;
use crate::ledger::{PurseToken, TokenId, TokenLedger};
use crate::mint;
use crate::randomness::Randomizer;
use crate::redeem::{self, Redemption};
use crate::rewards::{RewardIssuer, RewardTokenIds};

/// Everything guarded by the purse lock.
struct PurseState {
    access: AccessControl,
    registry: CategoryRegistry,
    ledger: TokenLedger,
    reward_ids: RewardTokenIds,
    randomizer: Box<dyn Randomizer>,
    issuer: Arc<dyn RewardIssuer>,
}

/// Rarity-weighted purse tokens and their redemption.
///
/// ## Usage
///
/// ```rust,ignore
/// let shop = Arc::new(RewardShop::with_default_types());
/// let purse = Purse::new(owner, Box::new(ChaChaRandomizer::from_seed(vrf, seed)), shop.clone());
///
/// purse.add_categories(owner, &batch)?;
/// purse.grant_minter(owner, marketplace)?;
///
/// let ids = purse.mint(marketplace, buyer, 3)?;
/// let redemption = purse.redeem(buyer, ids[0])?;
/// ```
pub struct Purse {
    state: RwLock<PurseState>,
    events: Mutex<Vec<PurseEvent>>,
}

impl Purse {
    /// Creates an empty purse owned by `owner`, with no categories and no minters.
    #[must_use]
    pub fn new(owner: Address, randomizer: Box<dyn Randomizer>, issuer: Arc<dyn RewardIssuer>) -> Self {
        Self {
            state: RwLock::new(PurseState {
                access: AccessControl::new(owner),
                registry: CategoryRegistry::new(),
                ledger: TokenLedger::new(),
                reward_ids: RewardTokenIds::default(),
                randomizer,
                issuer,
            }),
            events: Mutex::new(Vec::with_capacity(256)),
        }
    }

    /// Creates a purse preloaded with the categories and reward ids of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PurseError::InvalidCategoryData`] if the configured
    /// categories break a registry invariant.
    pub fn from_config(
        owner: Address,
        config: &PurseConfig,
        randomizer: Box<dyn Randomizer>,
        issuer: Arc<dyn RewardIssuer>,
    ) -> PurseResult<Self> {
        let purse = Self::new(owner, randomizer, issuer);
        {
            let mut state = purse.state.write();
            state.reward_ids = config.reward_tokens;
            let batch = config.to_batch();
            if !batch.is_empty() {
                state.registry.add_categories(&batch)?;
            }
        }
        tracing::info!(
            "Purse loaded {} categories from config (owner {})",
            config.categories.len(),
            owner
        );
        Ok(purse)
    }

    fn emit(&self, event: PurseEvent) {
        self.events.lock().push(event);
    }

    // ========================================================================
    // Access Control
    // ========================================================================

    /// Current owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.state.read().access.owner()
    }

    /// Hands ownership to `new_owner`.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::Unauthorized`] or [`crate::PurseError::InvalidOwner`].
    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> PurseResult<()> {
        let mut state = self.state.write();
        let previous = state.access.transfer_ownership(caller, new_owner)?;
        self.emit(PurseEvent::OwnershipTransferred { previous, new_owner });
        tracing::info!("Purse ownership transferred: {} -> {}", previous, new_owner);
        Ok(())
    }

    /// Grants the minter role. Idempotent.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::Unauthorized`] unless `caller` is the owner.
    pub fn grant_minter(&self, caller: Address, account: Address) -> PurseResult<()> {
        self.set_minter(caller, account, true)
    }

    /// Revokes the minter role. Idempotent.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::Unauthorized`] unless `caller` is the owner.
    pub fn revoke_minter(&self, caller: Address, account: Address) -> PurseResult<()> {
        self.set_minter(caller, account, false)
    }

    fn set_minter(&self, caller: Address, account: Address, enabled: bool) -> PurseResult<()> {
        let mut state = self.state.write();
        if state.access.set_minter(caller, account, enabled)? {
            self.emit(PurseEvent::MinterUpdated { account, enabled });
            tracing::info!("Minter {} {}", account, if enabled { "granted" } else { "revoked" });
        }
        Ok(())
    }

    /// Returns true if `account` may mint.
    #[must_use]
    pub fn is_minter(&self, account: Address) -> bool {
        self.state.read().access.is_minter(account)
    }

    // ========================================================================
    // Category Registry
    // ========================================================================

    /// Appends a batch of categories. Returns the index of the first one.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::Unauthorized`] or
    /// [`crate::PurseError::InvalidCategoryData`]; nothing is appended on error.
    pub fn add_categories(&self, caller: Address, batch: &CategoryBatch) -> PurseResult<usize> {
        let mut state = self.state.write();
        state.access.ensure_owner(caller)?;
        let first_index = state.registry.add_categories(batch).map_err(|e| {
            tracing::warn!("Rejected category batch: {}", e);
            e
        })?;

        let count = batch.len();
        self.emit(PurseEvent::CategoriesAdded { first_index, count });
        tracing::info!("Added {} purse categories at index {}", count, first_index);
        Ok(first_index)
    }

    /// Rewrites every category in place, keeping minted counts.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::Unauthorized`],
    /// [`crate::PurseError::InvalidCategoryData`] or
    /// [`crate::PurseError::CategoryCountMismatch`]; nothing changes on error.
    pub fn update_categories(&self, caller: Address, batch: &CategoryBatch) -> PurseResult<()> {
        let mut state = self.state.write();
        state.access.ensure_owner(caller)?;
        state.registry.update_categories(batch).map_err(|e| {
            tracing::warn!("Rejected category update: {}", e);
            e
        })?;

        let count = batch.len();
        self.emit(PurseEvent::CategoriesUpdated { count });
        tracing::info!("Updated {} purse categories", count);
        Ok(())
    }

    /// Snapshot of one category.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::IndexOutOfRange`] past the last category.
    pub fn category(&self, index: usize) -> PurseResult<Category> {
        self.state.read().registry.category(index)
    }

    /// Number of registered categories.
    #[must_use]
    pub fn category_count(&self) -> usize {
        self.state.read().registry.len()
    }

    /// Snapshot of every category in tier order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.state.read().registry.categories().to_vec()
    }

    // ========================================================================
    // Owner Configuration
    // ========================================================================

    /// Sets the reward token type credited for `kind`.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::Unauthorized`] unless `caller` is the owner.
    pub fn set_reward_token_id(&self, caller: Address, kind: RewardKind, token_id: u64) -> PurseResult<()> {
        let mut state = self.state.write();
        state.access.ensure_owner(caller)?;
        state.reward_ids.set(kind, token_id);
        self.emit(PurseEvent::RewardTokenIdSet { kind, token_id });
        tracing::info!("Reward token id for {} set to {}", kind, token_id);
        Ok(())
    }

    /// Reward token type credited for `kind`.
    #[must_use]
    pub fn reward_token_id(&self, kind: RewardKind) -> u64 {
        self.state.read().reward_ids.get(kind)
    }

    /// All reward token types.
    #[must_use]
    pub fn reward_token_ids(&self) -> RewardTokenIds {
        self.state.read().reward_ids
    }

    /// Replaces the randomness source.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::Unauthorized`] unless `caller` is the owner.
    pub fn set_randomizer(&self, caller: Address, randomizer: Box<dyn Randomizer>) -> PurseResult<()> {
        let mut state = self.state.write();
        state.access.ensure_owner(caller)?;
        let address = randomizer.address();
        state.randomizer = randomizer;
        self.emit(PurseEvent::RandomizerSet { randomizer: address });
        tracing::info!("Randomizer set to {}", address);
        Ok(())
    }

    /// Address of the current randomness source.
    #[must_use]
    pub fn randomizer(&self) -> Address {
        self.state.read().randomizer.address()
    }

    // ========================================================================
    // Minting and Redemption
    // ========================================================================

    /// Mints `quantity` purses for `to`, each in an independently drawn category.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::Unauthorized`], [`crate::PurseError::InvalidRecipient`],
    /// [`crate::PurseError::InvalidQuantity`], [`crate::PurseError::NoCategories`]
    /// or [`crate::PurseError::Randomness`]; nothing is minted on error.
    pub fn mint(&self, caller: Address, to: Address, quantity: u32) -> PurseResult<Vec<TokenId>> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let minted = mint::mint(
            &state.access,
            &mut state.registry,
            &mut state.ledger,
            state.randomizer.as_mut(),
            caller,
            to,
            quantity,
        )
        .map_err(|e| {
            tracing::warn!("Mint of {} by {} rejected: {}", quantity, caller, e);
            e
        })?;

        {
            let mut events = self.events.lock();
            events.extend(minted.iter().map(|m| PurseEvent::PurseMinted {
                token_id: m.token_id,
                owner: to,
                category: m.category,
            }));
        }
        tracing::info!("Minted {} purses for {}", minted.len(), to);

        Ok(minted.into_iter().map(|m| m.token_id).collect())
    }

    /// Redeems a purse held by `caller` for its sampled rewards.
    ///
    /// The reward issuer runs under the state write lock; it must not call
    /// back into this purse.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::UnknownToken`], [`crate::PurseError::AlreadyConsumed`],
    /// [`crate::PurseError::NotOwner`], [`crate::PurseError::Randomness`] or
    /// [`crate::PurseError::Issuance`]; the purse stays redeemable on the last two.
    pub fn redeem(&self, caller: Address, token_id: TokenId) -> PurseResult<Redemption> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let redemption = redeem::redeem(
            &state.registry,
            &mut state.ledger,
            state.randomizer.as_mut(),
            state.issuer.as_ref(),
            &state.reward_ids,
            caller,
            token_id,
        )
        .map_err(|e| {
            tracing::warn!("Redeem of purse {} by {} rejected: {}", token_id, caller, e);
            e
        })?;

        self.emit(PurseEvent::PurseRedeemed {
            token_id,
            owner: redemption.owner,
            category: redemption.category,
            grants: redemption.grants,
        });
        tracing::info!(
            "Redeemed purse {} (category {}): food {}, potion {}, ticket {}",
            token_id,
            redemption.category,
            redemption.amount(RewardKind::Food),
            redemption.amount(RewardKind::LevelingPotion),
            redemption.amount(RewardKind::LotteryTicket)
        );
        Ok(redemption)
    }

    // ========================================================================
    // Token Ledger
    // ========================================================================

    /// Snapshot of a purse token.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::UnknownToken`] if no token has this id.
    pub fn token(&self, token_id: TokenId) -> PurseResult<PurseToken> {
        self.state.read().ledger.token(token_id)
    }

    /// Holder of a purse token.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::UnknownToken`] if no token has this id.
    pub fn owner_of(&self, token_id: TokenId) -> PurseResult<Address> {
        self.state.read().ledger.owner_of(token_id)
    }

    /// Number of unconsumed purses held by `owner`.
    #[must_use]
    pub fn balance_of(&self, owner: Address) -> usize {
        self.state.read().ledger.balance_of(owner)
    }

    /// Ids of unconsumed purses held by `owner`.
    #[must_use]
    pub fn tokens_of(&self, owner: Address) -> Vec<TokenId> {
        self.state.read().ledger.tokens_of(owner)
    }

    /// Number of purses ever minted.
    #[must_use]
    pub fn total_minted(&self) -> usize {
        self.state.read().ledger.total_minted()
    }

    /// Moves an unconsumed purse from `caller` to `to`.
    ///
    /// # Errors
    ///
    /// [`crate::PurseError::InvalidRecipient`], [`crate::PurseError::UnknownToken`],
    /// [`crate::PurseError::AlreadyConsumed`] or [`crate::PurseError::NotOwner`].
    pub fn transfer(&self, caller: Address, to: Address, token_id: TokenId) -> PurseResult<()> {
        let mut state = self.state.write();
        state.ledger.transfer(caller, to, token_id)?;
        self.emit(PurseEvent::PurseTransferred {
            token_id,
            from: caller,
            to,
        });
        tracing::debug!("Purse {} transferred {} -> {}", token_id, caller, to);
        Ok(())
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Drains all pending events in commit order.
    pub fn drain_events(&self) -> Vec<PurseEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of events waiting to be drained.
    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        self.events.lock().len()
    }
}

impl std::fmt::Debug for Purse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Purse")
            .field("owner", &state.access.owner())
            .field("categories", &state.registry.len())
            .field("minted", &state.ledger.total_minted())
            .field("randomizer", &state.randomizer.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::RewardDistribution;
    use crate::error::PurseError;
    use crate::randomness::ScriptedRandomizer;
    use crate::rewards::RewardShop;

    fn owner() -> Address {
        Address::with_last_byte(1)
    }

    fn minter() -> Address {
        Address::with_last_byte(2)
    }

    fn buyer() -> Address {
        Address::with_last_byte(3)
    }

    fn single_tier() -> CategoryBatch {
        CategoryBatch::new().with_category(
            "Only",
            100,
            RewardDistribution::new(20, 5),
            RewardDistribution::new(5, 1),
            RewardDistribution::new(75, 10),
        )
    }

    fn purse_with(draws: impl IntoIterator<Item = u32>) -> (Purse, Arc<RewardShop>) {
        let shop = Arc::new(RewardShop::with_default_types());
        let purse = Purse::new(
            owner(),
            Box::new(ScriptedRandomizer::new(Address::with_last_byte(0xEE), draws)),
            shop.clone(),
        );
        (purse, shop)
    }

    #[test]
    fn test_purse_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Purse>();
    }

    #[test]
    fn test_events_follow_commit_order() {
        let (purse, _) = purse_with([0, 0, 99, 99]);
        purse.add_categories(owner(), &single_tier()).unwrap();
        purse.grant_minter(owner(), minter()).unwrap();
        let ids = purse.mint(minter(), buyer(), 1).unwrap();
        purse.redeem(buyer(), ids[0]).unwrap();

        let events = purse.drain_events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], PurseEvent::CategoriesAdded { first_index: 0, count: 1 });
        assert_eq!(events[1], PurseEvent::MinterUpdated { account: minter(), enabled: true });
        assert_eq!(
            events[2],
            PurseEvent::PurseMinted { token_id: 1, owner: buyer(), category: 0 }
        );
        assert!(matches!(events[3], PurseEvent::PurseRedeemed { token_id: 1, .. }));
        assert_eq!(purse.pending_event_count(), 0);
    }

    #[test]
    fn test_rejections_emit_nothing() {
        let (purse, _) = purse_with([]);
        let stranger = Address::with_last_byte(9);

        assert!(purse.add_categories(stranger, &single_tier()).is_err());
        assert!(purse.grant_minter(stranger, stranger).is_err());
        assert_eq!(
            purse.mint(stranger, stranger, 1),
            Err(PurseError::Unauthorized { caller: stranger })
        );
        assert_eq!(purse.pending_event_count(), 0);
    }

    #[test]
    fn test_idempotent_grant_emits_once() {
        let (purse, _) = purse_with([]);
        purse.grant_minter(owner(), minter()).unwrap();
        purse.grant_minter(owner(), minter()).unwrap();
        assert_eq!(purse.drain_events().len(), 1);
    }

    #[test]
    fn test_set_randomizer() {
        let (purse, _) = purse_with([]);
        let vrf = Address::with_last_byte(0xAB);

        assert!(purse
            .set_randomizer(buyer(), Box::new(ScriptedRandomizer::new(vrf, [])))
            .is_err());
        purse
            .set_randomizer(owner(), Box::new(ScriptedRandomizer::new(vrf, [])))
            .unwrap();

        assert_eq!(purse.randomizer(), vrf);
    }

    #[test]
    fn test_debug_summary() {
        let (purse, _) = purse_with([]);
        let rendered = format!("{purse:?}");
        assert!(rendered.contains("categories: 0"));
    }
}
