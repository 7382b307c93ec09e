//! # Marketplace Payment Gate
//!
//! Sells purses at a per-unit price, in the native currency or in a fungible
//! token. Token payment is taken before the purse is asked to mint, and given
//! back if the mint fails:
//!
//! ```text
//! buy_purse_tokens()
//!   native: value >= price * quantity                 else InsufficientNative
//!           Purse::mint(marketplace, recipient, quantity)
//!   token:  token configured                          else MissingTokenAddress
//!           balance   >= price * quantity             else InsufficientTokens
//!           allowance >= price * quantity             else InsufficientAllowance
//!           transfer_from(buyer -> marketplace)       <- checks again and moves atomically
//!           Purse::mint(marketplace, recipient, quantity)
//!             on error: transfer(marketplace -> buyer), error propagates
//! ```
//!
//! A refunded buyer gets the tokens back but not the spent allowance.
//! The marketplace address must hold the purse minter role.

use alloy_primitives::{Address, U256};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use thiserror::Error;

use crate::error::PurseError;
use crate::ledger::TokenId;
use crate::purse::Purse;

/// Errors raised by the marketplace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketplaceError {
    /// Caller is not the marketplace owner.
    #[error("caller {caller} is not the marketplace owner")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// Native payment below the total price.
    #[error("insufficient native payment: required {required}, provided {provided}")]
    InsufficientNative {
        /// Total price.
        required: U256,
        /// Value sent.
        provided: U256,
    },

    /// Token payment selected but no token configured.
    #[error("payment token address can't be null")]
    MissingTokenAddress,

    /// The token handed in is not the configured payment token.
    #[error("payment token mismatch: expected {expected}, got {found}")]
    TokenMismatch {
        /// Configured payment token.
        expected: Address,
        /// Token handed to the purchase.
        found: Address,
    },

    /// Buyer's token balance below the total price.
    #[error("insufficient tokens: required {required}, balance {balance}")]
    InsufficientTokens {
        /// Total price.
        required: U256,
        /// Buyer's balance.
        balance: U256,
    },

    /// Buyer has not approved enough tokens for the marketplace.
    #[error("must approve tokens: required {required}, allowance {allowance}")]
    InsufficientAllowance {
        /// Total price.
        required: U256,
        /// Current allowance.
        allowance: U256,
    },

    /// `price * quantity` does not fit in 256 bits.
    #[error("total price overflows")]
    PriceOverflow,

    /// The purse rejected the mint.
    #[error(transparent)]
    Purse(#[from] PurseError),
}

/// Result type for marketplace operations.
pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

/// Pricing of purse tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurseMintInfo {
    /// True to charge in native currency, false to charge in `token_address`.
    pub pay_with_native: bool,
    /// Per-unit price in native currency.
    pub native_price: U256,
    /// Payment token, if token payment is used.
    pub token_address: Option<Address>,
    /// Per-unit price in payment token units.
    pub token_price: U256,
}

/// A fungible payment token.
pub trait FungibleToken: Send + Sync {
    /// Token contract address.
    fn address(&self) -> Address;

    /// Balance of `account`.
    fn balance_of(&self, account: Address) -> U256;

    /// Amount `spender` may move on behalf of `owner`.
    fn allowance(&self, owner: Address, spender: Address) -> U256;

    /// Moves `amount` from `from` to `to`, spending `spender`'s allowance.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::InsufficientTokens`] or
    /// [`MarketplaceError::InsufficientAllowance`]; nothing moves on error.
    fn transfer_from(&self, spender: Address, from: Address, to: Address, amount: U256) -> MarketplaceResult<()>;

    /// Moves `amount` of `from`'s own tokens to `to`.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::InsufficientTokens`]; nothing moves on error.
    fn transfer(&self, from: Address, to: Address, amount: U256) -> MarketplaceResult<()>;
}

/// In-memory fungible token with balances and allowances.
#[derive(Debug)]
pub struct TokenBalances {
    address: Address,
    balances: RwLock<HashMap<Address, U256>>,
    allowances: RwLock<HashMap<(Address, Address), U256>>,
}

impl TokenBalances {
    /// Creates a token with no supply.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: RwLock::new(HashMap::new()),
            allowances: RwLock::new(HashMap::new()),
        }
    }

    /// Credits `amount` to `to`.
    pub fn mint(&self, to: Address, amount: U256) {
        let mut balances = self.balances.write();
        let balance = balances.entry(to).or_insert(U256::ZERO);
        *balance = balance.saturating_add(amount);
    }

    /// Sets the amount `spender` may move on behalf of `owner`.
    pub fn approve(&self, owner: Address, spender: Address, amount: U256) {
        self.allowances.write().insert((owner, spender), amount);
    }
}

impl FungibleToken for TokenBalances {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.balances.read().get(&account).copied().unwrap_or(U256::ZERO)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .read()
            .get(&(owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn transfer_from(&self, spender: Address, from: Address, to: Address, amount: U256) -> MarketplaceResult<()> {
        let mut allowances = self.allowances.write();
        let mut balances = self.balances.write();

        let allowance = allowances.get(&(from, spender)).copied().unwrap_or(U256::ZERO);
        if allowance < amount {
            return Err(MarketplaceError::InsufficientAllowance {
                required: amount,
                allowance,
            });
        }
        let balance = balances.get(&from).copied().unwrap_or(U256::ZERO);
        if balance < amount {
            return Err(MarketplaceError::InsufficientTokens {
                required: amount,
                balance,
            });
        }

        allowances.insert((from, spender), allowance - amount);
        move_balance(&mut balances, from, to, balance, amount);
        Ok(())
    }

    fn transfer(&self, from: Address, to: Address, amount: U256) -> MarketplaceResult<()> {
        let mut balances = self.balances.write();

        let balance = balances.get(&from).copied().unwrap_or(U256::ZERO);
        if balance < amount {
            return Err(MarketplaceError::InsufficientTokens {
                required: amount,
                balance,
            });
        }

        move_balance(&mut balances, from, to, balance, amount);
        Ok(())
    }
}

/// `balance` is `from`'s current balance, already checked to cover `amount`.
fn move_balance(balances: &mut HashMap<Address, U256>, from: Address, to: Address, balance: U256, amount: U256) {
    balances.insert(from, balance - amount);
    let credited = balances.entry(to).or_insert(U256::ZERO);
    *credited = credited.saturating_add(amount);
}

/// Sells purses for a configured price.
#[derive(Debug)]
pub struct Marketplace {
    address: Address,
    owner: Address,
    mint_info: RwLock<PurseMintInfo>,
    native_collected: Mutex<U256>,
}

impl Marketplace {
    /// Creates a marketplace at `address`, managed by `owner`.
    ///
    /// The default pricing is token payment with no token configured, so
    /// purchases fail until the owner sets the mint info.
    #[must_use]
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            mint_info: RwLock::new(PurseMintInfo::default()),
            native_collected: Mutex::new(U256::ZERO),
        }
    }

    /// Address the marketplace mints and collects payment as.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Current pricing.
    #[must_use]
    pub fn purse_mint_info(&self) -> PurseMintInfo {
        *self.mint_info.read()
    }

    /// Native currency collected from purchases so far.
    #[must_use]
    pub fn native_collected(&self) -> U256 {
        *self.native_collected.lock()
    }

    /// Replaces the pricing.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::Unauthorized`] unless `caller` is the marketplace owner.
    pub fn set_purse_mint_info(&self, caller: Address, info: PurseMintInfo) -> MarketplaceResult<()> {
        if caller != self.owner {
            return Err(MarketplaceError::Unauthorized { caller });
        }
        *self.mint_info.write() = info;
        tracing::info!(
            "Purse mint info set: native={} native_price={} token={:?} token_price={}",
            info.pay_with_native,
            info.native_price,
            info.token_address,
            info.token_price
        );
        Ok(())
    }

    /// Buys `quantity` purses for `recipient`, paid by `buyer`.
    ///
    /// `native_value` is the native currency sent with the purchase; it is
    /// ignored for token payment. `token` is the payment token handle.
    ///
    /// # Errors
    ///
    /// Payment errors are returned before the purse is touched. Purse errors
    /// are wrapped in [`MarketplaceError::Purse`]; a token payment already
    /// taken is refunded to `buyer` first.
    pub fn buy_purse_tokens(
        &self,
        purse: &Purse,
        token: &dyn FungibleToken,
        buyer: Address,
        recipient: Address,
        quantity: u32,
        native_value: U256,
    ) -> MarketplaceResult<Vec<TokenId>> {
        let info = self.purse_mint_info();

        if info.pay_with_native {
            let required = total_price(info.native_price, quantity)?;
            if native_value < required {
                return Err(MarketplaceError::InsufficientNative {
                    required,
                    provided: native_value,
                });
            }

            let ids = purse.mint(self.address, recipient, quantity)?;
            let mut collected = self.native_collected.lock();
            *collected = collected.saturating_add(native_value);
            tracing::info!("Sold {} purses to {} for {} native", quantity, buyer, native_value);
            return Ok(ids);
        }

        let expected = info.token_address.ok_or(MarketplaceError::MissingTokenAddress)?;
        if token.address() != expected {
            return Err(MarketplaceError::TokenMismatch {
                expected,
                found: token.address(),
            });
        }

        let required = total_price(info.token_price, quantity)?;
        let balance = token.balance_of(buyer);
        if balance < required {
            return Err(MarketplaceError::InsufficientTokens { required, balance });
        }
        let allowance = token.allowance(buyer, self.address);
        if allowance < required {
            return Err(MarketplaceError::InsufficientAllowance { required, allowance });
        }

        token.transfer_from(self.address, buyer, self.address, required)?;

        match purse.mint(self.address, recipient, quantity) {
            Ok(ids) => {
                tracing::info!("Sold {} purses to {} for {} tokens", quantity, buyer, required);
                Ok(ids)
            }
            Err(e) => {
                if let Err(refund) = token.transfer(self.address, buyer, required) {
                    tracing::error!("Refund of {} tokens to {} failed: {}", required, buyer, refund);
                } else {
                    tracing::warn!("Purse mint failed, refunded {} tokens to {}: {}", required, buyer, e);
                }
                Err(e.into())
            }
        }
    }
}

fn total_price(unit_price: U256, quantity: u32) -> MarketplaceResult<U256> {
    unit_price
        .checked_mul(U256::from(quantity))
        .ok_or(MarketplaceError::PriceOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer() -> Address {
        Address::with_last_byte(0xB1)
    }

    fn market() -> Address {
        Address::with_last_byte(0x4D)
    }

    #[test]
    fn test_total_price_overflow() {
        assert_eq!(total_price(U256::from(3u64), 4), Ok(U256::from(12u64)));
        assert_eq!(total_price(U256::MAX, 2), Err(MarketplaceError::PriceOverflow));
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let token = TokenBalances::new(Address::with_last_byte(0x70));
        token.mint(buyer(), U256::from(100u64));
        token.approve(buyer(), market(), U256::from(60u64));

        token
            .transfer_from(market(), buyer(), market(), U256::from(40u64))
            .unwrap();

        assert_eq!(token.balance_of(buyer()), U256::from(60u64));
        assert_eq!(token.balance_of(market()), U256::from(40u64));
        assert_eq!(token.allowance(buyer(), market()), U256::from(20u64));
    }

    #[test]
    fn test_transfer_from_failure_moves_nothing() {
        let token = TokenBalances::new(Address::with_last_byte(0x70));
        token.mint(buyer(), U256::from(10u64));
        token.approve(buyer(), market(), U256::from(50u64));

        let err = token
            .transfer_from(market(), buyer(), market(), U256::from(20u64))
            .unwrap_err();

        assert!(matches!(err, MarketplaceError::InsufficientTokens { .. }));
        assert_eq!(token.balance_of(buyer()), U256::from(10u64));
        assert_eq!(token.allowance(buyer(), market()), U256::from(50u64));
    }

    #[test]
    fn test_transfer_moves_own_balance() {
        let token = TokenBalances::new(Address::with_last_byte(0x70));
        token.mint(market(), U256::from(30u64));

        assert_eq!(
            token.transfer(market(), buyer(), U256::from(31u64)),
            Err(MarketplaceError::InsufficientTokens {
                required: U256::from(31u64),
                balance: U256::from(30u64),
            })
        );
        token.transfer(market(), buyer(), U256::from(30u64)).unwrap();

        assert_eq!(token.balance_of(market()), U256::ZERO);
        assert_eq!(token.balance_of(buyer()), U256::from(30u64));
    }

    #[test]
    fn test_only_owner_sets_mint_info() {
        let owner = Address::with_last_byte(1);
        let marketplace = Marketplace::new(market(), owner);
        let info = PurseMintInfo {
            pay_with_native: true,
            native_price: U256::from(1_000u64),
            ..PurseMintInfo::default()
        };

        assert_eq!(
            marketplace.set_purse_mint_info(buyer(), info),
            Err(MarketplaceError::Unauthorized { caller: buyer() })
        );
        marketplace.set_purse_mint_info(owner, info).unwrap();
        assert_eq!(marketplace.purse_mint_info(), info);
    }
}
