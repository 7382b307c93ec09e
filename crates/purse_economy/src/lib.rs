//! # Purse Economy
//!
//! Rarity-weighted purse tokens: a minter issues purses whose tier is drawn by
//! weight, and holders redeem them once for randomly sized reward bundles.
//!
//! ## Design Principles
//!
//! 1. **Integer weights only** - rarities and reward chances are whole percentages
//! 2. **All-or-nothing mutations** - batches are validated on staged data, draws
//!    are taken before anything is committed
//! 3. **Collaborators behind traits** - randomness, reward issuance and payment
//!    tokens are pluggable
//! 4. **External configuration** - category sets load from TOML files
//!
//! ## Example
//!
//! ```rust,ignore
//! use purse_economy::{ChaChaRandomizer, Purse, PurseConfig, RewardShop};
//!
//! let config = PurseConfig::from_file("data/purse_categories.toml")?;
//! let shop = Arc::new(RewardShop::with_default_types());
//! let purse = Purse::from_config(owner, &config, Box::new(ChaChaRandomizer::from_seed(vrf, seed)), shop)?;
//!
//! purse.grant_minter(owner, marketplace)?;
//! let ids = purse.mint(marketplace, buyer, 10)?;
//! let redemption = purse.redeem(buyer, ids[0])?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod access;
pub mod category;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod marketplace;
pub mod mint;
pub mod purse;
pub mod randomness;
pub mod redeem;
pub mod rewards;
pub mod sampling;

pub use access::AccessControl;
pub use category::{Category, CategoryBatch, CategoryRegistry, RewardDistribution, RewardKind};
pub use config::{CategoryEntry, PurseConfig};
pub use error::{CategoryDataViolation, IssuanceError, PurseError, PurseResult, RandomnessError};
pub use events::PurseEvent;
pub use ledger::{PurseToken, TokenId, TokenLedger};
pub use marketplace::{FungibleToken, Marketplace, MarketplaceError, MarketplaceResult, PurseMintInfo, TokenBalances};
pub use mint::MintedPurse;
pub use purse::Purse;
pub use randomness::{ChaChaRandomizer, Randomizer, ScriptedRandomizer};
pub use redeem::Redemption;
pub use rewards::{RewardGrant, RewardIssuer, RewardShop, RewardTokenIds};
