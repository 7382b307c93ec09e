//! # Purse Configuration
//!
//! Balance data lives in TOML, not in code:
//!
//! ```toml
//! [reward_tokens]
//! food = 0
//! leveling_potion = 1
//! lottery_ticket = 2
//!
//! [[categories]]
//! name = "Common"
//! rarity = 45
//! food = { percentage = 20, amount = 5 }
//! leveling_potion = { percentage = 5, amount = 1 }
//! lottery_ticket = { percentage = 75, amount = 10 }
//! ```
//!
//! Loading only parses. Invariants are enforced when the categories reach a
//! [`CategoryRegistry`](crate::category::CategoryRegistry).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::category::{CategoryBatch, RewardDistribution};
use crate::error::{PurseError, PurseResult};
use crate::rewards::RewardTokenIds;

/// One category as written in the config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Display label.
    pub name: String,
    /// Selection weight in percent.
    pub rarity: u32,
    /// Food payout.
    pub food: RewardDistribution,
    /// Leveling potion payout.
    pub leveling_potion: RewardDistribution,
    /// Lottery ticket payout.
    pub lottery_ticket: RewardDistribution,
}

/// Reward token ids and an initial category set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurseConfig {
    /// Reward token type identifiers.
    pub reward_tokens: RewardTokenIds,
    /// Categories in tier order.
    pub categories: Vec<CategoryEntry>,
}

impl PurseConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::InvalidConfig`] if the text is not a valid config.
    pub fn from_toml_str(raw: &str) -> PurseResult<Self> {
        toml::from_str(raw).map_err(|e| PurseError::InvalidConfig(format!("invalid purse config: {e}")))
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> PurseResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| PurseError::InvalidConfig(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Serializes the config back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> PurseResult<String> {
        toml::to_string(self).map_err(|e| PurseError::InvalidConfig(format!("failed to serialize purse config: {e}")))
    }

    /// Converts the category list into a registry batch.
    #[must_use]
    pub fn to_batch(&self) -> CategoryBatch {
        self.categories.iter().fold(CategoryBatch::new(), |batch, entry| {
            batch.with_category(
                entry.name.clone(),
                entry.rarity,
                entry.food,
                entry.leveling_potion,
                entry.lottery_ticket,
            )
        })
    }
}
