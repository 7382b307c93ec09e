//! # Category Registry
//!
//! Ordered, index-addressed rarity tiers. Insertion order is tier order and
//! is the order in which weighted selection walks the table.
//!
//! ## Invariants
//!
//! After every successful mutation:
//!
//! 1. `sum(rarity)` over all categories is exactly 100
//! 2. Every category's reward percentages sum to exactly 100
//! 3. `minted` never decreases
//!
//! Mutations are validated on a staged copy and swapped in only when every
//! check passes, so a rejected batch leaves the registry untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CategoryDataViolation, PurseError, PurseResult};

/// Total that rarity weights and reward percentages must add up to.
pub const PERCENT_TOTAL: u64 = 100;

/// Reward token types granted on redemption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RewardKind {
    /// Ant food.
    Food = 0,
    /// Leveling potion.
    LevelingPotion = 1,
    /// Lottery ticket.
    LotteryTicket = 2,
}

impl RewardKind {
    /// All reward kinds in draw order.
    pub const ALL: [Self; 3] = [Self::Food, Self::LevelingPotion, Self::LotteryTicket];

    /// Position of this kind in per-category reward arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Food => "food",
            Self::LevelingPotion => "leveling potion",
            Self::LotteryTicket => "lottery ticket",
        })
    }
}

/// How one reward type pays out for a category.
///
/// On redemption a draw in `[0, 100)` below `percentage` pays `amount` units,
/// any other draw pays nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDistribution {
    /// Chance in percent that this reward type pays out.
    pub percentage: u32,
    /// Units granted when it pays out.
    pub amount: u64,
}

impl RewardDistribution {
    /// Creates a distribution.
    #[inline]
    #[must_use]
    pub const fn new(percentage: u32, amount: u64) -> Self {
        Self { percentage, amount }
    }
}

/// A rarity tier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    /// Display label, not necessarily unique.
    pub name: String,
    /// Selection weight in percent.
    pub rarity: u32,
    /// Purses minted into this category so far.
    pub minted: u64,
    /// Reward distributions indexed by [`RewardKind::index`].
    pub rewards: [RewardDistribution; 3],
}

impl Category {
    /// Returns the distribution for one reward kind.
    #[inline]
    #[must_use]
    pub const fn reward(&self, kind: RewardKind) -> RewardDistribution {
        self.rewards[kind.index()]
    }

    fn reward_percentage_sum(&self) -> u64 {
        self.rewards.iter().map(|r| u64::from(r.percentage)).sum()
    }
}

impl fmt::Display for Category {
    /// `name,rarity,minted,foodPct,potionPct,ticketPct,foodAmt,potionAmt,ticketAmt`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [food, potion, ticket] = self.rewards;
        write!(
            f,
            "{},{},{},{},{},{},{},{},{}",
            self.name,
            self.rarity,
            self.minted,
            food.percentage,
            potion.percentage,
            ticket.percentage,
            food.amount,
            potion.amount,
            ticket.amount,
        )
    }
}

/// A bulk category submission as parallel sequences.
///
/// Entry `i` of every sequence describes category `i` of the batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryBatch {
    /// Display labels.
    pub names: Vec<String>,
    /// Rarity weights.
    pub rarities: Vec<u32>,
    /// Food payout chances.
    pub food_percentages: Vec<u32>,
    /// Leveling potion payout chances.
    pub potion_percentages: Vec<u32>,
    /// Lottery ticket payout chances.
    pub ticket_percentages: Vec<u32>,
    /// Food payout amounts.
    pub food_amounts: Vec<u64>,
    /// Leveling potion payout amounts.
    pub potion_amounts: Vec<u64>,
    /// Lottery ticket payout amounts.
    pub ticket_amounts: Vec<u64>,
}

impl CategoryBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one category to every sequence.
    #[must_use]
    pub fn with_category(
        mut self,
        name: impl Into<String>,
        rarity: u32,
        food: RewardDistribution,
        potion: RewardDistribution,
        ticket: RewardDistribution,
    ) -> Self {
        self.names.push(name.into());
        self.rarities.push(rarity);
        self.food_percentages.push(food.percentage);
        self.potion_percentages.push(potion.percentage);
        self.ticket_percentages.push(ticket.percentage);
        self.food_amounts.push(food.amount);
        self.potion_amounts.push(potion.amount);
        self.ticket_amounts.push(ticket.amount);
        self
    }

    /// Number of categories described, measured on `names`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the batch describes no category.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Checks that every sequence has the same length as `names`.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryDataViolation::LengthMismatch`] naming the first
    /// sequence that differs.
    pub fn check_lengths(&self) -> Result<usize, CategoryDataViolation> {
        let expected = self.names.len();
        let fields = [
            ("rarities", self.rarities.len()),
            ("food_percentages", self.food_percentages.len()),
            ("potion_percentages", self.potion_percentages.len()),
            ("ticket_percentages", self.ticket_percentages.len()),
            ("food_amounts", self.food_amounts.len()),
            ("potion_amounts", self.potion_amounts.len()),
            ("ticket_amounts", self.ticket_amounts.len()),
        ];

        match fields.into_iter().find(|&(_, found)| found != expected) {
            Some((field, found)) => Err(CategoryDataViolation::LengthMismatch {
                field,
                expected,
                found,
            }),
            None => Ok(expected),
        }
    }

    /// Reward distributions of entry `i`. Lengths must have been checked.
    fn rewards_at(&self, i: usize) -> [RewardDistribution; 3] {
        [
            RewardDistribution::new(self.food_percentages[i], self.food_amounts[i]),
            RewardDistribution::new(self.potion_percentages[i], self.potion_amounts[i]),
            RewardDistribution::new(self.ticket_percentages[i], self.ticket_amounts[i]),
        ]
    }

    /// Builds fresh categories with `minted = 0`. Lengths must have been checked.
    fn to_categories(&self) -> Vec<Category> {
        (0..self.len())
            .map(|i| Category {
                name: self.names[i].clone(),
                rarity: self.rarities[i],
                minted: 0,
                rewards: self.rewards_at(i),
            })
            .collect()
    }
}

/// The ordered category table.
#[derive(Clone, Debug, Default)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered categories.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns true if no category is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Snapshot of one category.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::IndexOutOfRange`] if `index` is past the end.
    pub fn category(&self, index: usize) -> PurseResult<Category> {
        self.categories
            .get(index)
            .cloned()
            .ok_or(PurseError::IndexOutOfRange {
                index,
                len: self.categories.len(),
            })
    }

    /// All categories in tier order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Rarity weights in tier order.
    #[must_use]
    pub fn rarity_weights(&self) -> Vec<u32> {
        self.categories.iter().map(|c| c.rarity).collect()
    }

    /// Sum of `minted` over every category.
    #[must_use]
    pub fn total_minted(&self) -> u64 {
        self.categories.iter().map(|c| c.minted).sum()
    }

    /// Appends a batch of new categories.
    ///
    /// Returns the index of the first appended category.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::InvalidCategoryData`] if the sequences differ in
    /// length or the resulting registry breaks an invariant. Nothing is
    /// appended in that case.
    pub fn add_categories(&mut self, batch: &CategoryBatch) -> PurseResult<usize> {
        batch.check_lengths()?;

        let first_index = self.categories.len();
        let mut staged = self.categories.clone();
        staged.extend(batch.to_categories());

        validate(&staged)?;
        self.categories = staged;
        Ok(first_index)
    }

    /// Replaces every category's name, rarity and reward distributions in place.
    ///
    /// `minted` counters are preserved.
    ///
    /// # Errors
    ///
    /// - [`PurseError::InvalidCategoryData`] if the sequences differ in length
    ///   or the result breaks an invariant
    /// - [`PurseError::CategoryCountMismatch`] if the batch does not cover the
    ///   registry exactly
    pub fn update_categories(&mut self, batch: &CategoryBatch) -> PurseResult<()> {
        let found = batch.check_lengths()?;
        if found != self.categories.len() {
            return Err(PurseError::CategoryCountMismatch {
                expected: self.categories.len(),
                found,
            });
        }

        let mut staged = self.categories.clone();
        for (i, category) in staged.iter_mut().enumerate() {
            category.name.clone_from(&batch.names[i]);
            category.rarity = batch.rarities[i];
            category.rewards = batch.rewards_at(i);
        }

        validate(&staged)?;
        self.categories = staged;
        Ok(())
    }

    /// Records one more purse minted into `index`.
    ///
    /// Callers select `index` from this registry's own weights, so it is
    /// always in range.
    pub(crate) fn record_mint(&mut self, index: usize) {
        self.categories[index].minted += 1;
    }
}

/// Checks the rarity and reward-split invariants over a full category set.
fn validate(categories: &[Category]) -> Result<(), CategoryDataViolation> {
    let sum: u64 = categories.iter().map(|c| u64::from(c.rarity)).sum();
    if sum != PERCENT_TOTAL {
        return Err(CategoryDataViolation::RaritySum { sum });
    }

    for (index, category) in categories.iter().enumerate() {
        if let Some(value) = category
            .rewards
            .iter()
            .map(|r| r.percentage)
            .find(|&p| u64::from(p) > PERCENT_TOTAL)
        {
            return Err(CategoryDataViolation::PercentageOutOfRange { index, value });
        }

        let sum = category.reward_percentage_sum();
        if sum != PERCENT_TOTAL {
            return Err(CategoryDataViolation::RewardSplit { index, sum });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(percentage: u32, amount: u64) -> RewardDistribution {
        RewardDistribution::new(percentage, amount)
    }

    fn reference_batch(rarities: [u32; 5]) -> CategoryBatch {
        let names = ["Common", "UnCommon", "Rare", "Ultra Rare", "Legendary"];
        let food = [(20, 5), (5, 10), (25, 10), (25, 20), (35, 50)];
        let potion = [(5, 1), (20, 1), (25, 1), (25, 2), (35, 5)];
        let ticket = [(75, 10), (75, 25), (50, 30), (50, 50), (30, 100)];

        (0..5).fold(CategoryBatch::new(), |batch, i| {
            batch.with_category(
                names[i],
                rarities[i],
                dist(food[i].0, food[i].1),
                dist(potion[i].0, potion[i].1),
                dist(ticket[i].0, ticket[i].1),
            )
        })
    }

    #[test]
    fn test_add_reference_categories() {
        let mut registry = CategoryRegistry::new();
        let first = registry.add_categories(&reference_batch([45, 25, 20, 7, 3])).unwrap();

        assert_eq!(first, 0);
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.category(0).unwrap().to_string(), "Common,45,0,20,5,75,5,1,10");
        assert_eq!(registry.category(3).unwrap().to_string(), "Ultra Rare,7,0,25,25,50,20,2,50");
    }

    #[test]
    fn test_rarity_sum_must_be_exactly_100() {
        let mut registry = CategoryRegistry::new();

        for rarities in [[45, 25, 20, 7, 2], [45, 25, 20, 7, 4]] {
            let err = registry.add_categories(&reference_batch(rarities)).unwrap_err();
            assert!(matches!(
                err,
                PurseError::InvalidCategoryData(CategoryDataViolation::RaritySum { .. })
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reward_split_must_be_exactly_100() {
        let mut registry = CategoryRegistry::new();
        let mut batch = reference_batch([45, 25, 20, 7, 3]);
        batch.potion_percentages[0] = 4;

        let err = registry.add_categories(&batch).unwrap_err();
        assert_eq!(
            err,
            PurseError::InvalidCategoryData(CategoryDataViolation::RewardSplit { index: 0, sum: 99 })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut registry = CategoryRegistry::new();
        let mut batch = CategoryBatch::new().with_category("name", 100, dist(40, 1), dist(40, 1), dist(20, 1));
        batch.rarities.push(100);

        let err = registry.add_categories(&batch).unwrap_err();
        assert_eq!(
            err,
            PurseError::InvalidCategoryData(CategoryDataViolation::LengthMismatch {
                field: "rarities",
                expected: 1,
                found: 2,
            })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_validates_against_whole_registry() {
        let mut registry = CategoryRegistry::new();
        registry.add_categories(&reference_batch([45, 25, 20, 7, 3])).unwrap();

        // Any further non-empty batch pushes the total past 100.
        let extra = CategoryBatch::new().with_category("Mythic", 1, dist(100, 1), dist(0, 0), dist(0, 0));
        let err = registry.add_categories(&extra).unwrap_err();
        assert_eq!(
            err,
            PurseError::InvalidCategoryData(CategoryDataViolation::RaritySum { sum: 101 })
        );
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_update_preserves_minted() {
        let mut registry = CategoryRegistry::new();
        registry.add_categories(&reference_batch([45, 25, 20, 7, 3])).unwrap();
        registry.record_mint(0);
        registry.record_mint(0);
        registry.record_mint(3);

        registry.update_categories(&reference_batch([40, 25, 20, 12, 3])).unwrap();

        assert_eq!(registry.category(0).unwrap().to_string(), "Common,40,2,20,5,75,5,1,10");
        assert_eq!(registry.category(3).unwrap().to_string(), "Ultra Rare,12,1,25,25,50,20,2,50");
        assert_eq!(registry.total_minted(), 3);
    }

    #[test]
    fn test_update_count_mismatch() {
        let mut registry = CategoryRegistry::new();
        registry.add_categories(&reference_batch([45, 25, 20, 7, 3])).unwrap();
        let before = registry.categories().to_vec();

        let mut short = reference_batch([45, 25, 20, 7, 3]);
        for field in [
            &mut short.food_percentages,
            &mut short.potion_percentages,
            &mut short.ticket_percentages,
            &mut short.rarities,
        ] {
            field.pop();
        }
        for field in [&mut short.food_amounts, &mut short.potion_amounts, &mut short.ticket_amounts] {
            field.pop();
        }
        short.names.pop();

        let err = registry.update_categories(&short).unwrap_err();
        assert_eq!(err, PurseError::CategoryCountMismatch { expected: 5, found: 4 });
        assert_eq!(registry.categories(), before.as_slice());
    }

    #[test]
    fn test_failed_update_is_atomic() {
        let mut registry = CategoryRegistry::new();
        registry.add_categories(&reference_batch([45, 25, 20, 7, 3])).unwrap();
        let before = registry.categories().to_vec();

        let mut batch = reference_batch([45, 25, 20, 7, 4]);
        batch.food_percentages[0] = 21;

        assert!(registry.update_categories(&batch).is_err());
        assert_eq!(registry.categories(), before.as_slice());
    }

    #[test]
    fn test_percentage_above_100_rejected() {
        let mut registry = CategoryRegistry::new();
        let batch = CategoryBatch::new().with_category("Odd", 100, dist(150, 1), dist(0, 0), dist(0, 0));

        let err = registry.add_categories(&batch).unwrap_err();
        assert_eq!(
            err,
            PurseError::InvalidCategoryData(CategoryDataViolation::PercentageOutOfRange {
                index: 0,
                value: 150,
            })
        );
    }

    #[test]
    fn test_category_index_out_of_range() {
        let registry = CategoryRegistry::new();
        assert_eq!(
            registry.category(0).unwrap_err(),
            PurseError::IndexOutOfRange { index: 0, len: 0 }
        );
    }
}
