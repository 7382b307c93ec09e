//! # Purse Error Types
//!
//! All errors that can occur in the purse economy. Every rejected call maps to
//! exactly one variant so callers can tell which precondition failed.

use alloy_primitives::Address;
use thiserror::Error;

use crate::ledger::TokenId;

/// Which structural or invariant check rejected a category batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryDataViolation {
    /// One of the parallel input sequences has a different length.
    #[error("field `{field}` has {found} entries, expected {expected}")]
    LengthMismatch {
        /// The offending field.
        field: &'static str,
        /// Length of the `names` sequence.
        expected: usize,
        /// Length of the offending sequence.
        found: usize,
    },

    /// Rarity weights over the resulting registry do not add up to 100.
    #[error("rarity weights sum to {sum}, expected 100")]
    RaritySum {
        /// The rejected total.
        sum: u64,
    },

    /// A category's reward percentages do not add up to 100.
    #[error("reward percentages of category {index} sum to {sum}, expected 100")]
    RewardSplit {
        /// Category index in the resulting registry.
        index: usize,
        /// The rejected total.
        sum: u64,
    },

    /// A single percentage is above 100.
    #[error("category {index} has percentage {value} above 100")]
    PercentageOutOfRange {
        /// Category index in the resulting registry.
        index: usize,
        /// The rejected value.
        value: u32,
    },
}

/// Failure reported by a randomness source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RandomnessError {
    /// A draw over an empty range was requested.
    #[error("cannot draw from an empty range")]
    EmptyRange,

    /// A scripted source ran out of values.
    #[error("randomness source exhausted")]
    Exhausted,

    /// A scripted value does not fit the requested range.
    #[error("scripted draw {value} is not below bound {bound}")]
    OutOfRange {
        /// The scripted value.
        value: u32,
        /// The requested exclusive bound.
        bound: u32,
    },

    /// The source could not produce a value right now.
    #[error("randomness unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a reward issuer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    /// The reward token type was never registered with the issuer.
    #[error("unknown reward token type {0}")]
    UnknownTokenType(u64),

    /// The issuer refused the batch.
    #[error("reward issuance rejected: {0}")]
    Rejected(String),
}

/// Errors that can occur in the purse economy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurseError {
    /// Caller lacks the owner or minter privilege for this operation.
    #[error("caller {caller} is not authorized")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// Ownership cannot be handed to the zero address.
    #[error("new owner is the zero address")]
    InvalidOwner,

    /// A category batch failed structural or invariant validation.
    #[error("invalid purse category data: {0}")]
    InvalidCategoryData(CategoryDataViolation),

    /// An update batch does not cover the registry exactly.
    #[error("length doesn't match with purse categories: expected {expected}, got {found}")]
    CategoryCountMismatch {
        /// Current number of categories.
        expected: usize,
        /// Size of the submitted batch.
        found: usize,
    },

    /// Category index past the end of the registry.
    #[error("category index {index} out of range ({len} categories)")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Current number of categories.
        len: usize,
    },

    /// Minting was requested while no category is registered.
    #[error("no purse categories registered")]
    NoCategories,

    /// Mint quantity must be positive.
    #[error("mint quantity must be positive")]
    InvalidQuantity,

    /// No purse token with this id exists.
    #[error("purse token {0} does not exist")]
    UnknownToken(TokenId),

    /// Caller does not hold the purse token.
    #[error("{caller} is not owner of purse token {token_id}")]
    NotOwner {
        /// The purse token.
        token_id: TokenId,
        /// The rejected caller.
        caller: Address,
    },

    /// The purse token was already redeemed.
    #[error("purse token {0} was already consumed")]
    AlreadyConsumed(TokenId),

    /// Purse tokens cannot be sent to the zero address.
    #[error("recipient is the zero address")]
    InvalidRecipient,

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The randomness collaborator failed.
    #[error(transparent)]
    Randomness(#[from] RandomnessError),

    /// The reward issuance collaborator failed.
    #[error(transparent)]
    Issuance(#[from] IssuanceError),
}

impl From<CategoryDataViolation> for PurseError {
    fn from(violation: CategoryDataViolation) -> Self {
        Self::InvalidCategoryData(violation)
    }
}

/// Result type for purse operations.
pub type PurseResult<T> = Result<T, PurseError>;
