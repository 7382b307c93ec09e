//! # Access Control
//!
//! One owner manages configuration; a set of minters may create purses.
//! Checks are plain predicates called at the top of every mutating operation.

use alloy_primitives::Address;
use std::collections::HashSet;

use crate::error::{PurseError, PurseResult};

/// Owner and minter roles.
#[derive(Clone, Debug)]
pub struct AccessControl {
    owner: Address,
    minters: HashSet<Address>,
}

impl AccessControl {
    /// Creates the role table with `owner` and no minters.
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            minters: HashSet::new(),
        }
    }

    /// Current owner.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Returns true if `account` holds the minter role.
    #[inline]
    #[must_use]
    pub fn is_minter(&self, account: Address) -> bool {
        self.minters.contains(&account)
    }

    /// Fails unless `caller` is the owner.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::Unauthorized`] for any other caller.
    #[inline]
    pub fn ensure_owner(&self, caller: Address) -> PurseResult<()> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(PurseError::Unauthorized { caller })
        }
    }

    /// Fails unless `caller` holds the minter role.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::Unauthorized`] for any other caller.
    #[inline]
    pub fn ensure_minter(&self, caller: Address) -> PurseResult<()> {
        if self.is_minter(caller) {
            Ok(())
        } else {
            Err(PurseError::Unauthorized { caller })
        }
    }

    /// Grants or revokes the minter role. Idempotent.
    ///
    /// Returns true if membership changed.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::Unauthorized`] unless `caller` is the owner.
    pub fn set_minter(&mut self, caller: Address, account: Address, enabled: bool) -> PurseResult<bool> {
        self.ensure_owner(caller)?;
        Ok(if enabled {
            self.minters.insert(account)
        } else {
            self.minters.remove(&account)
        })
    }

    /// Hands ownership to `new_owner`.
    ///
    /// # Errors
    ///
    /// - [`PurseError::Unauthorized`] unless `caller` is the owner
    /// - [`PurseError::InvalidOwner`] for the zero address
    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> PurseResult<Address> {
        self.ensure_owner(caller)?;
        if new_owner == Address::ZERO {
            return Err(PurseError::InvalidOwner);
        }
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::with_last_byte(1)
    }

    fn user() -> Address {
        Address::with_last_byte(2)
    }

    fn bad_actor() -> Address {
        Address::with_last_byte(3)
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut access = AccessControl::new(owner());

        assert!(access.set_minter(owner(), user(), true).unwrap());
        assert!(access.is_minter(user()));
        assert!(!access.set_minter(owner(), user(), true).unwrap());

        assert!(access.set_minter(owner(), user(), false).unwrap());
        assert!(!access.is_minter(user()));
        assert!(!access.set_minter(owner(), user(), false).unwrap());
    }

    #[test]
    fn test_non_owner_cannot_manage_minters() {
        let mut access = AccessControl::new(owner());

        assert_eq!(
            access.set_minter(bad_actor(), user(), true),
            Err(PurseError::Unauthorized { caller: bad_actor() })
        );
        assert!(!access.is_minter(user()));
    }

    #[test]
    fn test_owner_is_not_implicitly_minter() {
        let access = AccessControl::new(owner());
        assert!(access.ensure_minter(owner()).is_err());
    }

    #[test]
    fn test_transfer_ownership() {
        let mut access = AccessControl::new(owner());

        assert_eq!(access.transfer_ownership(owner(), Address::ZERO), Err(PurseError::InvalidOwner));
        assert_eq!(access.transfer_ownership(user(), user()), Err(PurseError::Unauthorized { caller: user() }));
        assert_eq!(access.transfer_ownership(owner(), user()), Ok(owner()));

        assert_eq!(access.owner(), user());
        assert!(access.ensure_owner(owner()).is_err());
        assert!(access.ensure_owner(user()).is_ok());
    }
}
