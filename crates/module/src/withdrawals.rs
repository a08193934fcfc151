//! Pending withdrawals owed to outbid leaders.
//!
//! Funds land here only through [`PendingWithdrawals::credit`] and leave only
//! through [`PendingWithdrawals::take_above`], which removes the balance
//! before the caller pays it out, or through [`PendingWithdrawals::revoke`]
//! when the call that granted them is rolled back.

use std::collections::HashMap;

use auction_types::Address;

use crate::error::AuctionError;

/// Per-bidder balances that are owed but not yet paid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingWithdrawals {
    balances: HashMap<Address, u64>,
}

impl PendingWithdrawals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the bidder's balance.
    pub fn credit(&mut self, bidder: Address, amount: u64) -> Result<(), AuctionError> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.balances.entry(bidder).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(AuctionError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Remove and return everything above `reserved` from the bidder's
    /// balance. The reserved part stays put.
    pub fn take_above(&mut self, bidder: &Address, reserved: u64) -> u64 {
        let Some(balance) = self.balances.get_mut(bidder) else {
            return 0;
        };
        let amount = balance.saturating_sub(reserved);
        *balance -= amount;
        if *balance == 0 {
            self.balances.remove(bidder);
        }
        amount
    }

    /// Take back a credit granted by a call that is being rolled back.
    pub fn revoke(&mut self, bidder: &Address, amount: u64) {
        if let Some(balance) = self.balances.get_mut(bidder) {
            *balance = balance.saturating_sub(amount);
            if *balance == 0 {
                self.balances.remove(bidder);
            }
        }
    }

    pub fn balance_of(&self, bidder: &Address) -> u64 {
        self.balances.get(bidder).copied().unwrap_or(0)
    }

    /// Sum of all outstanding balances, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.balances
            .values()
            .fold(0u64, |acc, amount| acc.saturating_add(*amount))
    }

    /// Bidders with a non-zero balance.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.balances.iter()
    }
}
