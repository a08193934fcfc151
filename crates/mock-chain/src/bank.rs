//! Account balances for the mock chain.
//!
//! The bank funds bid deposits and receives every payment the auction makes.
//! Accounts can be flagged as rejecting to simulate recipients whose code
//! refuses incoming value.

use std::collections::{HashMap, HashSet};

use auction_module::{AuctionState as ModuleState, TransferError, ValueTransfer};
use auction_types::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("Insufficient funds: balance {balance}, need {amount}")]
    InsufficientFunds { balance: u64, amount: u64 },

    #[error("Balance overflow")]
    Overflow,
}

#[derive(Debug, Default)]
pub struct Bank {
    balances: HashMap<Address, u64>,
    rejecting: HashSet<Address>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Add `amount` to an account. Returns the new balance.
    pub fn credit(&mut self, account: Address, amount: u64) -> Result<u64, BankError> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(BankError::Overflow)?;
        Ok(*balance)
    }

    pub fn debit(&mut self, account: &Address, amount: u64) -> Result<(), BankError> {
        let balance = self.balance_of(account);
        if balance < amount {
            return Err(BankError::InsufficientFunds { balance, amount });
        }
        self.balances.insert(*account, balance - amount);
        Ok(())
    }

    pub fn set_rejecting(&mut self, account: Address, rejecting: bool) {
        if rejecting {
            self.rejecting.insert(account);
        } else {
            self.rejecting.remove(&account);
        }
    }
}

impl ValueTransfer for Bank {
    fn pay(
        &mut self,
        _state: &mut ModuleState,
        recipient: Address,
        amount: u64,
    ) -> Result<(), TransferError> {
        if self.rejecting.contains(&recipient) {
            return Err(TransferError::Rejected);
        }
        self.credit(recipient, amount)
            .map(|_| ())
            .map_err(|e| TransferError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_types::AuctionTiming;

    #[test]
    fn test_credit_and_debit() {
        let mut bank = Bank::new();
        let alice = [1u8; 32];

        assert_eq!(bank.credit(alice, 100).unwrap(), 100);
        bank.debit(&alice, 40).unwrap();
        assert_eq!(bank.balance_of(&alice), 60);

        assert_eq!(
            bank.debit(&alice, 61),
            Err(BankError::InsufficientFunds {
                balance: 60,
                amount: 61
            })
        );
        assert_eq!(bank.credit(alice, u64::MAX), Err(BankError::Overflow));
    }

    #[test]
    fn test_rejecting_recipient() {
        let mut bank = Bank::new();
        let mut state =
            ModuleState::new([9u8; 32], AuctionTiming::from_durations(0, 10, 10).unwrap());
        let bob = [2u8; 32];

        bank.set_rejecting(bob, true);
        assert_eq!(
            bank.pay(&mut state, bob, 5),
            Err(TransferError::Rejected)
        );
        assert_eq!(bank.balance_of(&bob), 0);

        bank.set_rejecting(bob, false);
        bank.pay(&mut state, bob, 5).unwrap();
        assert_eq!(bank.balance_of(&bob), 5);
    }
}
