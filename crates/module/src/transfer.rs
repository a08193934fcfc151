//! Value-transfer seam between the module and its host.
//!
//! The host implements [`ValueTransfer`] to move funds out of the auction.
//! A transfer may run recipient code, and that code may call back into the
//! module: the implementation receives the module state for exactly that
//! purpose. Handlers only invoke `pay` after every effect of the current call
//! is in place.

use auction_types::Address;
use thiserror::Error;

use crate::state::AuctionState;

/// Errors a transfer can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Recipient rejected the payment")]
    Rejected,

    #[error("Transfer failed: {0}")]
    Failed(String),
}

/// Outgoing payment capability.
pub trait ValueTransfer {
    /// Pay `amount` to `recipient`.
    ///
    /// `state` is the auction's own state; a recipient that re-enters the
    /// module observes every effect of the call that is paying it.
    fn pay(
        &mut self,
        state: &mut AuctionState,
        recipient: Address,
        amount: u64,
    ) -> Result<(), TransferError>;
}

/// Transfer that records payments and can be told to reject recipients.
#[derive(Debug, Default)]
pub struct MockTransfer {
    pub payments: Vec<(Address, u64)>,
    pub rejecting: Vec<Address>,
}

impl MockTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every payment to `recipient` fail.
    pub fn reject(mut self, recipient: Address) -> Self {
        self.rejecting.push(recipient);
        self
    }

    /// Total paid to `recipient` so far.
    pub fn paid_to(&self, recipient: &Address) -> u64 {
        self.payments
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, amount)| amount)
            .sum()
    }
}

impl ValueTransfer for MockTransfer {
    fn pay(
        &mut self,
        _state: &mut AuctionState,
        recipient: Address,
        amount: u64,
    ) -> Result<(), TransferError> {
        if self.rejecting.contains(&recipient) {
            return Err(TransferError::Rejected);
        }
        self.payments.push((recipient, amount));
        Ok(())
    }
}
