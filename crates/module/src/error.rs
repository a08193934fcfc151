//! Auction module error types.

use thiserror::Error;

use auction_types::{Address, Phase};

/// Errors that can occur in the auction module.
///
/// Every variant is returned with the failing call's own changes undone.
/// Calls that ran nested inside its payout keep their effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Phase violation. Expected: {expected:?}, Got: {got:?}")]
    PhaseViolation { expected: Phase, got: Phase },

    #[error("Reveal length mismatch: {expected} bids stored, {got} entries supplied")]
    RevealLengthMismatch { expected: usize, got: usize },

    #[error("Auction already ended")]
    AlreadyEnded,

    #[error("A reveal refund or the beneficiary payout is still in progress")]
    PayoutInProgress,

    #[error("Transfer of {amount} to {} failed: {reason}", hex::encode(.recipient))]
    TransferFailed {
        recipient: Address,
        amount: u64,
        reason: String,
    },

    #[error("Arithmetic overflow in deposit accounting")]
    ArithmeticOverflow,

    #[error("Escrow balance {held} cannot cover payment of {amount}")]
    InsufficientEscrow { held: u64, amount: u64 },
}
