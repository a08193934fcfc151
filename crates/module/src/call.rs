//! Call message types for the auction module.

use auction_types::{AuctionResult, Commitment, RevealEntry};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::ledger::RevealOutcome;

/// Call messages for the auction module.
///
/// The attached value of the enclosing transaction (`CallContext::value`) is
/// the deposit for `Bid` and is ignored by every other call.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    /// Post a blinded bid (bidding phase).
    Bid { commitment: Commitment },

    /// Open all of the sender's blinded bids, in posting order (reveal phase).
    Reveal { entries: Vec<RevealEntry> },

    /// Pull the sender's pending return (any phase).
    Withdraw,

    /// Close the auction and pay the beneficiary (once, after reveal).
    AuctionEnd,
}

/// Result of a dispatched call.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum CallOutcome {
    BidPlaced { index: u64 },
    Revealed(RevealOutcome),
    Withdrawn { amount: u64 },
    Ended(AuctionResult),
}
