//! Deposit ledger: blinded bids per bidder and reveal settlement.

use std::collections::HashMap;

use auction_commitment::verify_commitment;
use auction_types::{Address, Bid, Commitment, RevealEntry};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AuctionError;
use crate::tracker::HighestBidTracker;

/// What a single reveal call settled.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct RevealOutcome {
    /// Amount paid back to the bidder immediately
    pub refund: u64,
    /// Entries whose commitment matched and was consumed
    pub revealed: u32,
    /// Entries whose opening did not match; they stay sealed and unrefunded
    pub forfeited: u32,
    /// Entries that had already been consumed by an earlier reveal
    pub already_revealed: u32,
    /// Value now locked as the leading bid, if this call took the lead
    pub leading_value: Option<u64>,
}

/// Ordered blinded bids per bidder.
///
/// Bids are appended during bidding and never removed; a revealed bid keeps
/// its slot with a consumed commitment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepositLedger {
    bids: HashMap<Address, Vec<Bid>>,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a blinded bid. Returns its position in the bidder's sequence.
    pub fn post_bid(&mut self, bidder: Address, commitment: Commitment, deposit: u64) -> usize {
        let bids = self.bids.entry(bidder).or_default();
        bids.push(Bid {
            commitment,
            deposit,
        });
        bids.len() - 1
    }

    pub fn bids_of(&self, bidder: &Address) -> &[Bid] {
        self.bids.get(bidder).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bid_count(&self, bidder: &Address) -> usize {
        self.bids.get(bidder).map(Vec::len).unwrap_or(0)
    }

    /// Number of distinct bidders.
    pub fn bidder_count(&self) -> usize {
        self.bids.len()
    }

    /// Sum of deposits on bids that have not been revealed yet.
    pub fn unrevealed_deposits(&self) -> u64 {
        self.bids
            .values()
            .flatten()
            .filter(|bid| !bid.is_revealed())
            .fold(0u64, |acc, bid| acc.saturating_add(bid.deposit))
    }

    /// Open every stored bid of `bidder` with the positional `entries`.
    ///
    /// Fails before touching any bid when the entry count differs from the
    /// stored bid count. Mismatching entries are skipped untouched and add
    /// nothing to the refund. Matching entries are consumed and their deposit refunded,
    /// except for the value that takes the lead through `tracker`.
    ///
    /// Every consumed slot is pushed to `consumed` with its original
    /// commitment, including when an `ArithmeticOverflow` error stops the
    /// loop part way; [`DepositLedger::restore`] undoes them.
    pub fn reveal_all(
        &mut self,
        bidder: Address,
        entries: &[RevealEntry],
        tracker: &mut HighestBidTracker<'_>,
        consumed: &mut Vec<(usize, Commitment)>,
    ) -> Result<RevealOutcome, AuctionError> {
        let stored = self.bid_count(&bidder);
        if entries.len() != stored {
            return Err(AuctionError::RevealLengthMismatch {
                expected: stored,
                got: entries.len(),
            });
        }

        let mut outcome = RevealOutcome::default();
        let Some(bids) = self.bids.get_mut(&bidder) else {
            return Ok(outcome);
        };

        for (index, (bid, entry)) in bids.iter_mut().zip(entries).enumerate() {
            if bid.is_revealed() {
                outcome.already_revealed += 1;
                continue;
            }
            if !verify_commitment(&bid.commitment, entry.value, entry.fake, &entry.secret) {
                warn!(index, deposit = bid.deposit, "Commitment mismatch, deposit forfeit");
                outcome.forfeited += 1;
                continue;
            }

            outcome.refund = outcome
                .refund
                .checked_add(bid.deposit)
                .ok_or(AuctionError::ArithmeticOverflow)?;
            consumed.push((index, bid.commitment));
            bid.commitment = Commitment::CONSUMED;
            outcome.revealed += 1;

            let valid = !entry.fake && bid.deposit >= entry.value;
            debug!(index, value = entry.value, fake = entry.fake, valid, "Bid revealed");

            if valid && tracker.place_bid(bidder, entry.value)? {
                // deposit >= value, and deposit is already in the refund
                outcome.refund -= entry.value;
                outcome.leading_value = Some(entry.value);
            }
        }

        Ok(outcome)
    }

    /// Put back commitments consumed by a reveal that is being rolled back.
    pub fn restore(&mut self, bidder: &Address, consumed: &[(usize, Commitment)]) {
        let Some(bids) = self.bids.get_mut(bidder) else {
            return;
        };
        for (index, commitment) in consumed {
            if let Some(bid) = bids.get_mut(*index) {
                bid.commitment = *commitment;
            }
        }
    }
}
