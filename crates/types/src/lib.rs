//! Core type definitions for commit-reveal blind auctions.
//!
//! This crate provides the data structures shared by the auction module, the
//! bidder client and the mock chain: commitments and secrets, stored bids,
//! reveal entries, the leader record and the auction timing/phase model.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

// =========================
// IDENTITIES AND DIGESTS
// =========================

/// Generic address type (32 bytes)
pub type Address = [u8; 32];

/// The all-zero address. Never a valid beneficiary.
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Blinded bid: a 32-byte digest binding a bidder to `(value, fake, secret)`.
///
/// The all-zero digest is the consumed sentinel: a bid whose commitment has
/// been cleared was already revealed and can never be claimed again.
#[serde_as]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct Commitment(#[serde_as(as = "Hex")] pub [u8; 32]);

impl Commitment {
    /// Sentinel stored in place of a revealed commitment.
    pub const CONSUMED: Commitment = Commitment([0u8; 32]);

    /// Whether this commitment has been cleared by a successful reveal.
    pub fn is_consumed(&self) -> bool {
        *self == Self::CONSUMED
    }
}

/// Bidder-chosen blinding secret (32 bytes).
#[serde_as]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct Secret(#[serde_as(as = "Hex")] pub [u8; 32]);

// =========================
// BIDS
// =========================

/// A blinded bid as stored by the auction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Bid {
    pub commitment: Commitment,
    /// Value escrowed alongside the commitment. Unconstrained relative to
    /// the real bid value.
    pub deposit: u64,
}

impl Bid {
    pub fn is_revealed(&self) -> bool {
        self.commitment.is_consumed()
    }
}

/// Opening of one blinded bid, supplied positionally during reveal.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RevealEntry {
    pub value: u64,
    pub fake: bool,
    pub secret: Secret,
}

// =========================
// AUCTION STATE
// =========================

/// Current leader of the auction plus the settlement flag.
///
/// `highest_bid == 0` means no valid bid has been revealed yet.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct AuctionState {
    pub highest_bidder: Option<Address>,
    pub highest_bid: u64,
    pub ended: bool,
}

/// Auction phase, derived from the clock.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub enum Phase {
    /// Accepting blinded bids
    Bidding,
    /// Accepting reveals
    Revealing,
    /// Reveal window closed; payout may be triggered
    Ended,
}

/// Fixed phase boundaries of one auction. `bidding_end < reveal_end`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct AuctionTiming {
    pub start_time: u64,
    pub bidding_end: u64,
    pub reveal_end: u64,
}

impl AuctionTiming {
    /// Derive boundaries from durations. Returns `None` on a zero duration or
    /// on timestamp overflow.
    pub fn from_durations(start_time: u64, bidding_time: u64, reveal_time: u64) -> Option<Self> {
        if bidding_time == 0 || reveal_time == 0 {
            return None;
        }
        let bidding_end = start_time.checked_add(bidding_time)?;
        let reveal_end = bidding_end.checked_add(reveal_time)?;
        Some(Self {
            start_time,
            bidding_end,
            reveal_end,
        })
    }

    /// Phase in effect at `now`.
    pub fn phase_at(&self, now: u64) -> Phase {
        if now < self.bidding_end {
            Phase::Bidding
        } else if now < self.reveal_end {
            Phase::Revealing
        } else {
            Phase::Ended
        }
    }
}

/// Settlement record, written once by `auction_end`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionResult {
    pub winner: Option<Address>,
    pub winning_bid: u64,
    pub beneficiary: Address,
    pub ended_at: u64,
}

/// Events recorded by the auction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum AuctionEvent {
    /// A revealed bid took the lead.
    HighestBidIncreased { bidder: Address, amount: u64 },

    /// The auction was closed and the beneficiary paid. Emitted exactly once.
    AuctionEnded {
        winner: Option<Address>,
        amount: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_boundaries() {
        let timing = AuctionTiming::from_durations(100, 50, 30).unwrap();
        assert_eq!(timing.bidding_end, 150);
        assert_eq!(timing.reveal_end, 180);

        assert_eq!(timing.phase_at(0), Phase::Bidding);
        assert_eq!(timing.phase_at(149), Phase::Bidding);
        assert_eq!(timing.phase_at(150), Phase::Revealing);
        assert_eq!(timing.phase_at(179), Phase::Revealing);
        assert_eq!(timing.phase_at(180), Phase::Ended);
        assert_eq!(timing.phase_at(u64::MAX), Phase::Ended);
    }

    #[test]
    fn test_timing_rejects_zero_and_overflow() {
        assert!(AuctionTiming::from_durations(0, 0, 10).is_none());
        assert!(AuctionTiming::from_durations(0, 10, 0).is_none());
        assert!(AuctionTiming::from_durations(u64::MAX - 5, 3, 3).is_none());
    }

    #[test]
    fn test_consumed_commitment() {
        assert!(Commitment::CONSUMED.is_consumed());
        assert!(Commitment::default().is_consumed());
        assert!(!Commitment([7u8; 32]).is_consumed());

        let bid = Bid {
            commitment: Commitment::CONSUMED,
            deposit: 10,
        };
        assert!(bid.is_revealed());
    }

    #[test]
    fn test_commitment_serializes_as_hex() {
        let commitment = Commitment([0xab; 32]);
        let json = serde_json::to_string(&commitment).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));

        let decoded: Commitment = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, commitment);
    }

    #[test]
    fn test_reveal_entry_borsh() {
        let entry = RevealEntry {
            value: 42,
            fake: true,
            secret: Secret([9u8; 32]),
        };
        let encoded = borsh::to_vec(&entry).unwrap();
        let decoded: RevealEntry = borsh::from_slice(&encoded).unwrap();
        assert_eq!(entry, decoded);
    }
}
