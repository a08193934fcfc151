//! RPC-compatible types for the mock chain.
//!
//! Addresses and commitments travel as hex strings.

use auction_module::AuctionSummary;
use auction_types::{AuctionEvent, AuctionResult, Bid, Phase, RevealEntry};
use serde::{Deserialize, Serialize};

/// Block info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for posting a blinded bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidParams {
    pub sender: String,
    /// Hex-encoded commitment (32 bytes)
    pub commitment: String,
    /// Value attached to the call
    pub deposit: u64,
}

/// Parameters for revealing bids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealParams {
    pub sender: String,
    /// One entry per posted bid, in posting order
    pub entries: Vec<RevealEntry>,
}

/// Blinded bid for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRpc {
    pub commitment: String,
    pub deposit: u64,
    pub revealed: bool,
}

impl From<&Bid> for BidRpc {
    fn from(b: &Bid) -> Self {
        Self {
            commitment: hex::encode(b.commitment.0),
            deposit: b.deposit,
            revealed: b.is_revealed(),
        }
    }
}

/// Settlement result for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionResultRpc {
    pub winner: Option<String>,
    pub winning_bid: u64,
    pub beneficiary: String,
    pub ended_at: u64,
}

impl From<AuctionResult> for AuctionResultRpc {
    fn from(r: AuctionResult) -> Self {
        Self {
            winner: r.winner.map(hex::encode),
            winning_bid: r.winning_bid,
            beneficiary: hex::encode(r.beneficiary),
            ended_at: r.ended_at,
        }
    }
}

/// Auction event for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuctionEventRpc {
    HighestBidIncreased {
        bidder: String,
        amount: u64,
    },
    AuctionEnded {
        winner: Option<String>,
        amount: u64,
    },
}

impl From<&AuctionEvent> for AuctionEventRpc {
    fn from(e: &AuctionEvent) -> Self {
        match e {
            AuctionEvent::HighestBidIncreased { bidder, amount } => Self::HighestBidIncreased {
                bidder: hex::encode(bidder),
                amount: *amount,
            },
            AuctionEvent::AuctionEnded { winner, amount } => Self::AuctionEnded {
                winner: winner.map(hex::encode),
                amount: *amount,
            },
        }
    }
}

/// Auction status for RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSummaryRpc {
    pub beneficiary: String,
    /// "bidding", "revealing" or "ended"
    pub phase: String,
    pub ended: bool,
    pub bidding_end: u64,
    pub reveal_end: u64,
    pub highest_bidder: Option<String>,
    pub highest_bid: u64,
    pub num_bidders: usize,
    pub escrow_balance: u64,
    pub timestamp: u64,
}

impl AuctionSummaryRpc {
    pub fn new(s: AuctionSummary, timestamp: u64) -> Self {
        Self {
            beneficiary: hex::encode(s.beneficiary),
            phase: match s.phase {
                Phase::Bidding => "bidding",
                Phase::Revealing => "revealing",
                Phase::Ended => "ended",
            }
            .to_string(),
            ended: s.ended,
            bidding_end: s.bidding_end,
            reveal_end: s.reveal_end,
            highest_bidder: s.highest_bidder.map(hex::encode),
            highest_bid: s.highest_bid,
            num_bidders: s.num_bidders,
            escrow_balance: s.escrow_balance,
            timestamp,
        }
    }
}

/// Outstanding pending return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReturnRpc {
    pub bidder: String,
    pub amount: u64,
}
