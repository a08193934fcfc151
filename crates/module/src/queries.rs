//! Query handlers for the auction module.
//!
//! These functions provide read-only access to auction state.

use auction_types::{
    Address, AuctionEvent, AuctionResult, AuctionState as LeaderState, AuctionTiming, Bid, Phase,
};
use serde::{Deserialize, Serialize};

use crate::state::AuctionState as ModuleState;

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get a bidder's blinded bids, in posting order.
    GetBids { bidder: Address },

    /// Get the current leader record.
    GetLeader,

    /// Get a bidder's pending return.
    GetPendingReturn { bidder: Address },

    /// Get the phase at a given time.
    GetPhase { now: u64 },

    /// Check whether the payout happened.
    IsEnded,

    /// Get the settlement result.
    GetResult,

    /// Get the event log.
    GetEvents,

    /// Get the value currently held by the auction.
    GetEscrowBalance,

    /// Get the phase boundaries.
    GetTiming,
}

/// Query response types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    Bids(Vec<Bid>),
    Leader(LeaderState),
    PendingReturn(u64),
    Phase(Phase),
    Ended(bool),
    Result(Option<AuctionResult>),
    Events(Vec<AuctionEvent>),
    EscrowBalance(u64),
    Timing(AuctionTiming),
}

/// Handle a query.
pub fn handle_query(state: &ModuleState, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::GetBids { bidder } => {
            AuctionQueryResponse::Bids(state.get_bids(&bidder).to_vec())
        }

        AuctionQuery::GetLeader => AuctionQueryResponse::Leader(state.leader.clone()),

        AuctionQuery::GetPendingReturn { bidder } => {
            AuctionQueryResponse::PendingReturn(state.get_pending_return(&bidder))
        }

        AuctionQuery::GetPhase { now } => AuctionQueryResponse::Phase(state.phase(now)),

        AuctionQuery::IsEnded => AuctionQueryResponse::Ended(state.is_ended()),

        AuctionQuery::GetResult => AuctionQueryResponse::Result(state.result.clone()),

        AuctionQuery::GetEvents => AuctionQueryResponse::Events(state.events.clone()),

        AuctionQuery::GetEscrowBalance => AuctionQueryResponse::EscrowBalance(state.escrow_balance),

        AuctionQuery::GetTiming => AuctionQueryResponse::Timing(state.timing),
    }
}

/// Summary of the auction for status displays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub beneficiary: Address,
    pub phase: Phase,
    pub ended: bool,
    pub bidding_end: u64,
    pub reveal_end: u64,
    pub highest_bidder: Option<Address>,
    pub highest_bid: u64,
    pub num_bidders: usize,
    pub escrow_balance: u64,
}

impl AuctionSummary {
    /// Create summary from module state at time `now`.
    pub fn from_state(state: &ModuleState, now: u64) -> Self {
        Self {
            beneficiary: state.beneficiary,
            phase: state.phase(now),
            ended: state.is_ended(),
            bidding_end: state.timing.bidding_end,
            reveal_end: state.timing.reveal_end,
            highest_bidder: state.leader.highest_bidder,
            highest_bid: state.leader.highest_bid,
            num_bidders: state.ledger.bidder_count(),
            escrow_balance: state.escrow_balance,
        }
    }
}

/// Bidders that still have a pending return to withdraw.
pub fn get_pending_withdrawals(state: &ModuleState) -> Vec<(Address, u64)> {
    let mut owed: Vec<(Address, u64)> = state
        .pending
        .iter()
        .map(|(bidder, amount)| (*bidder, *amount))
        .collect();
    owed.sort();
    owed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> ModuleState {
        ModuleState::new([9u8; 32], AuctionTiming::from_durations(0, 100, 50).unwrap())
    }

    #[test]
    fn test_get_pending_return_query() {
        let mut state = test_state();
        let addr = [1u8; 32];
        state.pending.credit(addr, 100).unwrap();

        let response = handle_query(&state, AuctionQuery::GetPendingReturn { bidder: addr });
        assert_eq!(response, AuctionQueryResponse::PendingReturn(100));
    }

    #[test]
    fn test_get_bids_unknown_bidder() {
        let state = test_state();
        let response = handle_query(&state, AuctionQuery::GetBids { bidder: [5u8; 32] });
        assert_eq!(response, AuctionQueryResponse::Bids(vec![]));
    }

    #[test]
    fn test_phase_and_ended_queries() {
        let state = test_state();
        assert_eq!(
            handle_query(&state, AuctionQuery::GetPhase { now: 120 }),
            AuctionQueryResponse::Phase(Phase::Revealing)
        );
        assert_eq!(
            handle_query(&state, AuctionQuery::IsEnded),
            AuctionQueryResponse::Ended(false)
        );
        assert_eq!(
            handle_query(&state, AuctionQuery::GetResult),
            AuctionQueryResponse::Result(None)
        );
    }

    #[test]
    fn test_summary() {
        let mut state = test_state();
        state.ledger.post_bid([1u8; 32], auction_types::Commitment([1u8; 32]), 10);
        state.ledger.post_bid([1u8; 32], auction_types::Commitment([2u8; 32]), 10);
        state.ledger.post_bid([2u8; 32], auction_types::Commitment([3u8; 32]), 10);

        let summary = AuctionSummary::from_state(&state, 0);
        assert_eq!(summary.phase, Phase::Bidding);
        assert_eq!(summary.num_bidders, 2);
        assert_eq!(summary.highest_bidder, None);
    }

    #[test]
    fn test_pending_withdrawals_sorted() {
        let mut state = test_state();
        state.pending.credit([3u8; 32], 5).unwrap();
        state.pending.credit([1u8; 32], 7).unwrap();

        assert_eq!(
            get_pending_withdrawals(&state),
            vec![([1u8; 32], 7), ([3u8; 32], 5)]
        );
    }
}
