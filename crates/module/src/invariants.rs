//! Invariant checker for the auction module.

use thiserror::Error;

use crate::state::AuctionState;

/// A violated state invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Escrow {escrow} cannot cover {owed} still owed")]
    Insolvent { owed: u64, escrow: u64 },

    #[error("Highest bid {0} recorded without a highest bidder")]
    OrphanHighestBid(u64),

    #[error("Auction marked ended without a result")]
    EndedWithoutResult,
}

/// Check all invariants. Returns Err if any violated.
pub fn check_invariants(state: &AuctionState) -> Result<(), InvariantViolation> {
    check_solvency(state)?;

    // LeaderConsistency
    if state.leader.highest_bidder.is_none() && state.leader.highest_bid != 0 {
        return Err(InvariantViolation::OrphanHighestBid(state.leader.highest_bid));
    }

    // EndedImpliesResult
    if state.is_ended() && state.result.is_none() {
        return Err(InvariantViolation::EndedWithoutResult);
    }

    Ok(())
}

/// Everything the auction may still pay out must be covered by what it
/// holds: pending returns, the highest bid until auction end, and the
/// deposits of bids nobody has opened yet.
pub fn check_solvency(state: &AuctionState) -> Result<(), InvariantViolation> {
    let unpaid_highest = if state.is_ended() {
        0
    } else {
        state.leader.highest_bid
    };
    let owed = state
        .pending
        .total()
        .saturating_add(unpaid_highest)
        .saturating_add(state.ledger.unrevealed_deposits());

    if owed > state.escrow_balance {
        return Err(InvariantViolation::Insolvent {
            owed,
            escrow: state.escrow_balance,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_types::AuctionTiming;

    fn test_state() -> AuctionState {
        AuctionState::new([9u8; 32], AuctionTiming::from_durations(0, 100, 50).unwrap())
    }

    #[test]
    fn test_fresh_state_is_valid() {
        assert!(check_invariants(&test_state()).is_ok());
    }

    #[test]
    fn test_insolvency_detected() {
        let mut state = test_state();
        state.add_escrow(10);
        state.pending.credit([1u8; 32], 8).unwrap();
        state.leader.highest_bidder = Some([2u8; 32]);
        state.leader.highest_bid = 5;

        assert_eq!(
            check_solvency(&state),
            Err(InvariantViolation::Insolvent {
                owed: 13,
                escrow: 10
            })
        );
    }

    #[test]
    fn test_sealed_deposits_count_as_owed() {
        let mut state = test_state();
        state.ledger.post_bid([1u8; 32], auction_types::Commitment([4u8; 32]), 12);
        state.add_escrow(10);

        assert_eq!(
            check_solvency(&state),
            Err(InvariantViolation::Insolvent {
                owed: 12,
                escrow: 10
            })
        );
        state.add_escrow(2);
        assert!(check_solvency(&state).is_ok());
    }

    #[test]
    fn test_orphan_highest_bid_detected() {
        let mut state = test_state();
        state.add_escrow(5);
        state.leader.highest_bid = 5;

        assert_eq!(
            check_invariants(&state),
            Err(InvariantViolation::OrphanHighestBid(5))
        );
    }
}
