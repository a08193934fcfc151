//! Phase gating.
//!
//! Phases are time-driven: `Bidding` until `bidding_end`, `Revealing` until
//! `reveal_end`, `Ended` afterwards. The `ended` flag on the leader record
//! only tells whether the payout already happened.

use auction_types::Phase;

use crate::error::AuctionError;
use crate::state::AuctionState;

/// Fail with `PhaseViolation` unless the auction is in `expected` at `now`.
pub fn require_phase(state: &AuctionState, now: u64, expected: Phase) -> Result<(), AuctionError> {
    let got = state.phase(now);
    if got != expected {
        return Err(AuctionError::PhaseViolation { expected, got });
    }
    Ok(())
}

/// Check the `auction_end` preconditions: reveal window closed, not yet ended.
pub fn require_endable(state: &AuctionState, now: u64) -> Result<(), AuctionError> {
    require_phase(state, now, Phase::Ended)?;
    if state.is_ended() {
        return Err(AuctionError::AlreadyEnded);
    }
    Ok(())
}
