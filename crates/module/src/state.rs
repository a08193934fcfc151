//! State structures for one auction instance.

use auction_types::{
    Address, AuctionEvent, AuctionResult, AuctionState as LeaderState, AuctionTiming, Bid, Phase,
};

use crate::genesis::{AuctionGenesisConfig, GenesisValidationError, WithdrawFailurePolicy};
use crate::ledger::DepositLedger;
use crate::withdrawals::PendingWithdrawals;

/// A payout whose host transfer has not returned yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayoutFrame {
    /// Reveal refund, with the pending returns that reveal granted
    Reveal { credits: Vec<(Address, u64)> },
    Withdraw,
    AuctionEnd,
}

/// Auction module state.
///
/// In a real chain these would be storage maps and values. This is the
/// in-memory representation the handlers mutate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuctionState {
    /// Recipient of the winning bid
    pub beneficiary: Address,

    /// Phase boundaries
    pub timing: AuctionTiming,

    /// What `withdraw` does when the payout transfer fails
    pub withdraw_failure_policy: WithdrawFailurePolicy,

    /// Current leader and the settlement flag
    pub leader: LeaderState,

    /// Blinded bids per bidder
    pub ledger: DepositLedger,

    /// Balances owed to outbid leaders
    pub pending: PendingWithdrawals,

    /// Value currently held by the auction: deposits received minus payouts
    pub escrow_balance: u64,

    /// Settlement record, set once by `auction_end`
    pub result: Option<AuctionResult>,

    /// Event log
    pub events: Vec<AuctionEvent>,

    /// Payouts in progress, innermost last. Empty between top-level calls.
    pub payouts_in_flight: Vec<PayoutFrame>,
}

impl AuctionState {
    /// Create a new auction state.
    pub fn new(beneficiary: Address, timing: AuctionTiming) -> Self {
        Self {
            beneficiary,
            timing,
            withdraw_failure_policy: WithdrawFailurePolicy::default(),
            leader: LeaderState::default(),
            ledger: DepositLedger::new(),
            pending: PendingWithdrawals::new(),
            escrow_balance: 0,
            result: None,
            events: Vec::new(),
            payouts_in_flight: Vec::new(),
        }
    }

    /// Build the initial state from a validated genesis config.
    pub fn from_genesis(config: &AuctionGenesisConfig) -> Result<Self, GenesisValidationError> {
        let timing = config.validate()?;
        let mut state = Self::new(config.beneficiary, timing);
        state.withdraw_failure_policy = config.withdraw_failure_policy;
        Ok(state)
    }

    /// Phase in effect at `now`.
    pub fn phase(&self, now: u64) -> Phase {
        self.timing.phase_at(now)
    }

    pub fn is_ended(&self) -> bool {
        self.leader.ended
    }

    pub fn get_bids(&self, bidder: &Address) -> &[Bid] {
        self.ledger.bids_of(bidder)
    }

    pub fn get_pending_return(&self, bidder: &Address) -> u64 {
        self.pending.balance_of(bidder)
    }

    /// True while a reveal refund or the beneficiary payout is being
    /// transferred. The leader record must not change until it returns.
    pub fn leader_locked(&self) -> bool {
        self.payouts_in_flight
            .iter()
            .any(|frame| !matches!(frame, PayoutFrame::Withdraw))
    }

    /// Part of the bidder's pending return granted by reveals whose refund
    /// is still being transferred. It cannot be withdrawn yet.
    pub fn unsettled_credit(&self, bidder: &Address) -> u64 {
        self.payouts_in_flight
            .iter()
            .filter_map(|frame| match frame {
                PayoutFrame::Reveal { credits } => Some(credits),
                _ => None,
            })
            .flatten()
            .filter(|(who, _)| who == bidder)
            .fold(0u64, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    /// Add to the escrow balance.
    pub fn add_escrow(&mut self, amount: u64) -> bool {
        match self.escrow_balance.checked_add(amount) {
            Some(total) => {
                self.escrow_balance = total;
                true
            }
            None => false,
        }
    }

    /// Subtract from the escrow balance.
    pub fn subtract_escrow(&mut self, amount: u64) -> bool {
        if self.escrow_balance >= amount {
            self.escrow_balance -= amount;
            return true;
        }
        false
    }

    /// Give back escrow debited for a payment that did not go through.
    pub fn restore_escrow(&mut self, amount: u64) {
        self.escrow_balance = self.escrow_balance.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AuctionState {
        AuctionState::new([9u8; 32], AuctionTiming::from_durations(0, 100, 50).unwrap())
    }

    #[test]
    fn test_escrow_operations() {
        let mut state = test_state();
        assert_eq!(state.escrow_balance, 0);

        assert!(state.add_escrow(100));
        assert!(state.add_escrow(50));
        assert_eq!(state.escrow_balance, 150);

        assert!(state.subtract_escrow(75));
        assert_eq!(state.escrow_balance, 75);

        assert!(!state.subtract_escrow(100));
        assert_eq!(state.escrow_balance, 75);

        assert!(!state.add_escrow(u64::MAX));
        assert_eq!(state.escrow_balance, 75);

        state.restore_escrow(25);
        assert_eq!(state.escrow_balance, 100);
    }

    #[test]
    fn test_payout_frames() {
        let mut state = test_state();
        let a = [1u8; 32];
        assert!(!state.leader_locked());

        state.payouts_in_flight.push(PayoutFrame::Withdraw);
        assert!(!state.leader_locked());

        state.payouts_in_flight.push(PayoutFrame::Reveal {
            credits: vec![(a, 10), ([2u8; 32], 4), (a, 5)],
        });
        assert!(state.leader_locked());
        assert_eq!(state.unsettled_credit(&a), 15);
        assert_eq!(state.unsettled_credit(&[3u8; 32]), 0);

        state.payouts_in_flight.clear();
        state.payouts_in_flight.push(PayoutFrame::AuctionEnd);
        assert!(state.leader_locked());
        assert_eq!(state.unsettled_credit(&a), 0);
    }

    #[test]
    fn test_phase_follows_timing() {
        let state = test_state();
        assert_eq!(state.phase(0), Phase::Bidding);
        assert_eq!(state.phase(100), Phase::Revealing);
        assert_eq!(state.phase(150), Phase::Ended);
        assert!(!state.is_ended());
    }

    #[test]
    fn test_from_genesis() {
        let config = AuctionGenesisConfig {
            beneficiary: [7u8; 32],
            start_time: 10,
            bidding_time: 20,
            reveal_time: 30,
            withdraw_failure_policy: WithdrawFailurePolicy::Restore,
        };
        let state = AuctionState::from_genesis(&config).unwrap();

        assert_eq!(state.timing.bidding_end, 30);
        assert_eq!(state.timing.reveal_end, 60);
        assert_eq!(state.withdraw_failure_policy, WithdrawFailurePolicy::Restore);
        assert!(state.get_bids(&[1u8; 32]).is_empty());
    }
}
