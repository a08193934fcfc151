//! Highest-bid selection.

use auction_types::{Address, AuctionState};
use tracing::info;

use crate::error::AuctionError;
use crate::withdrawals::PendingWithdrawals;

/// Maintains the single leading bid.
///
/// Borrows the leader record and the withdrawal pool for the duration of one
/// reveal; it is the only writer of `highest_bid` / `highest_bidder`.
/// Every credit it grants is recorded so the reveal can be undone.
pub struct HighestBidTracker<'a> {
    leader: &'a mut AuctionState,
    pending: &'a mut PendingWithdrawals,
    credited: Vec<(Address, u64)>,
}

impl<'a> HighestBidTracker<'a> {
    pub fn new(leader: &'a mut AuctionState, pending: &'a mut PendingWithdrawals) -> Self {
        Self {
            leader,
            pending,
            credited: Vec::new(),
        }
    }

    /// Pending returns granted to displaced leaders, in order.
    pub fn into_credits(self) -> Vec<(Address, u64)> {
        self.credited
    }

    /// Offer `value` from `bidder` for the lead.
    ///
    /// Returns `Ok(false)` without touching state when `value` does not
    /// strictly exceed the current highest bid; ties keep the incumbent.
    /// On acceptance the previous leader's full bid is credited to its
    /// pending withdrawal balance.
    pub fn place_bid(&mut self, bidder: Address, value: u64) -> Result<bool, AuctionError> {
        if value <= self.leader.highest_bid {
            return Ok(false);
        }

        if let Some(previous) = self.leader.highest_bidder {
            self.pending.credit(previous, self.leader.highest_bid)?;
            self.credited.push((previous, self.leader.highest_bid));
        }

        info!(
            previous_bid = self.leader.highest_bid,
            new_bid = value,
            "Highest bid increased"
        );
        self.leader.highest_bid = value;
        self.leader.highest_bidder = Some(bidder);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_bid_takes_lead() {
        let mut leader = AuctionState::default();
        let mut pending = PendingWithdrawals::new();
        let mut tracker = HighestBidTracker::new(&mut leader, &mut pending);

        assert!(tracker.place_bid([1u8; 32], 10).unwrap());
        assert_eq!(leader.highest_bid, 10);
        assert_eq!(leader.highest_bidder, Some([1u8; 32]));
        assert_eq!(pending.total(), 0);
    }

    #[test]
    fn test_tie_favors_incumbent() {
        let mut leader = AuctionState::default();
        let mut pending = PendingWithdrawals::new();
        let mut tracker = HighestBidTracker::new(&mut leader, &mut pending);

        assert!(tracker.place_bid([1u8; 32], 10).unwrap());
        assert!(!tracker.place_bid([2u8; 32], 10).unwrap());
        assert!(!tracker.place_bid([2u8; 32], 9).unwrap());

        assert_eq!(leader.highest_bidder, Some([1u8; 32]));
        assert_eq!(pending.total(), 0);
    }

    #[test]
    fn test_zero_value_never_leads() {
        let mut leader = AuctionState::default();
        let mut pending = PendingWithdrawals::new();
        let mut tracker = HighestBidTracker::new(&mut leader, &mut pending);

        assert!(!tracker.place_bid([1u8; 32], 0).unwrap());
        assert_eq!(leader.highest_bidder, None);
    }

    #[test]
    fn test_outbid_leader_is_credited() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let mut leader = AuctionState::default();
        let mut pending = PendingWithdrawals::new();
        let mut tracker = HighestBidTracker::new(&mut leader, &mut pending);

        tracker.place_bid(a, 10).unwrap();
        tracker.place_bid(b, 20).unwrap();
        tracker.place_bid(a, 30).unwrap();
        assert_eq!(tracker.into_credits(), vec![(a, 10), (b, 20)]);

        assert_eq!(leader.highest_bidder, Some(a));
        assert_eq!(leader.highest_bid, 30);
        assert_eq!(pending.balance_of(&a), 10);
        assert_eq!(pending.balance_of(&b), 20);
    }

    #[test]
    fn test_self_outbid_credits_own_previous_bid() {
        let a = [1u8; 32];
        let mut leader = AuctionState::default();
        let mut pending = PendingWithdrawals::new();
        let mut tracker = HighestBidTracker::new(&mut leader, &mut pending);

        tracker.place_bid(a, 10).unwrap();
        tracker.place_bid(a, 15).unwrap();

        assert_eq!(leader.highest_bid, 15);
        assert_eq!(pending.balance_of(&a), 10);
    }
}
