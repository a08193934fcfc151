//! Call handlers for the auction module.
//!
//! These functions implement the business logic for each call type. Every
//! handler validates first, applies all of its state changes, and only then
//! pays out through the host's [`ValueTransfer`]. A handler that fails after
//! applying changes undoes exactly those changes. Calls the host runs nested
//! inside the payout are committed on their own and are never undone.
//!
//! While a reveal refund or the beneficiary payout is in flight the leader
//! record is locked: nested reveals and auction ends are refused, and
//! pending returns granted by the in-flight reveal cannot be withdrawn.

use auction_types::{
    Address, AuctionEvent, AuctionResult, AuctionState as LeaderState, Commitment, Phase,
    RevealEntry,
};
use tracing::{debug, info, warn};

use crate::call::{AuctionCall, CallOutcome};
use crate::error::AuctionError;
use crate::genesis::WithdrawFailurePolicy;
use crate::ledger::RevealOutcome;
use crate::phase::{require_endable, require_phase};
use crate::state::{AuctionState as ModuleState, PayoutFrame};
use crate::tracker::HighestBidTracker;
use crate::transfer::ValueTransfer;

/// Context provided by the runtime for each call.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
    /// Current timestamp
    pub timestamp: u64,
    /// Value attached to the call (for deposits)
    pub value: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Handle Bid call.
///
/// Appends a blinded bid for the sender with the attached value as deposit.
/// Returns the bid's position in the sender's sequence.
pub fn handle_bid(
    state: &mut ModuleState,
    ctx: &CallContext,
    commitment: Commitment,
) -> HandlerResult<usize> {
    require_phase(state, ctx.timestamp, Phase::Bidding)?;

    if !state.add_escrow(ctx.value) {
        return Err(AuctionError::ArithmeticOverflow);
    }
    let index = state.ledger.post_bid(ctx.sender, commitment, ctx.value);

    debug!(
        bidder = %hex::encode(ctx.sender),
        index,
        deposit = ctx.value,
        block = ctx.block_height,
        "Blinded bid posted"
    );
    Ok(index)
}

/// Handle Reveal call.
///
/// Opens every stored bid of the sender with the positional `entries` and
/// pays the resulting refund. A failed refund transfer undoes the reveal.
pub fn handle_reveal(
    state: &mut ModuleState,
    ctx: &CallContext,
    transfer: &mut dyn ValueTransfer,
    entries: &[RevealEntry],
) -> HandlerResult<RevealOutcome> {
    require_phase(state, ctx.timestamp, Phase::Revealing)?;
    if state.leader_locked() {
        return Err(AuctionError::PayoutInProgress);
    }

    let mut undo = RevealUndo {
        consumed: Vec::new(),
        credits: Vec::new(),
        leader: state.leader.clone(),
        events_len: state.events.len(),
    };
    let outcome = match apply_reveal(state, ctx.sender, entries, &mut undo) {
        Ok(outcome) => outcome,
        Err(err) => {
            undo_reveal(state, ctx.sender, undo);
            return Err(err);
        }
    };

    let frame = PayoutFrame::Reveal {
        credits: undo.credits.clone(),
    };
    if let Err(err) = pay_out(state, transfer, frame, ctx.sender, outcome.refund) {
        undo_reveal(state, ctx.sender, undo);
        return Err(err);
    }

    info!(
        bidder = %hex::encode(ctx.sender),
        refund = outcome.refund,
        revealed = outcome.revealed,
        forfeited = outcome.forfeited,
        block = ctx.block_height,
        "Bids revealed"
    );
    Ok(outcome)
}

/// Handle Withdraw call.
///
/// The pending balance is removed before the transfer, so a re-entrant
/// withdraw during the transfer finds nothing to pay. What happens when the
/// transfer fails depends on the configured [`WithdrawFailurePolicy`].
pub fn handle_withdraw(
    state: &mut ModuleState,
    ctx: &CallContext,
    transfer: &mut dyn ValueTransfer,
) -> HandlerResult<u64> {
    let reserved = state.unsettled_credit(&ctx.sender);
    let amount = state.pending.take_above(&ctx.sender, reserved);
    if amount == 0 {
        return Ok(0);
    }

    match pay_out(state, transfer, PayoutFrame::Withdraw, ctx.sender, amount) {
        Ok(()) => {
            info!(
                bidder = %hex::encode(ctx.sender),
                amount,
                block = ctx.block_height,
                "Pending return withdrawn"
            );
            Ok(amount)
        }
        Err(AuctionError::TransferFailed { .. })
            if state.withdraw_failure_policy == WithdrawFailurePolicy::Forfeit =>
        {
            warn!(
                bidder = %hex::encode(ctx.sender),
                amount,
                block = ctx.block_height,
                "Withdrawal transfer failed, pending return forfeited"
            );
            Ok(0)
        }
        Err(err) => {
            // added on top of anything nested calls credited meanwhile
            state.pending.credit(ctx.sender, amount)?;
            Err(err)
        }
    }
}

/// Handle AuctionEnd call.
///
/// Marks the auction ended, records the result and the completion event, then
/// pays the highest bid to the beneficiary. A failed payout undoes the call.
pub fn handle_auction_end(
    state: &mut ModuleState,
    ctx: &CallContext,
    transfer: &mut dyn ValueTransfer,
) -> HandlerResult<AuctionResult> {
    require_endable(state, ctx.timestamp)?;
    if state.leader_locked() {
        return Err(AuctionError::PayoutInProgress);
    }

    let result = AuctionResult {
        winner: state.leader.highest_bidder,
        winning_bid: state.leader.highest_bid,
        beneficiary: state.beneficiary,
        ended_at: ctx.timestamp,
    };

    let events_len = state.events.len();
    state.leader.ended = true;
    state.result = Some(result.clone());
    state.events.push(AuctionEvent::AuctionEnded {
        winner: result.winner,
        amount: result.winning_bid,
    });

    let paid = pay_out(
        state,
        transfer,
        PayoutFrame::AuctionEnd,
        result.beneficiary,
        result.winning_bid,
    );
    if let Err(err) = paid {
        state.leader.ended = false;
        state.result = None;
        state.events.truncate(events_len);
        return Err(err);
    }

    info!(
        winner = ?result.winner.map(hex::encode),
        amount = result.winning_bid,
        block = ctx.block_height,
        "Auction ended"
    );
    Ok(result)
}

/// Route a call message to its handler.
pub fn dispatch(
    state: &mut ModuleState,
    ctx: &CallContext,
    transfer: &mut dyn ValueTransfer,
    call: AuctionCall,
) -> HandlerResult<CallOutcome> {
    match call {
        AuctionCall::Bid { commitment } => {
            let index = handle_bid(state, ctx, commitment)?;
            Ok(CallOutcome::BidPlaced {
                index: index as u64,
            })
        }
        AuctionCall::Reveal { entries } => {
            handle_reveal(state, ctx, transfer, &entries).map(CallOutcome::Revealed)
        }
        AuctionCall::Withdraw => {
            handle_withdraw(state, ctx, transfer).map(|amount| CallOutcome::Withdrawn { amount })
        }
        AuctionCall::AuctionEnd => handle_auction_end(state, ctx, transfer).map(CallOutcome::Ended),
    }
}

/// What one reveal changed, so a failed reveal can put it back.
struct RevealUndo {
    consumed: Vec<(usize, Commitment)>,
    credits: Vec<(Address, u64)>,
    leader: LeaderState,
    events_len: usize,
}

/// Consume the sender's bids and update the leader. No payment happens here.
fn apply_reveal(
    state: &mut ModuleState,
    bidder: Address,
    entries: &[RevealEntry],
    undo: &mut RevealUndo,
) -> HandlerResult<RevealOutcome> {
    let ModuleState {
        ledger,
        leader,
        pending,
        events,
        ..
    } = state;

    let mut tracker = HighestBidTracker::new(leader, pending);
    let result = ledger.reveal_all(bidder, entries, &mut tracker, &mut undo.consumed);
    undo.credits = tracker.into_credits();
    let outcome = result?;

    if let Some(amount) = outcome.leading_value {
        events.push(AuctionEvent::HighestBidIncreased { bidder, amount });
    }
    Ok(outcome)
}

/// Roll back one reveal's own effects.
///
/// Nested calls could not have moved the leader or withdrawn `undo.credits`
/// while the refund was in flight, so each step puts back exactly what the
/// reveal changed.
fn undo_reveal(state: &mut ModuleState, bidder: Address, undo: RevealUndo) {
    state.ledger.restore(&bidder, &undo.consumed);
    for (credited, amount) in &undo.credits {
        state.pending.revoke(credited, *amount);
    }
    state.leader = undo.leader;
    state.events.truncate(undo.events_len);
}

/// Debit escrow and hand `amount` to the host transfer.
///
/// `frame` is on the payout stack for as long as the host runs. A failed
/// transfer gives the escrow back before returning.
fn pay_out(
    state: &mut ModuleState,
    transfer: &mut dyn ValueTransfer,
    frame: PayoutFrame,
    recipient: Address,
    amount: u64,
) -> HandlerResult<()> {
    if amount == 0 {
        return Ok(());
    }
    if !state.subtract_escrow(amount) {
        return Err(AuctionError::InsufficientEscrow {
            held: state.escrow_balance,
            amount,
        });
    }

    state.payouts_in_flight.push(frame);
    let paid = transfer.pay(state, recipient, amount);
    state.payouts_in_flight.pop();

    paid.map_err(|e| {
        state.restore_escrow(amount);
        warn!(recipient = %hex::encode(recipient), amount, error = %e, "Transfer failed");
        AuctionError::TransferFailed {
            recipient,
            amount,
            reason: e.to_string(),
        }
    })
}
