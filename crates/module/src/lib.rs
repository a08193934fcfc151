//! Blind auction module: commit-reveal settlement for one auction instance.
//!
//! This module implements the state logic of a sealed-bid auction:
//!
//! - Blinded bid submission with escrowed deposits
//! - Positional reveal with commitment verification and immediate refunds
//! - Monotone highest-bid tracking
//! - Pull-based withdrawal of outbid amounts
//! - One-shot payout to the beneficiary
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Module state structures
//! - `ledger`, `tracker`, `withdrawals`: Deposit ledger, highest-bid
//!   tracker and pending-withdrawal pool
//! - `phase`: Time-driven phase gating
//! - `transfer`: The host's value-transfer capability
//! - `genesis`: Initial configuration
//! - `invariants`: Solvency and consistency checks
//! - `error`: Error types
//!
//! The host must serialize calls; the only interleaving the module expects is
//! a re-entrant call from inside [`ValueTransfer::pay`].
//!
//! # Example
//!
//! ```ignore
//! use auction_module::{handlers, AuctionGenesisConfig, AuctionState, CallContext, MockTransfer};
//!
//! let mut state = AuctionState::from_genesis(&AuctionGenesisConfig::default())?;
//! let mut transfer = MockTransfer::new();
//!
//! // Post a blinded bid with 25 attached
//! handlers::handle_bid(&mut state, &CallContext { value: 25, .. }, commitment)?;
//!
//! // After bidding ends, open it
//! handlers::handle_reveal(&mut state, &ctx, &mut transfer, &[entry])?;
//! ```

pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod invariants;
pub mod ledger;
pub mod phase;
pub mod queries;
pub mod state;
pub mod tracker;
pub mod transfer;
pub mod withdrawals;

pub use call::{AuctionCall, CallOutcome};
pub use error::AuctionError;
pub use genesis::{AuctionGenesisConfig, GenesisValidationError, WithdrawFailurePolicy};
pub use handlers::{CallContext, HandlerResult};
pub use ledger::{DepositLedger, RevealOutcome};
pub use queries::{handle_query, AuctionQuery, AuctionQueryResponse, AuctionSummary};
pub use state::{AuctionState, PayoutFrame};
pub use tracker::HighestBidTracker;
pub use transfer::{MockTransfer, TransferError, ValueTransfer};
pub use withdrawals::PendingWithdrawals;
