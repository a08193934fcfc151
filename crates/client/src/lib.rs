//! Client SDK for bidding in blind auctions.
//!
//! This crate provides a high-level API for:
//! - Creating blinded bids and decoys with fresh secrets
//! - Keeping a local bid book in posting order
//! - Producing the positional reveal list for the reveal phase

pub mod bid;
pub mod book;

pub use bid::{generate_secret, prepare_bid, BidBuilder, BidError, PreparedBid};
pub use book::{BidBook, BookError, Reconciled};
