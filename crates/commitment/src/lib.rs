//! Commitment scheme for blinded bids.
//!
//! A bidder binds itself to `(value, fake, secret)` by publishing
//! `H(value, fake, secret)` during bidding and opening it during reveal.
//! Client and auction module must agree byte-for-byte on the encoding, so
//! both go through this crate.
//!
//! # Encoding
//!
//! ```text
//! SHA-256( "BLIND_AUCTION_BID_V1:" || value (u64, big-endian) || fake (0x00/0x01) || secret (32 bytes) )
//! ```

pub mod commitment;
pub mod error;

pub use commitment::{compute_commitment, parse_commitment, parse_secret, verify_commitment};
pub use error::CommitmentError;
