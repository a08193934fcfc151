//! Local record of a bidder's prepared bids.
//!
//! Reveal is positional: the module matches the n-th reveal entry against the
//! n-th bid it stored for the sender. The book keeps bids in the order they
//! were accepted on chain and produces reveal entries in that same order.
//!
//! A bid's secret is written to disk before the bid is posted: it is staged
//! as pending, then confirmed or discarded once the chain has answered. A
//! book left with a pending bid is settled with [`BidBook::reconcile`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use auction_types::{Address, Commitment, RevealEntry};

use crate::bid::PreparedBid;

/// Errors reading or writing a bid book.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed bid book: {0}")]
    Json(#[from] serde_json::Error),

    #[error("A staged bid has not been confirmed or discarded")]
    Unsettled,
}

/// How [`BidBook::reconcile`] settled a pending bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Nothing was pending
    Clean,
    /// The chain holds the pending bid; it is now recorded
    Confirmed,
    /// The chain never accepted the pending bid; it was dropped
    Discarded,
}

/// A bidder's prepared bids, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidBook {
    /// Hex-encoded bidder address
    pub bidder: String,
    pub bids: Vec<PreparedBid>,
    /// Bid written before posting and not yet seen on chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PreparedBid>,
}

impl BidBook {
    pub fn new(bidder: &Address) -> Self {
        Self {
            bidder: hex::encode(bidder),
            bids: Vec::new(),
            pending: None,
        }
    }

    /// Record a bid the chain accepted.
    pub fn push(&mut self, bid: PreparedBid) {
        self.bids.push(bid);
    }

    /// Persist `bid` as pending. Call before posting it.
    pub fn stage(&mut self, bid: PreparedBid, path: &Path) -> Result<(), BookError> {
        if self.pending.is_some() {
            return Err(BookError::Unsettled);
        }
        self.pending = Some(bid);
        self.save(path)
    }

    /// Record the pending bid as accepted.
    pub fn confirm(&mut self, path: &Path) -> Result<(), BookError> {
        if let Some(bid) = self.pending.take() {
            self.bids.push(bid);
        }
        self.save(path)
    }

    /// Drop the pending bid after the chain refused it.
    pub fn discard(&mut self, path: &Path) -> Result<(), BookError> {
        self.pending = None;
        self.save(path)
    }

    /// Settle a pending bid against the commitments the chain holds for
    /// this bidder, in posting order.
    pub fn reconcile(&mut self, on_chain: &[Commitment]) -> Reconciled {
        let Some(pending) = self.pending.take() else {
            return Reconciled::Clean;
        };
        if on_chain.get(self.bids.len()) == Some(&pending.commitment) {
            self.bids.push(pending);
            Reconciled::Confirmed
        } else {
            Reconciled::Discarded
        }
    }

    /// Reveal entries in submission order.
    pub fn reveal_entries(&self) -> Vec<RevealEntry> {
        self.bids.iter().map(|bid| bid.entry.clone()).collect()
    }

    /// Total escrowed across all bids.
    pub fn total_deposit(&self) -> u64 {
        self.bids
            .iter()
            .fold(0u64, |acc, bid| acc.saturating_add(bid.deposit))
    }

    /// Default book location for a bidder inside `data_dir`.
    pub fn path_for(data_dir: &Path, bidder: &Address) -> PathBuf {
        data_dir.join(format!("bids-{}.json", hex::encode(bidder)))
    }

    /// Load a book, or start an empty one when the file does not exist.
    pub fn load_or_new(path: &Path, bidder: &Address) -> Result<Self, BookError> {
        match std::fs::read_to_string(path) {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new(bidder)),
            Err(source) => Err(BookError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), BookError> {
        let io_err = |source| BookError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bid::prepare_bid;
    use rand::rngs::OsRng;

    #[test]
    fn test_reveal_entries_keep_order() {
        let mut book = BidBook::new(&[1u8; 32]);
        let first = prepare_bid(10, false, 10, &mut OsRng).unwrap();
        let second = prepare_bid(99, true, 3, &mut OsRng).unwrap();
        book.push(first.clone());
        book.push(second.clone());

        assert_eq!(book.reveal_entries(), vec![first.entry, second.entry]);
        assert_eq!(book.total_deposit(), 13);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("bid-book-test-{}", std::process::id()));
        let bidder = [2u8; 32];
        let path = BidBook::path_for(&dir, &bidder);

        let missing = BidBook::load_or_new(&path, &bidder).unwrap();
        assert!(missing.bids.is_empty());
        assert_eq!(missing.bidder, hex::encode(bidder));

        let mut book = BidBook::new(&bidder);
        book.push(prepare_bid(5, false, 8, &mut OsRng).unwrap());
        book.save(&path).unwrap();

        let loaded = BidBook::load_or_new(&path, &bidder).unwrap();
        assert_eq!(loaded, book);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_staged_bid_is_on_disk_before_posting() {
        let dir = std::env::temp_dir().join(format!("bid-book-stage-{}", std::process::id()));
        let bidder = [3u8; 32];
        let path = BidBook::path_for(&dir, &bidder);
        let prepared = prepare_bid(40, false, 40, &mut OsRng).unwrap();

        let mut book = BidBook::new(&bidder);
        book.stage(prepared.clone(), &path).unwrap();
        assert!(matches!(
            book.stage(prepared.clone(), &path),
            Err(BookError::Unsettled)
        ));

        // a process that dies after posting still finds the secret
        let reloaded = BidBook::load_or_new(&path, &bidder).unwrap();
        assert_eq!(reloaded.pending.as_ref(), Some(&prepared));
        assert!(reloaded.bids.is_empty());

        book.confirm(&path).unwrap();
        let reloaded = BidBook::load_or_new(&path, &bidder).unwrap();
        assert_eq!(reloaded.pending, None);
        assert_eq!(reloaded.reveal_entries(), vec![prepared.entry]);

        let refused = prepare_bid(7, true, 1, &mut OsRng).unwrap();
        book.stage(refused, &path).unwrap();
        book.discard(&path).unwrap();
        let reloaded = BidBook::load_or_new(&path, &bidder).unwrap();
        assert_eq!(reloaded, book);
        assert_eq!(reloaded.bids.len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_reconcile_pending_bid() {
        let mut book = BidBook::new(&[4u8; 32]);
        let first = prepare_bid(10, false, 10, &mut OsRng).unwrap();
        let second = prepare_bid(20, false, 20, &mut OsRng).unwrap();
        book.push(first.clone());
        assert_eq!(book.reconcile(&[first.commitment]), Reconciled::Clean);

        book.pending = Some(second.clone());
        assert_eq!(book.reconcile(&[first.commitment]), Reconciled::Discarded);
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.pending, None);

        book.pending = Some(second.clone());
        let on_chain = [first.commitment, second.commitment];
        assert_eq!(book.reconcile(&on_chain), Reconciled::Confirmed);
        assert_eq!(book.bids, vec![first, second]);
    }
}
