//! Bid creation and blinding.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use auction_commitment::compute_commitment;
use auction_types::{Commitment, RevealEntry, Secret};

/// Errors that can occur during bid creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidError {
    /// A real bid whose deposit cannot cover its value would be refunded
    /// on reveal but could never win.
    #[error("Deposit {deposit} does not cover bid value {value}")]
    InsufficientDeposit { value: u64, deposit: u64 },
}

/// A prepared bid ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedBid {
    /// Blinded bid, published with the deposit
    pub commitment: Commitment,
    /// Opening to submit during reveal (keep secret until then)
    pub entry: RevealEntry,
    /// Value to attach to the bid transaction
    pub deposit: u64,
}

/// Draw a fresh blinding secret.
pub fn generate_secret<R: RngCore + CryptoRng>(rng: &mut R) -> Secret {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    Secret(bytes)
}

/// Create a blinded bid.
///
/// # Arguments
/// * `value` - The real bid amount (ignored for decoys)
/// * `fake` - Whether this is a decoy that never competes
/// * `deposit` - Amount escrowed with the commitment
/// * `rng` - Cryptographically secure random number generator
pub fn prepare_bid<R: RngCore + CryptoRng>(
    value: u64,
    fake: bool,
    deposit: u64,
    rng: &mut R,
) -> Result<PreparedBid, BidError> {
    if !fake && deposit < value {
        return Err(BidError::InsufficientDeposit { value, deposit });
    }

    let secret = generate_secret(rng);
    Ok(PreparedBid {
        commitment: compute_commitment(value, fake, &secret),
        entry: RevealEntry {
            value,
            fake,
            secret,
        },
        deposit,
    })
}

/// Builder for creating bids with additional options.
#[derive(Debug, Clone, Default)]
pub struct BidBuilder {
    value: u64,
    fake: bool,
    deposit: Option<u64>,
}

impl BidBuilder {
    /// Create a new bid builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bid value.
    pub fn value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }

    /// Mark the bid as a decoy.
    pub fn fake(mut self, fake: bool) -> Self {
        self.fake = fake;
        self
    }

    /// Set the deposit. Defaults to the bid value.
    pub fn deposit(mut self, deposit: u64) -> Self {
        self.deposit = Some(deposit);
        self
    }

    /// Build the prepared bid.
    pub fn build<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<PreparedBid, BidError> {
        let deposit = self.deposit.unwrap_or(self.value);
        prepare_bid(self.value, self.fake, deposit, rng)
    }
}
