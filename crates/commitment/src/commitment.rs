//! Commitment computation and verification.

use auction_types::{Commitment, Secret};
use sha2::{Digest, Sha256};

use crate::error::CommitmentError;

const DOMAIN_TAG: &[u8] = b"BLIND_AUCTION_BID_V1:";

/// Compute the commitment for a bid opening.
pub fn compute_commitment(value: u64, fake: bool, secret: &Secret) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);
    hasher.update(value.to_be_bytes());
    hasher.update([u8::from(fake)]);
    hasher.update(secret.0);
    Commitment(hasher.finalize().into())
}

/// Check that `commitment` opens to `(value, fake, secret)`.
///
/// A consumed commitment never verifies.
pub fn verify_commitment(commitment: &Commitment, value: u64, fake: bool, secret: &Secret) -> bool {
    !commitment.is_consumed() && compute_commitment(value, fake, secret) == *commitment
}

/// Decode a hex commitment, with or without a `0x` prefix.
pub fn parse_commitment(s: &str) -> Result<Commitment, CommitmentError> {
    decode_32(s).map(Commitment)
}

/// Decode a hex secret, with or without a `0x` prefix.
pub fn parse_secret(s: &str) -> Result<Secret, CommitmentError> {
    decode_32(s).map(Secret)
}

fn decode_32(s: &str) -> Result<[u8; 32], CommitmentError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| CommitmentError::InvalidHex(e.to_string()))?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CommitmentError::InvalidLength { expected: 32, got })
}
