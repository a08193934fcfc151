//! Genesis configuration for an auction instance.
//!
//! This module defines the parameters an auction is created with and their
//! validation.

use auction_types::{Address, AuctionTiming, ZERO_ADDRESS};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// What happens to a pending return when its payout transfer fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawFailurePolicy {
    /// The balance stays zeroed; the funds remain with the auction.
    #[default]
    Forfeit,
    /// The withdrawal is reverted and the balance restored.
    Restore,
}

/// Genesis configuration for the auction module.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionGenesisConfig {
    /// Account that receives the winning bid (hex in JSON)
    #[serde_as(as = "Hex")]
    pub beneficiary: Address,

    /// Timestamp the bidding window opens at
    #[serde(default)]
    pub start_time: u64,

    /// Length of the bidding window (seconds)
    pub bidding_time: u64,

    /// Length of the reveal window (seconds)
    pub reveal_time: u64,

    #[serde(default)]
    pub withdraw_failure_policy: WithdrawFailurePolicy,
}

impl Default for AuctionGenesisConfig {
    fn default() -> Self {
        Self {
            beneficiary: [0xbe; 32],
            start_time: 0,
            bidding_time: 3600, // 1 hour
            reveal_time: 1800,  // 30 minutes
            withdraw_failure_policy: WithdrawFailurePolicy::default(),
        }
    }
}

impl AuctionGenesisConfig {
    /// Validate the genesis configuration and derive the phase boundaries.
    pub fn validate(&self) -> Result<AuctionTiming, GenesisValidationError> {
        if self.beneficiary == ZERO_ADDRESS {
            return Err(GenesisValidationError::ZeroBeneficiary);
        }
        if self.bidding_time == 0 {
            return Err(GenesisValidationError::InvalidTiming(
                "Bidding time cannot be zero".into(),
            ));
        }
        if self.reveal_time == 0 {
            return Err(GenesisValidationError::InvalidTiming(
                "Reveal time cannot be zero".into(),
            ));
        }

        AuctionTiming::from_durations(self.start_time, self.bidding_time, self.reveal_time)
            .ok_or_else(|| GenesisValidationError::InvalidTiming("Reveal end overflows".into()))
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Invalid timing configuration: {0}")]
    InvalidTiming(String),

    #[error("Beneficiary cannot be the zero address")]
    ZeroBeneficiary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuctionGenesisConfig::default();
        let timing = config.validate().unwrap();
        assert_eq!(timing.bidding_end, 3600);
        assert_eq!(timing.reveal_end, 5400);
    }

    #[test]
    fn test_zero_durations_rejected() {
        let mut config = AuctionGenesisConfig::default();
        config.bidding_time = 0;
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidTiming(_))
        ));

        let mut config = AuctionGenesisConfig::default();
        config.reveal_time = 0;
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidTiming(_))
        ));
    }

    #[test]
    fn test_overflowing_timing_rejected() {
        let config = AuctionGenesisConfig {
            start_time: u64::MAX - 10,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidTiming(_))
        ));
    }

    #[test]
    fn test_zero_beneficiary_rejected() {
        let config = AuctionGenesisConfig {
            beneficiary: ZERO_ADDRESS,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(GenesisValidationError::ZeroBeneficiary)
        );
    }

    #[test]
    fn test_policy_from_json() {
        let json = format!(
            r#"{{"beneficiary": "{}", "bidding_time": 10, "reveal_time": 5, "withdraw_failure_policy": "restore"}}"#,
            "01".repeat(32)
        );
        let config: AuctionGenesisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.beneficiary, [1u8; 32]);
        assert_eq!(config.withdraw_failure_policy, WithdrawFailurePolicy::Restore);
        assert_eq!(config.start_time, 0);

        let defaults: AuctionGenesisConfig = serde_json::from_str(
            r#"{"beneficiary": "bebebebebebebebebebebebebebebebebebebebebebebebebebebebebebebebe", "bidding_time": 10, "reveal_time": 5}"#,
        )
        .unwrap();
        assert_eq!(defaults.withdraw_failure_policy, WithdrawFailurePolicy::Forfeit);
    }
}
