use std::time::Duration;

use serde::{Deserialize, Serialize};

use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};

use crate::compute_budget::DEFAULT_COMPUTE_UNIT_MARGIN;
use crate::errors::ConfigError;
use crate::oracle::PercentileSupport;
use crate::priority_fee::PriorityFeePolicy;

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    #[serde(rename = "timeout_ms", with = "duration_millis")]
    pub timeout: Duration,
    #[serde(rename = "poll_interval_ms", with = "duration_millis")]
    pub poll_interval: Duration,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Pipeline-wide settings. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub priority_fee: PriorityFeePolicy,
    pub compute_unit_margin: f64,
    pub percentile_support: PercentileSupport,
    pub blockhash_commitment: CommitmentLevel,
    pub confirmation: ConfirmationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            priority_fee: PriorityFeePolicy::default(),
            compute_unit_margin: DEFAULT_COMPUTE_UNIT_MARGIN,
            percentile_support: PercentileSupport::default(),
            blockhash_commitment: CommitmentLevel::Confirmed,
            confirmation: ConfirmationConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.compute_unit_margin.is_finite() || self.compute_unit_margin <= 1.0 {
            return Err(ConfigError::InvalidComputeUnitMargin(self.compute_unit_margin));
        }
        if self.confirmation.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.confirmation.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    pub fn blockhash_commitment(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.blockhash_commitment,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::priority_fee::Percentile;

    #[test]
    fn empty_object_yields_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();

        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.compute_unit_margin, 1.1);
        assert_eq!(config.confirmation.timeout, Duration::from_secs(90));
        assert_eq!(config.confirmation.poll_interval, Duration::from_secs(2));
        assert_eq!(config.blockhash_commitment(), CommitmentConfig::confirmed());
    }

    #[test]
    fn full_document_is_parsed() {
        let config = PipelineConfig::from_json(
            r#"{
                "priority_fee": { "type": "dynamic", "percentile": 95, "max_cap_micro_lamports": 2000000 },
                "compute_unit_margin": 1.25,
                "percentile_support": "cluster_node",
                "blockhash_commitment": "finalized",
                "confirmation": { "timeout_ms": 30000, "poll_interval_ms": 500 }
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.priority_fee,
            PriorityFeePolicy::Dynamic {
                percentile: Percentile::P95,
                max_cap_micro_lamports: Some(2_000_000),
            }
        );
        assert_eq!(config.percentile_support, PercentileSupport::ClusterNode);
        assert_eq!(config.blockhash_commitment, CommitmentLevel::Finalized);
        assert_eq!(config.confirmation.timeout, Duration::from_secs(30));
        assert_eq!(config.confirmation.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn margin_must_exceed_one() {
        for margin in ["1.0", "0.5"] {
            let error = PipelineConfig::from_json(&format!(r#"{{"compute_unit_margin": {margin}}}"#))
                .unwrap_err();
            assert!(matches!(error, ConfigError::InvalidComputeUnitMargin(_)));
        }
    }

    #[test]
    fn zero_durations_are_rejected() {
        let error = PipelineConfig::from_json(r#"{"confirmation": {"timeout_ms": 0}}"#).unwrap_err();
        assert!(matches!(error, ConfigError::ZeroTimeout));

        let error =
            PipelineConfig::from_json(r#"{"confirmation": {"poll_interval_ms": 0}}"#).unwrap_err();
        assert!(matches!(error, ConfigError::ZeroPollInterval));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let error = PipelineConfig::from_json(r#"{"priority_fee": 3}"#).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }
}
