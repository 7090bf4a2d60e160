use serde::{Deserialize, Serialize};
use tracing::debug;

use solana_sdk::instruction::Instruction;

use lander_client_api::base::getter::{GetClusterNodes, GetRecentPrioritizationFees};
use lander_client_api::errors::ClientResult;

use crate::oracle::{recommended_fee, writable_accounts, PercentileSupport};

pub const MICRO_LAMPORTS_PER_LAMPORT: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Percentile {
    P25,
    P50,
    P75,
    P95,
    P99,
}

impl Percentile {
    pub const ALL: [Percentile; 5] = [Self::P25, Self::P50, Self::P75, Self::P95, Self::P99];

    pub fn as_percent(self) -> u8 {
        match self {
            Self::P25 => 25,
            Self::P50 => 50,
            Self::P75 => 75,
            Self::P95 => 95,
            Self::P99 => 99,
        }
    }

    pub fn basis_points(self) -> u16 {
        u16::from(self.as_percent()) * 100
    }
}

impl TryFrom<u8> for Percentile {
    type Error = String;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_percent() == percent)
            .ok_or_else(|| format!("unsupported percentile {percent}, expected one of 25/50/75/95/99"))
    }
}

impl From<Percentile> for u8 {
    fn from(percentile: Percentile) -> Self {
        percentile.as_percent()
    }
}

/// How much the payer is willing to bid per compute unit.
///
/// Amounts are micro-lamports: `Exact` is the total priority budget for the
/// transaction, the `Dynamic` cap is the most the total may reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriorityFeePolicy {
    #[default]
    None,
    Exact {
        micro_lamports: u64,
    },
    Dynamic {
        percentile: Percentile,
        #[serde(default)]
        max_cap_micro_lamports: Option<u64>,
    },
}

impl PriorityFeePolicy {
    pub fn exact_lamports(lamports: u64) -> Self {
        Self::Exact {
            micro_lamports: lamports.saturating_mul(MICRO_LAMPORTS_PER_LAMPORT),
        }
    }

    pub fn dynamic(percentile: Percentile) -> Self {
        Self::Dynamic {
            percentile,
            max_cap_micro_lamports: None,
        }
    }

    pub fn dynamic_capped_lamports(percentile: Percentile, max_cap_lamports: u64) -> Self {
        Self::Dynamic {
            percentile,
            max_cap_micro_lamports: Some(max_cap_lamports.saturating_mul(MICRO_LAMPORTS_PER_LAMPORT)),
        }
    }
}

/// Spreads a total budget over `unit_limit` units, rounding down so the
/// payer never commits more than the budget.
pub fn unit_price_for_budget(budget_micro_lamports: u64, unit_limit: u32) -> u64 {
    match unit_limit {
        0 => 0,
        units => budget_micro_lamports / u64::from(units),
    }
}

pub fn cap_unit_price(sampled: u64, max_cap_micro_lamports: Option<u64>, unit_limit: u32) -> u64 {
    match max_cap_micro_lamports {
        Some(cap) => sampled.min(unit_price_for_budget(cap, unit_limit)),
        None => sampled,
    }
}

/// Resolves `policy` into a per-unit price for a message whose final unit
/// limit is `unit_limit`.
pub async fn resolve_unit_price<C>(
    client: &C,
    policy: &PriorityFeePolicy,
    percentile_support: PercentileSupport,
    instructions: &[Instruction],
    unit_limit: u32,
) -> ClientResult<u64>
where
    C: ?Sized + GetRecentPrioritizationFees + GetClusterNodes,
{
    let price = match *policy {
        PriorityFeePolicy::None => 0,
        PriorityFeePolicy::Exact { micro_lamports } => {
            unit_price_for_budget(micro_lamports, unit_limit)
        }
        PriorityFeePolicy::Dynamic {
            percentile,
            max_cap_micro_lamports,
        } => {
            let accounts = writable_accounts(instructions);
            let sampled =
                recommended_fee(client, percentile_support, &accounts, percentile).await?;
            let price = cap_unit_price(sampled, max_cap_micro_lamports, unit_limit);
            if price < sampled {
                debug!(sampled, capped = price, "dynamic priority fee clamped to cap");
            }
            price
        }
    };

    Ok(price)
}
