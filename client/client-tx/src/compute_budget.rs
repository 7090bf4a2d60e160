use thiserror::Error;
use tracing::{debug, warn};

use lander_client_api::base::executor::SimulateTransaction;
use lander_client_api::errors::{ClientError, CompileError, TransactionError};
use lander_client_api::execution::SimulationConfig;
use lander_client_sys::compute_budget::MAX_COMPUTE_UNIT_LIMIT;

use crate::message::MessageDraft;

pub const DEFAULT_COMPUTE_UNIT_MARGIN: f64 = 1.1;

const MARGIN_SCALE: u128 = 1_000_000;

#[derive(Debug, Error)]
enum EstimateError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("simulation failed: {0}")]
    Simulation(TransactionError),
    #[error("simulation reported no consumed units")]
    NoUnits,
}

/// Units `draft` consumes when simulated under the maximum limit.
///
/// Never fails: any error falls back to [`MAX_COMPUTE_UNIT_LIMIT`] so the
/// transaction still gets a chance to land.
pub async fn estimate_compute_units<C>(client: &C, draft: &MessageDraft) -> u32
where
    C: ?Sized + SimulateTransaction,
{
    match try_estimate(client, draft).await {
        Ok(units) => {
            debug!(units, "estimated compute units");
            units
        }
        Err(error) => {
            warn!(%error, fallback = MAX_COMPUTE_UNIT_LIMIT, "compute unit estimation failed");
            MAX_COMPUTE_UNIT_LIMIT
        }
    }
}

async fn try_estimate<C>(client: &C, draft: &MessageDraft) -> Result<u32, EstimateError>
where
    C: ?Sized + SimulateTransaction,
{
    let estimate_tx = draft
        .with_compute_budget(MAX_COMPUTE_UNIT_LIMIT, 0)
        .unsigned_transaction()?;
    let output = client
        .simulate_transaction(&estimate_tx, SimulationConfig::estimate())
        .await?;

    if let Err(err) = output.result {
        debug!(logs = ?output.logs, "estimation simulation failed");
        return Err(EstimateError::Simulation(err));
    }

    let units = output
        .units_consumed
        .filter(|units| *units > 0)
        .ok_or(EstimateError::NoUnits)?;
    Ok(u32::try_from(units).map_or(MAX_COMPUTE_UNIT_LIMIT, |units| {
        units.min(MAX_COMPUTE_UNIT_LIMIT)
    }))
}

/// `units` scaled by `margin`, rounded up and clamped to the runtime maximum.
///
/// The margin is fixed to six decimals first so that 1.1 × 200_000 is
/// 220_000 and not 220_001.
pub fn apply_margin(units: u32, margin: f64) -> u32 {
    if !margin.is_finite() || margin <= 0.0 {
        return units.min(MAX_COMPUTE_UNIT_LIMIT);
    }

    let scaled_margin = (margin * MARGIN_SCALE as f64).round() as u128;
    let scaled = (u128::from(units) * scaled_margin).div_ceil(MARGIN_SCALE);

    u32::try_from(scaled).map_or(MAX_COMPUTE_UNIT_LIMIT, |units| {
        units.min(MAX_COMPUTE_UNIT_LIMIT)
    })
}
