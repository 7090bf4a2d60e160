//! Recent prioritization fee sampling.
//!
//! Endpoints that accept a percentile answer with per-slot fees already
//! reduced to that percentile, so only the median of the recent window is
//! taken. Plain endpoints return raw per-slot minimums and the requested
//! percentile is computed locally.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use solana_rpc_client_api::response::RpcPrioritizationFee;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

use lander_client_api::base::getter::{GetClusterNodes, GetRecentPrioritizationFees};
use lander_client_api::errors::{ClientResult, RpcClientSpecificError};

use crate::priority_fee::Percentile;

/// Most slots a node reports for `getRecentPrioritizationFees`.
pub const RECENT_SLOT_LIMIT: usize = 150;
/// Newest slots that feed the estimate.
pub const SAMPLE_WINDOW: usize = 50;

/// Where percentile-filtered fee queries can be served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentileSupport {
    #[default]
    Unsupported,
    /// The configured endpoint accepts the percentile parameter.
    Endpoint,
    /// The query goes to the RPC address of the first advertised cluster node.
    ClusterNode,
}

/// Writable accounts referenced by `instructions`, first occurrence wins.
pub fn writable_accounts(instructions: &[Instruction]) -> Vec<Pubkey> {
    let mut accounts: Vec<Pubkey> = Vec::new();
    for meta in instructions.iter().flat_map(|ix| &ix.accounts) {
        if meta.is_writable && !accounts.contains(&meta.pubkey) {
            accounts.push(meta.pubkey);
        }
    }
    accounts
}

/// Fees of the newest [`SAMPLE_WINDOW`] slots out of the newest
/// [`RECENT_SLOT_LIMIT`], oldest first.
pub fn recent_window(fees: &[RpcPrioritizationFee]) -> Vec<u64> {
    let mut by_slot: Vec<&RpcPrioritizationFee> = fees.iter().collect();
    by_slot.sort_by_key(|fee| fee.slot);

    let recent = &by_slot[by_slot.len().saturating_sub(RECENT_SLOT_LIMIT)..];
    recent[recent.len().saturating_sub(SAMPLE_WINDOW)..]
        .iter()
        .map(|fee| fee.prioritization_fee)
        .collect()
}

/// Percentile over the non-zero fees of the recent window: the sorted sample
/// at index `floor(len * p / 100)`, clamped to the last one. Zero when no slot
/// in the window paid a fee.
pub fn sample_percentile(fees: &[RpcPrioritizationFee], percentile: Percentile) -> u64 {
    let mut samples: Vec<u64> = recent_window(fees)
        .into_iter()
        .filter(|fee| *fee > 0)
        .collect();
    if samples.is_empty() {
        return 0;
    }
    samples.sort_unstable();

    let index = samples.len() * usize::from(percentile.as_percent()) / 100;
    samples[index.min(samples.len() - 1)]
}

pub fn sample_median(fees: &[RpcPrioritizationFee]) -> u64 {
    sample_percentile(fees, Percentile::P50)
}

/// Recommended per-unit price in micro-lamports for a message locking
/// `accounts`.
pub async fn recommended_fee<C>(
    client: &C,
    support: PercentileSupport,
    accounts: &[Pubkey],
    percentile: Percentile,
) -> ClientResult<u64>
where
    C: ?Sized + GetRecentPrioritizationFees + GetClusterNodes,
{
    let fee = match support {
        PercentileSupport::Unsupported => {
            let fees = client.get_recent_prioritization_fees(accounts).await?;
            sample_percentile(&fees, percentile)
        }
        PercentileSupport::Endpoint => {
            let fees = client
                .get_recent_prioritization_fees_with_percentile(accounts, percentile.basis_points())
                .await?;
            sample_median(&fees)
        }
        PercentileSupport::ClusterNode => {
            let url = cluster_node_rpc_url(client).await?;
            let fees = fetch_percentile_fees(&reqwest::Client::new(), &url, accounts, percentile)
                .await?;
            sample_median(&fees)
        }
    };

    debug!(
        ?support,
        percentile = percentile.as_percent(),
        accounts = accounts.len(),
        fee,
        "sampled recent prioritization fee"
    );
    Ok(fee)
}

/// One-time check whether the endpoint serves percentile-filtered fees.
pub async fn probe_percentile_support<C>(client: &C) -> PercentileSupport
where
    C: ?Sized + GetRecentPrioritizationFees,
{
    match client
        .get_recent_prioritization_fees_with_percentile(&[], Percentile::P50.basis_points())
        .await
    {
        Ok(_) => PercentileSupport::Endpoint,
        Err(error) => {
            debug!(%error, "endpoint does not serve percentile fees");
            PercentileSupport::Unsupported
        }
    }
}

pub async fn cluster_node_rpc_url<C>(client: &C) -> ClientResult<String>
where
    C: ?Sized + GetClusterNodes,
{
    let nodes = client.get_cluster_nodes().await?;
    nodes
        .iter()
        .find_map(|node| node.rpc)
        .map(|addr| format!("http://{addr}"))
        .ok_or_else(|| {
            warn!(nodes = nodes.len(), "no cluster node advertises an rpc address");
            RpcClientSpecificError::Custom("no cluster node advertises an rpc address".to_string())
                .into()
        })
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Percentile-filtered `getRecentPrioritizationFees` against an arbitrary
/// JSON-RPC url.
pub async fn fetch_percentile_fees(
    http: &reqwest::Client,
    url: &str,
    accounts: &[Pubkey],
    percentile: Percentile,
) -> ClientResult<Vec<RpcPrioritizationFee>> {
    let accounts: Vec<String> = accounts.iter().map(Pubkey::to_string).collect();
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getRecentPrioritizationFees",
        "params": [{
            "lockedWritableAccounts": accounts,
            "percentile": percentile.basis_points(),
        }],
    });

    let response: JsonRpcResponse<Vec<RpcPrioritizationFee>> = http
        .post(url)
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    match (response.result, response.error) {
        (_, Some(error)) => Err(RpcClientSpecificError::Custom(format!(
            "getRecentPrioritizationFees failed with {}: {}",
            error.code, error.message
        ))
        .into()),
        (Some(fees), None) => Ok(fees),
        (None, None) => Ok(Vec::new()),
    }
}
