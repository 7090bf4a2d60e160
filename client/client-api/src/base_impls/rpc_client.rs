use async_trait::async_trait;

use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_rpc_client_api::request::RpcRequest;
use solana_rpc_client_api::response::{
    RpcContactInfo, RpcPrioritizationFee, RpcSimulateTransactionResult,
};
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status::{TransactionStatus, UiTransactionEncoding};

use crate::base::executor::{GetSignatureStatuses, SendTransaction, SimulateTransaction};
use crate::base::getter::{
    GetClusterNodes, GetLatestBlockhash, GetMultipleAccounts, GetRecentPrioritizationFees,
};
use crate::client::Client;
use crate::errors::{ClientResult, RpcClientSpecificError};
use crate::execution::{SimulationConfig, SimulationOutput};

impl Client for RpcClient {}

#[async_trait]
impl GetMultipleAccounts for RpcClient {
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> ClientResult<Vec<Option<Account>>> {
        let accounts = self
            .get_multiple_accounts_with_commitment(pubkeys, self.commitment())
            .await?
            .value;
        if accounts.len() != pubkeys.len() {
            return Err(RpcClientSpecificError::Custom(format!(
                "requested {} accounts, received {}",
                pubkeys.len(),
                accounts.len()
            ))
            .into());
        }
        Ok(accounts)
    }
}

#[async_trait]
impl GetLatestBlockhash for RpcClient {
    async fn get_latest_blockhash(&self, commitment: CommitmentConfig) -> ClientResult<Hash> {
        let (blockhash, _) = self.get_latest_blockhash_with_commitment(commitment).await?;
        Ok(blockhash)
    }
}

#[async_trait]
impl GetRecentPrioritizationFees for RpcClient {
    async fn get_recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        Ok(RpcClient::get_recent_prioritization_fees(self, accounts).await?)
    }

    async fn get_recent_prioritization_fees_with_percentile(
        &self,
        accounts: &[Pubkey],
        percentile: u16,
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        let locked_writable_accounts: Vec<String> =
            accounts.iter().map(ToString::to_string).collect();
        let fees = self
            .send::<Vec<RpcPrioritizationFee>>(
                RpcRequest::GetRecentPrioritizationFees,
                serde_json::json!([{
                    "lockedWritableAccounts": locked_writable_accounts,
                    "percentile": percentile,
                }]),
            )
            .await?;
        Ok(fees)
    }
}

#[async_trait]
impl GetClusterNodes for RpcClient {
    async fn get_cluster_nodes(&self) -> ClientResult<Vec<RpcContactInfo>> {
        Ok(RpcClient::get_cluster_nodes(self).await?)
    }
}

#[async_trait]
impl SimulateTransaction for RpcClient {
    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SimulationConfig,
    ) -> ClientResult<SimulationOutput> {
        let result = self
            .simulate_transaction_with_config(
                transaction,
                RpcSimulateTransactionConfig {
                    sig_verify: config.sig_verify,
                    replace_recent_blockhash: config.replace_recent_blockhash,
                    commitment: Some(config.commitment),
                    encoding: Some(UiTransactionEncoding::Base64),
                    accounts: None,
                    min_context_slot: None,
                    inner_instructions: false,
                },
            )
            .await?
            .value;

        Ok(convert_simulated(result))
    }
}

#[async_trait]
impl SendTransaction for RpcClient {
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> ClientResult<Signature> {
        let signature = self
            .send_transaction_with_config(
                transaction,
                RpcSendTransactionConfig {
                    skip_preflight: true,
                    preflight_commitment: None,
                    encoding: Some(UiTransactionEncoding::Base64),
                    max_retries: Some(0),
                    min_context_slot: None,
                },
            )
            .await?;
        Ok(signature)
    }
}

#[async_trait]
impl GetSignatureStatuses for RpcClient {
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> ClientResult<Option<TransactionStatus>> {
        let statuses = self.get_signature_statuses(&[*signature]).await?.value;
        Ok(statuses.into_iter().next().flatten())
    }
}

fn convert_simulated(result: RpcSimulateTransactionResult) -> SimulationOutput {
    let RpcSimulateTransactionResult {
        err,
        logs,
        units_consumed,
        ..
    } = result;

    let result = match err {
        None => Ok(()),
        Some(err) => Err(err),
    };

    SimulationOutput {
        result,
        logs: logs.unwrap_or_default(),
        units_consumed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use solana_sdk::instruction::InstructionError;
    use solana_sdk::transaction::TransactionError;

    #[test]
    fn simulated_failure_keeps_logs_and_error() {
        let output = convert_simulated(RpcSimulateTransactionResult {
            err: Some(TransactionError::InstructionError(
                0,
                InstructionError::Custom(7),
            )),
            logs: Some(vec!["Program log: nope".to_string()]),
            accounts: None,
            units_consumed: Some(3_100),
            return_data: None,
            inner_instructions: None,
        });

        assert_eq!(output.custom_error_code(), Some(7));
        assert_eq!(output.logs, vec!["Program log: nope".to_string()]);
        assert_eq!(output.units_consumed, Some(3_100));
    }

    #[test]
    fn missing_logs_become_empty() {
        let output = convert_simulated(RpcSimulateTransactionResult {
            err: None,
            logs: None,
            accounts: None,
            units_consumed: None,
            return_data: None,
            inner_instructions: None,
        });

        assert!(output.is_success());
        assert!(output.logs.is_empty());
    }
}
