#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use solana_rpc_client_api::response::{RpcContactInfo, RpcPrioritizationFee};
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::message::VersionedMessage;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{TransactionError, VersionedTransaction};
use solana_transaction_status::{TransactionConfirmationStatus, TransactionStatus};

use lander_client_api::base::executor::{GetSignatureStatuses, SendTransaction, SimulateTransaction};
use lander_client_api::base::getter::{
    GetClusterNodes, GetLatestBlockhash, GetMultipleAccounts, GetRecentPrioritizationFees,
};
use lander_client_api::errors::{ClientError, ClientResult, RpcClientSpecificError};
use lander_client_api::execution::{SimulationConfig, SimulationOutput};
use lander_client_api::Client;
use lander_client_tx::errors::SigningError;
use lander_client_tx::signer::TransactionSigner;

pub fn transport_error(message: &str) -> ClientError {
    RpcClientSpecificError::Custom(message.to_string()).into()
}

pub fn simulated(units: u64) -> ClientResult<SimulationOutput> {
    Ok(SimulationOutput {
        result: Ok(()),
        logs: vec![],
        units_consumed: Some(units),
    })
}

pub fn simulation_failed(err: TransactionError) -> ClientResult<SimulationOutput> {
    Ok(SimulationOutput {
        result: Err(err),
        logs: vec!["Program log: failed".to_string()],
        units_consumed: Some(1_000),
    })
}

pub fn status(
    slot: u64,
    level: TransactionConfirmationStatus,
    err: Option<TransactionError>,
) -> TransactionStatus {
    TransactionStatus {
        slot,
        confirmations: match level {
            TransactionConfirmationStatus::Finalized => None,
            _ => Some(1),
        },
        status: err.clone().map_or(Ok(()), Err),
        err,
        confirmation_status: Some(level),
    }
}

pub fn fees(values: &[u64]) -> Vec<RpcPrioritizationFee> {
    values
        .iter()
        .enumerate()
        .map(|(slot, &prioritization_fee)| RpcPrioritizationFee {
            slot: slot as u64 + 1,
            prioritization_fee,
        })
        .collect()
}

#[derive(Default)]
pub struct State {
    pub blockhash: Hash,
    pub accounts: HashMap<Pubkey, Account>,
    pub fees: Vec<RpcPrioritizationFee>,
    pub percentile_fees: Option<Vec<RpcPrioritizationFee>>,
    pub default_units: u64,
    pub simulations: VecDeque<ClientResult<SimulationOutput>>,
    pub statuses: VecDeque<ClientResult<Option<TransactionStatus>>>,
    pub failing_sends: usize,
    pub cluster_nodes: Vec<RpcContactInfo>,

    pub simulated: Vec<(VersionedTransaction, SimulationConfig)>,
    pub sent: Vec<VersionedTransaction>,
    pub status_polls: usize,
    pub fee_queries: Vec<(Vec<Pubkey>, Option<u16>)>,
}

/// Node double answering from scripted queues and recording every call.
pub struct MockClient {
    state: Mutex<State>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                blockhash: Hash::new_unique(),
                default_units: 150_000,
                ..State::default()
            }),
        }
    }

    pub fn with_fees(self, values: &[u64]) -> Self {
        self.state.lock().unwrap().fees = fees(values);
        self
    }

    pub fn with_percentile_fees(self, values: &[u64]) -> Self {
        self.state.lock().unwrap().percentile_fees = Some(fees(values));
        self
    }

    pub fn with_account(self, key: Pubkey, account: Account) -> Self {
        self.state.lock().unwrap().accounts.insert(key, account);
        self
    }

    pub fn with_simulation(self, output: ClientResult<SimulationOutput>) -> Self {
        self.state.lock().unwrap().simulations.push_back(output);
        self
    }

    pub fn with_status(self, status: ClientResult<Option<TransactionStatus>>) -> Self {
        self.state.lock().unwrap().statuses.push_back(status);
        self
    }

    /// Advertises one gossip node whose rpc port is `rpc_addr` (`host:port`).
    pub fn with_cluster_node_rpc(self, rpc_addr: &str) -> Self {
        let node: RpcContactInfo = serde_json::from_value(serde_json::json!({
            "pubkey": Pubkey::new_unique().to_string(),
            "rpc": rpc_addr,
        }))
        .unwrap();
        self.state.lock().unwrap().cluster_nodes.push(node);
        self
    }

    pub fn with_failing_sends(self, count: usize) -> Self {
        self.state.lock().unwrap().failing_sends = count;
        self
    }

    pub fn blockhash(&self) -> Hash {
        self.state.lock().unwrap().blockhash
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl Client for MockClient {}

#[async_trait]
impl GetLatestBlockhash for MockClient {
    async fn get_latest_blockhash(&self, _commitment: CommitmentConfig) -> ClientResult<Hash> {
        Ok(self.blockhash())
    }
}

#[async_trait]
impl GetMultipleAccounts for MockClient {
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> ClientResult<Vec<Option<Account>>> {
        let state = self.state();
        Ok(pubkeys.iter().map(|key| state.accounts.get(key).cloned()).collect())
    }
}

#[async_trait]
impl GetRecentPrioritizationFees for MockClient {
    async fn get_recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        let mut state = self.state();
        state.fee_queries.push((accounts.to_vec(), None));
        Ok(state.fees.clone())
    }

    async fn get_recent_prioritization_fees_with_percentile(
        &self,
        accounts: &[Pubkey],
        percentile: u16,
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        let mut state = self.state();
        state.fee_queries.push((accounts.to_vec(), Some(percentile)));
        state
            .percentile_fees
            .clone()
            .ok_or_else(|| transport_error("Invalid params"))
    }
}

#[async_trait]
impl GetClusterNodes for MockClient {
    async fn get_cluster_nodes(&self) -> ClientResult<Vec<RpcContactInfo>> {
        Ok(self.state().cluster_nodes.clone())
    }
}

#[async_trait]
impl SimulateTransaction for MockClient {
    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SimulationConfig,
    ) -> ClientResult<SimulationOutput> {
        let mut state = self.state();
        state.simulated.push((transaction.clone(), config));
        let default_units = state.default_units;
        state
            .simulations
            .pop_front()
            .unwrap_or_else(|| simulated(default_units))
    }
}

#[async_trait]
impl SendTransaction for MockClient {
    async fn send_transaction(&self, transaction: &VersionedTransaction) -> ClientResult<Signature> {
        let mut state = self.state();
        state.sent.push(transaction.clone());
        if state.failing_sends > 0 {
            state.failing_sends -= 1;
            return Err(transport_error("connection reset"));
        }
        Ok(transaction.signatures[0])
    }
}

#[async_trait]
impl GetSignatureStatuses for MockClient {
    async fn get_signature_status(
        &self,
        _signature: &Signature,
    ) -> ClientResult<Option<TransactionStatus>> {
        let mut state = self.state();
        state.status_polls += 1;
        state.statuses.pop_front().unwrap_or(Ok(None))
    }
}

/// Wraps a signer and counts how often it is asked to sign.
pub struct CountingSigner<S> {
    pub inner: S,
    pub calls: Arc<AtomicUsize>,
}

impl<S> CountingSigner<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: TransactionSigner> TransactionSigner for CountingSigner<S> {
    fn fee_payer(&self) -> Pubkey {
        self.inner.fee_payer()
    }

    async fn sign_transaction(
        &self,
        message: VersionedMessage,
    ) -> Result<VersionedTransaction, SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sign_transaction(message).await
    }
}
