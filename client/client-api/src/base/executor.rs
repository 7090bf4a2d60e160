use std::sync::Arc;

use async_trait::async_trait;

use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status::TransactionStatus;

use crate::client::Client;
use crate::errors::ClientResult;
use crate::execution::{SimulationConfig, SimulationOutput};

#[async_trait]
pub trait SimulateTransaction: Client {
    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SimulationConfig,
    ) -> ClientResult<SimulationOutput>;
}

#[async_trait]
impl<C: ?Sized + SimulateTransaction> SimulateTransaction for &C {
    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SimulationConfig,
    ) -> ClientResult<SimulationOutput> {
        (**self).simulate_transaction(transaction, config).await
    }
}

#[async_trait]
impl<C: ?Sized + SimulateTransaction> SimulateTransaction for Box<C> {
    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SimulationConfig,
    ) -> ClientResult<SimulationOutput> {
        (**self).simulate_transaction(transaction, config).await
    }
}

#[async_trait]
impl<C: ?Sized + SimulateTransaction> SimulateTransaction for Arc<C> {
    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
        config: SimulationConfig,
    ) -> ClientResult<SimulationOutput> {
        (**self).simulate_transaction(transaction, config).await
    }
}

/// Broadcast without preflight and without transport-level retries.
#[async_trait]
pub trait SendTransaction: Client {
    async fn send_transaction(&self, transaction: &VersionedTransaction)
        -> ClientResult<Signature>;
}

#[async_trait]
impl<C: ?Sized + SendTransaction> SendTransaction for &C {
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> ClientResult<Signature> {
        (**self).send_transaction(transaction).await
    }
}

#[async_trait]
impl<C: ?Sized + SendTransaction> SendTransaction for Box<C> {
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> ClientResult<Signature> {
        (**self).send_transaction(transaction).await
    }
}

#[async_trait]
impl<C: ?Sized + SendTransaction> SendTransaction for Arc<C> {
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> ClientResult<Signature> {
        (**self).send_transaction(transaction).await
    }
}

#[async_trait]
pub trait GetSignatureStatuses: Client {
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> ClientResult<Option<TransactionStatus>>;
}

#[async_trait]
impl<C: ?Sized + GetSignatureStatuses> GetSignatureStatuses for &C {
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> ClientResult<Option<TransactionStatus>> {
        (**self).get_signature_status(signature).await
    }
}

#[async_trait]
impl<C: ?Sized + GetSignatureStatuses> GetSignatureStatuses for Box<C> {
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> ClientResult<Option<TransactionStatus>> {
        (**self).get_signature_status(signature).await
    }
}

#[async_trait]
impl<C: ?Sized + GetSignatureStatuses> GetSignatureStatuses for Arc<C> {
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> ClientResult<Option<TransactionStatus>> {
        (**self).get_signature_status(signature).await
    }
}
