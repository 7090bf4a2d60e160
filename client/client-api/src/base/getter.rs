use std::sync::Arc;

use async_trait::async_trait;

use solana_rpc_client_api::response::{RpcContactInfo, RpcPrioritizationFee};
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;

use crate::client::Client;
use crate::errors::ClientResult;

#[async_trait]
pub trait GetMultipleAccounts: Client {
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> ClientResult<Vec<Option<Account>>>;
}

#[async_trait]
impl<C: ?Sized + GetMultipleAccounts> GetMultipleAccounts for &C {
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> ClientResult<Vec<Option<Account>>> {
        (**self).get_multiple_accounts(pubkeys).await
    }
}

#[async_trait]
impl<C: ?Sized + GetMultipleAccounts> GetMultipleAccounts for Box<C> {
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> ClientResult<Vec<Option<Account>>> {
        (**self).get_multiple_accounts(pubkeys).await
    }
}

#[async_trait]
impl<C: ?Sized + GetMultipleAccounts> GetMultipleAccounts for Arc<C> {
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> ClientResult<Vec<Option<Account>>> {
        (**self).get_multiple_accounts(pubkeys).await
    }
}

#[async_trait]
pub trait GetLatestBlockhash: Client {
    async fn get_latest_blockhash(&self, commitment: CommitmentConfig) -> ClientResult<Hash>;
}

#[async_trait]
impl<C: ?Sized + GetLatestBlockhash> GetLatestBlockhash for &C {
    async fn get_latest_blockhash(&self, commitment: CommitmentConfig) -> ClientResult<Hash> {
        (**self).get_latest_blockhash(commitment).await
    }
}

#[async_trait]
impl<C: ?Sized + GetLatestBlockhash> GetLatestBlockhash for Box<C> {
    async fn get_latest_blockhash(&self, commitment: CommitmentConfig) -> ClientResult<Hash> {
        (**self).get_latest_blockhash(commitment).await
    }
}

#[async_trait]
impl<C: ?Sized + GetLatestBlockhash> GetLatestBlockhash for Arc<C> {
    async fn get_latest_blockhash(&self, commitment: CommitmentConfig) -> ClientResult<Hash> {
        (**self).get_latest_blockhash(commitment).await
    }
}

/// Recent per-slot fee observations for a set of locked accounts.
///
/// The percentile variant is a non-standard extension of
/// `getRecentPrioritizationFees` served by some providers; `percentile` is in
/// basis points (5000 = median).
#[async_trait]
pub trait GetRecentPrioritizationFees: Client {
    async fn get_recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> ClientResult<Vec<RpcPrioritizationFee>>;

    async fn get_recent_prioritization_fees_with_percentile(
        &self,
        accounts: &[Pubkey],
        percentile: u16,
    ) -> ClientResult<Vec<RpcPrioritizationFee>>;
}

#[async_trait]
impl<C: ?Sized + GetRecentPrioritizationFees> GetRecentPrioritizationFees for &C {
    async fn get_recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        (**self).get_recent_prioritization_fees(accounts).await
    }

    async fn get_recent_prioritization_fees_with_percentile(
        &self,
        accounts: &[Pubkey],
        percentile: u16,
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        (**self)
            .get_recent_prioritization_fees_with_percentile(accounts, percentile)
            .await
    }
}

#[async_trait]
impl<C: ?Sized + GetRecentPrioritizationFees> GetRecentPrioritizationFees for Box<C> {
    async fn get_recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        (**self).get_recent_prioritization_fees(accounts).await
    }

    async fn get_recent_prioritization_fees_with_percentile(
        &self,
        accounts: &[Pubkey],
        percentile: u16,
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        (**self)
            .get_recent_prioritization_fees_with_percentile(accounts, percentile)
            .await
    }
}

#[async_trait]
impl<C: ?Sized + GetRecentPrioritizationFees> GetRecentPrioritizationFees for Arc<C> {
    async fn get_recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        (**self).get_recent_prioritization_fees(accounts).await
    }

    async fn get_recent_prioritization_fees_with_percentile(
        &self,
        accounts: &[Pubkey],
        percentile: u16,
    ) -> ClientResult<Vec<RpcPrioritizationFee>> {
        (**self)
            .get_recent_prioritization_fees_with_percentile(accounts, percentile)
            .await
    }
}

#[async_trait]
pub trait GetClusterNodes: Client {
    async fn get_cluster_nodes(&self) -> ClientResult<Vec<RpcContactInfo>>;
}

#[async_trait]
impl<C: ?Sized + GetClusterNodes> GetClusterNodes for &C {
    async fn get_cluster_nodes(&self) -> ClientResult<Vec<RpcContactInfo>> {
        (**self).get_cluster_nodes().await
    }
}

#[async_trait]
impl<C: ?Sized + GetClusterNodes> GetClusterNodes for Box<C> {
    async fn get_cluster_nodes(&self) -> ClientResult<Vec<RpcContactInfo>> {
        (**self).get_cluster_nodes().await
    }
}

#[async_trait]
impl<C: ?Sized + GetClusterNodes> GetClusterNodes for Arc<C> {
    async fn get_cluster_nodes(&self) -> ClientResult<Vec<RpcContactInfo>> {
        (**self).get_cluster_nodes().await
    }
}
