//! Broadcast and confirmation.
//!
//! A blockhash-bound transaction is either included before its blockhash
//! expires or never, so the loop keeps rebroadcasting the same bytes until the
//! target commitment is reached, the deadline passes, or the caller cancels.

use std::future::Future;

use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use solana_sdk::clock::Slot;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status::{TransactionConfirmationStatus, TransactionStatus};

use lander_client_api::base::executor::{GetSignatureStatuses, SendTransaction, SimulateTransaction};
use lander_client_api::execution::SimulationConfig;

use crate::config::ConfirmationConfig;
use crate::errors::{decode_on_chain_error, ProgramErrorTable, SigningError, SubmitError, SubmitResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub signature: Signature,
    pub slot: Slot,
    pub confirmation_status: Option<TransactionConfirmationStatus>,
    pub attempts: usize,
}

/// Dry run of `transaction`; a failing simulation is never broadcast.
pub async fn preflight<C>(client: &C, transaction: &VersionedTransaction) -> SubmitResult<()>
where
    C: ?Sized + SimulateTransaction,
{
    let output = client
        .simulate_transaction(transaction, SimulationConfig::preflight())
        .await?;

    match output.result {
        Ok(()) => {
            debug!(units = ?output.units_consumed, "preflight passed");
            Ok(())
        }
        Err(err) => {
            warn!(%err, logs = ?output.logs, "preflight simulation failed");
            Err(SubmitError::Preflight {
                err,
                logs: output.logs,
            })
        }
    }
}

pub struct ConfirmationLoop<'a> {
    commitment: CommitmentLevel,
    config: ConfirmationConfig,
    program_errors: Option<&'a ProgramErrorTable>,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> ConfirmationLoop<'a> {
    pub fn new(commitment: CommitmentLevel, config: ConfirmationConfig) -> Self {
        Self {
            commitment,
            config,
            program_errors: None,
            cancel: None,
        }
    }

    pub fn with_program_errors(mut self, table: Option<&'a ProgramErrorTable>) -> Self {
        self.program_errors = table;
        self
    }

    pub fn with_cancellation(mut self, cancel: Option<&'a CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Rebroadcasts `transaction` and polls its status until it settles.
    ///
    /// Transport failures on either call are retried on the next tick; only
    /// the deadline, cancellation, or a landed status end the loop.
    pub async fn run<C>(
        &self,
        client: &C,
        transaction: &VersionedTransaction,
    ) -> SubmitResult<SubmissionOutcome>
    where
        C: ?Sized + SendTransaction + GetSignatureStatuses,
    {
        let signature = *transaction
            .signatures
            .first()
            .ok_or(SigningError::MissingSignatures {
                required: 1,
                present: 0,
            })?;
        self.drive(client, signature, Some(transaction)).await
    }

    /// Polls a transaction someone else broadcast. Same deadline and
    /// cancellation rules as [`run`](Self::run), without rebroadcasting.
    pub async fn watch<C>(&self, client: &C, signature: Signature) -> SubmitResult<SubmissionOutcome>
    where
        C: ?Sized + SendTransaction + GetSignatureStatuses,
    {
        self.drive(client, signature, None).await
    }

    async fn drive<C>(
        &self,
        client: &C,
        signature: Signature,
        transaction: Option<&VersionedTransaction>,
    ) -> SubmitResult<SubmissionOutcome>
    where
        C: ?Sized + SendTransaction + GetSignatureStatuses,
    {
        let target = CommitmentConfig {
            commitment: self.commitment,
        };
        let deadline = Instant::now() + self.config.timeout;
        let mut attempts = 0;

        while let Some(remaining) = remaining_until(deadline) {
            attempts += 1;

            let attempt = timeout(remaining, self.attempt(client, transaction, &signature, target));
            let status = match self.unless_cancelled(attempt).await {
                None => return Err(self.cancelled(signature, attempts)),
                Some(Err(_elapsed)) => break,
                Some(Ok(status)) => status,
            };

            if let Some(status) = status {
                return self.settle(signature, status, attempts);
            }

            let Some(remaining) = remaining_until(deadline) else {
                break;
            };
            let pause = sleep(self.config.poll_interval.min(remaining));
            if self.unless_cancelled(pause).await.is_none() {
                return Err(self.cancelled(signature, attempts));
            }
        }

        warn!(%signature, attempts, "transaction not confirmed before deadline");
        Err(SubmitError::Expired { signature })
    }

    async fn attempt<C>(
        &self,
        client: &C,
        transaction: Option<&VersionedTransaction>,
        signature: &Signature,
        target: CommitmentConfig,
    ) -> Option<TransactionStatus>
    where
        C: ?Sized + SendTransaction + GetSignatureStatuses,
    {
        if let Some(transaction) = transaction {
            if let Err(error) = client.send_transaction(transaction).await {
                debug!(%signature, %error, "broadcast failed, retrying next tick");
            }
        }

        match client.get_signature_status(signature).await {
            Ok(Some(status)) if status.satisfies_commitment(target) => Some(status),
            Ok(Some(status)) => {
                debug!(%signature, current = ?status.confirmation_status, "below target commitment");
                None
            }
            Ok(None) => None,
            Err(error) => {
                debug!(%signature, %error, "status poll failed, retrying next tick");
                None
            }
        }
    }

    fn settle(
        &self,
        signature: Signature,
        status: TransactionStatus,
        attempts: usize,
    ) -> SubmitResult<SubmissionOutcome> {
        if let Some(err) = status.err {
            let failure = decode_on_chain_error(self.program_errors, &err);
            warn!(%signature, slot = status.slot, %failure, "transaction failed on chain");
            return Err(SubmitError::OnChain { signature, failure });
        }

        info!(%signature, slot = status.slot, attempts, "transaction confirmed");
        Ok(SubmissionOutcome {
            signature,
            slot: status.slot,
            confirmation_status: status.confirmation_status,
            attempts,
        })
    }

    /// `None` when the token fired first.
    async fn unless_cancelled<F: Future>(&self, future: F) -> Option<F::Output> {
        match self.cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                output = future => Some(output),
            },
            None => Some(future.await),
        }
    }

    fn cancelled(&self, signature: Signature, attempts: usize) -> SubmitError {
        info!(%signature, attempts, "confirmation cancelled");
        SubmitError::Cancelled { signature }
    }
}

fn remaining_until(deadline: Instant) -> Option<std::time::Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|remaining| !remaining.is_zero())
}
