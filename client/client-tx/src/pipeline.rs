use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use solana_sdk::commitment_config::CommitmentLevel;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::VersionedMessage;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;

use lander_client_api::base::executor::{GetSignatureStatuses, SendTransaction, SimulateTransaction};
use lander_client_api::base::getter::{
    GetClusterNodes, GetLatestBlockhash, GetMultipleAccounts, GetRecentPrioritizationFees,
};
use lander_client_api::errors::ClientError;
use lander_client_sys::fee::prioritization_fee;

use crate::compute_budget::{apply_margin, estimate_compute_units};
use crate::config::PipelineConfig;
use crate::errors::{ConfigError, ProgramErrorTable, SubmitResult};
use crate::message::{assemble_message, unsigned_transaction};
use crate::priority_fee::resolve_unit_price;
use crate::signer::{ensure_fully_signed, LocalSigner, TransactionSigner};
use crate::sponsor::SponsorSubmitter;
use crate::submit::{preflight, ConfirmationLoop, SubmissionOutcome};

/// Everything the pipeline needs from a node.
pub trait PipelineClient:
    GetLatestBlockhash
    + GetMultipleAccounts
    + GetRecentPrioritizationFees
    + GetClusterNodes
    + SimulateTransaction
    + SendTransaction
    + GetSignatureStatuses
{
}

impl<C> PipelineClient for C where
    C: ?Sized
        + GetLatestBlockhash
        + GetMultipleAccounts
        + GetRecentPrioritizationFees
        + GetClusterNodes
        + SimulateTransaction
        + SendTransaction
        + GetSignatureStatuses
{
}

#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub instructions: Vec<Instruction>,
    pub lookup_table_addresses: Vec<Pubkey>,
    pub commitment: CommitmentLevel,
    /// Skips compute budgeting, fee pricing and preflight. For transactions
    /// whose accounts only exist once earlier ones land.
    pub ephemeral: bool,
    pub program_errors: Option<ProgramErrorTable>,
    pub cancel: Option<CancellationToken>,
}

impl SubmitRequest {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            lookup_table_addresses: Vec::new(),
            commitment: CommitmentLevel::Confirmed,
            ephemeral: false,
            program_errors: None,
            cancel: None,
        }
    }

    pub fn with_lookup_tables(mut self, addresses: Vec<Pubkey>) -> Self {
        self.lookup_table_addresses = addresses;
        self
    }

    pub fn with_commitment(mut self, commitment: CommitmentLevel) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn with_program_errors(mut self, table: ProgramErrorTable) -> Self {
        self.program_errors = Some(table);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn confirmation_loop<'a>(&'a self, config: &PipelineConfig) -> ConfirmationLoop<'a> {
        ConfirmationLoop::new(self.commitment, config.confirmation)
            .with_program_errors(self.program_errors.as_ref())
            .with_cancellation(self.cancel.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub transaction: VersionedTransaction,
    /// `None` for ephemeral requests, which carry no budget instructions.
    pub compute_unit_limit: Option<u32>,
    pub compute_unit_price: u64,
    pub priority_fee_lamports: u64,
}

struct PreparedMessage {
    message: VersionedMessage,
    compute_unit_limit: Option<u32>,
    compute_unit_price: u64,
}

pub struct TransactionPipeline<C> {
    client: C,
    config: PipelineConfig,
}

impl<C: PipelineClient> TransactionPipeline<C> {
    pub fn new(client: C, config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compiles and signs without broadcasting.
    #[instrument(skip_all, fields(payer = %signer.fee_payer(), ephemeral = request.ephemeral))]
    pub async fn build_transaction(
        &self,
        request: &SubmitRequest,
        signer: &dyn TransactionSigner,
    ) -> SubmitResult<BuiltTransaction> {
        let prepared = self.prepare(request, signer.fee_payer()).await?;
        self.sign(prepared, signer).await
    }

    /// Builds, preflights, signs, broadcasts and waits for `request.commitment`.
    ///
    /// Preflight runs on the unsigned message so a failing simulation never
    /// reaches the signer.
    #[instrument(skip_all, fields(payer = %signer.fee_payer(), ephemeral = request.ephemeral))]
    pub async fn build_and_send(
        &self,
        request: &SubmitRequest,
        signer: &dyn TransactionSigner,
    ) -> SubmitResult<SubmissionOutcome> {
        let prepared = self.prepare(request, signer.fee_payer()).await?;
        if !request.ephemeral {
            preflight(&self.client, &unsigned_transaction(prepared.message.clone())).await?;
        }

        let built = self.sign(prepared, signer).await?;
        let outcome = request
            .confirmation_loop(&self.config)
            .run(&self.client, &built.transaction)
            .await?;

        info!(
            signature = %outcome.signature,
            slot = outcome.slot,
            priority_fee_lamports = built.priority_fee_lamports,
            "transaction landed"
        );
        Ok(outcome)
    }

    /// Submits an already signed transaction. Only the confirmation settings
    /// and the ephemeral flag of `request` apply.
    ///
    /// A transaction missing any required signature is rejected before
    /// preflight, since simulation does not verify signatures.
    #[instrument(skip_all, fields(signature = ?transaction.signatures.first()))]
    pub async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        request: &SubmitRequest,
    ) -> SubmitResult<SubmissionOutcome> {
        ensure_fully_signed(transaction)?;
        if !request.ephemeral {
            preflight(&self.client, transaction).await?;
        }
        request
            .confirmation_loop(&self.config)
            .run(&self.client, transaction)
            .await
    }

    /// Builds a message whose fees `sponsor` pays, signs the remaining slots
    /// with `signer`, and waits for the sponsor's broadcast to land.
    #[instrument(skip_all, fields(fee_payer = %sponsor.fee_payer(), ephemeral = request.ephemeral))]
    pub async fn build_and_sponsor(
        &self,
        request: &SubmitRequest,
        signer: &LocalSigner,
        sponsor: &SponsorSubmitter,
    ) -> SubmitResult<SubmissionOutcome> {
        let prepared = self.prepare(request, sponsor.fee_payer()).await?;
        if !request.ephemeral {
            preflight(&self.client, &unsigned_transaction(prepared.message.clone())).await?;
        }

        let transaction = signer.partially_sign(prepared.message)?;
        let signature = sponsor.submit(&transaction).await?;
        debug!(%signature, "sponsor accepted transaction");

        let outcome = request
            .confirmation_loop(&self.config)
            .watch(&self.client, signature)
            .await?;
        info!(signature = %outcome.signature, slot = outcome.slot, "sponsored transaction landed");
        Ok(outcome)
    }

    async fn prepare(&self, request: &SubmitRequest, payer: Pubkey) -> SubmitResult<PreparedMessage> {
        let draft = assemble_message(
            &self.client,
            payer,
            request.instructions.clone(),
            &request.lookup_table_addresses,
            self.config.blockhash_commitment(),
        )
        .await?;

        if request.ephemeral {
            return Ok(PreparedMessage {
                message: draft.compile().map_err(ClientError::from)?,
                compute_unit_limit: None,
                compute_unit_price: 0,
            });
        }

        let consumed = estimate_compute_units(&self.client, &draft).await;
        let unit_limit = apply_margin(consumed, self.config.compute_unit_margin);
        let unit_price = resolve_unit_price(
            &self.client,
            &self.config.priority_fee,
            self.config.percentile_support,
            &draft.instructions,
            unit_limit,
        )
        .await?;
        debug!(consumed, unit_limit, unit_price, "compute budget resolved");

        let message = draft
            .with_compute_budget(unit_limit, unit_price)
            .compile()
            .map_err(ClientError::from)?;

        Ok(PreparedMessage {
            message,
            compute_unit_limit: Some(unit_limit),
            compute_unit_price: unit_price,
        })
    }

    async fn sign(
        &self,
        prepared: PreparedMessage,
        signer: &dyn TransactionSigner,
    ) -> SubmitResult<BuiltTransaction> {
        let priority_fee_lamports = match prepared.compute_unit_limit {
            Some(_) => prioritization_fee(&prepared.message)?.get_fee(),
            None => 0,
        };
        let transaction = signer.sign_transaction(prepared.message).await?;

        Ok(BuiltTransaction {
            transaction,
            compute_unit_limit: prepared.compute_unit_limit,
            compute_unit_price: prepared.compute_unit_price,
            priority_fee_lamports,
        })
    }
}
