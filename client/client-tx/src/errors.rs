use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use solana_sdk::signature::Signature;

use lander_client_api::errors::{ClientError, SignerError, TransactionError};
use lander_client_api::execution::instruction_custom_error;

/// Custom error codes of one on-chain program, keyed by numeric code.
///
/// Anchor programs number their errors from 6000 upward, so a table is usually
/// built with [`ProgramErrorTable::sequential`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramErrorTable {
    pub program: String,
    pub messages: BTreeMap<u32, String>,
}

impl ProgramErrorTable {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            messages: BTreeMap::new(),
        }
    }

    pub fn sequential<I, S>(program: impl Into<String>, first_code: u32, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let messages = (first_code..)
            .zip(messages)
            .map(|(code, message)| (code, message.into()))
            .collect();
        Self {
            program: program.into(),
            messages,
        }
    }

    pub fn with_error(mut self, code: u32, message: impl Into<String>) -> Self {
        self.messages.insert(code, message.into());
        self
    }

    pub fn message(&self, code: u32) -> Option<&str> {
        self.messages.get(&code).map(String::as_str)
    }

    pub fn decode(&self, error: &TransactionError) -> OnChainFailure {
        decode_on_chain_error(Some(self), error)
    }
}

pub fn decode_on_chain_error(
    table: Option<&ProgramErrorTable>,
    error: &TransactionError,
) -> OnChainFailure {
    let Some((instruction_index, code)) = instruction_custom_error(error) else {
        return OnChainFailure::Transaction(error.clone());
    };

    match table.and_then(|table| table.message(code).map(|message| (table, message))) {
        Some((table, message)) => OnChainFailure::Program {
            instruction_index,
            code,
            program: table.program.clone(),
            message: message.to_string(),
        },
        None => OnChainFailure::UnknownProgram {
            instruction_index,
            code,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnChainFailure {
    #[error("{program} error {code} at instruction {instruction_index}: {message}")]
    Program {
        instruction_index: u8,
        code: u32,
        program: String,
        message: String,
    },
    #[error("unknown program error `{code}` at instruction {instruction_index}")]
    UnknownProgram { instruction_index: u8, code: u32 },
    #[error(transparent)]
    Transaction(TransactionError),
}

impl OnChainFailure {
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Program { code, .. } | Self::UnknownProgram { code, .. } => Some(*code),
            Self::Transaction(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error("signing service transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote signer rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("fee sponsor refused the transaction with status {status}: {error}")]
    Sponsor {
        status: u16,
        error: String,
        details: Option<String>,
    },
    #[error("remote signer returned a malformed payload: {0}")]
    MalformedPayload(String),
    #[error("remote signer altered the transaction message")]
    MessageMismatch,
    #[error("transaction carries {present} of {required} required signatures")]
    MissingSignatures { required: usize, present: usize },
    #[error("signature {index} does not verify")]
    InvalidSignature { index: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("compute unit margin must be a finite multiplier above 1.0, got {0}")]
    InvalidComputeUnitMargin(f64),
    #[error("confirmation timeout must be non-zero")]
    ZeroTimeout,
    #[error("poll interval must be non-zero")]
    ZeroPollInterval,
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("transaction simulation failed: {err}")]
    Preflight {
        err: TransactionError,
        logs: Vec<String>,
    },
    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),
    #[error("transaction {signature} failed on chain: {failure}")]
    OnChain {
        signature: Signature,
        failure: OnChainFailure,
    },
    #[error("transaction {signature} was not confirmed before the deadline")]
    Expired { signature: Signature },
    #[error("submission of {signature} was cancelled")]
    Cancelled { signature: Signature },
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SubmitError {
    /// Signature of the broadcast transaction, once one exists.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Self::OnChain { signature, .. }
            | Self::Expired { signature }
            | Self::Cancelled { signature } => Some(signature),
            _ => None,
        }
    }

    /// The transaction landed; resubmitting the same bytes cannot help.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::OnChain { .. })
    }

    /// The transaction may still land after the caller stopped watching it.
    pub fn is_fate_unknown(&self) -> bool {
        matches!(self, Self::Expired { .. } | Self::Cancelled { .. })
    }
}

pub type SubmitResult<T> = Result<T, SubmitError>;
