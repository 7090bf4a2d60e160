//! Signing backends.
//!
//! A [`TransactionSigner`] receives a compiled message and must hand back a
//! transaction carrying every signature the message requires. Local keys sign
//! in process; [`RemoteSigner`] asks a custodial wallet service over HTTPS.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use solana_sdk::message::VersionedMessage;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::signers::Signers;
use solana_sdk::signer::{Signer, SignerError};
use solana_sdk::transaction::VersionedTransaction;

use crate::errors::SigningError;
use crate::message::unsigned_transaction;

pub const DEFAULT_REMOTE_SIGNER_URL: &str = "https://api.privy.io";

const APP_ID_HEADER: &str = "privy-app-id";
const AUTHORIZATION_SIGNATURE_HEADER: &str = "privy-authorization-signature";

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Account that pays fees and leads the message's account keys.
    fn fee_payer(&self) -> Pubkey;

    async fn sign_transaction(
        &self,
        message: VersionedMessage,
    ) -> Result<VersionedTransaction, SigningError>;
}

#[async_trait]
impl<S: ?Sized + TransactionSigner> TransactionSigner for &S {
    fn fee_payer(&self) -> Pubkey {
        (**self).fee_payer()
    }

    async fn sign_transaction(
        &self,
        message: VersionedMessage,
    ) -> Result<VersionedTransaction, SigningError> {
        (**self).sign_transaction(message).await
    }
}

#[async_trait]
impl<S: ?Sized + TransactionSigner> TransactionSigner for Arc<S> {
    fn fee_payer(&self) -> Pubkey {
        (**self).fee_payer()
    }

    async fn sign_transaction(
        &self,
        message: VersionedMessage,
    ) -> Result<VersionedTransaction, SigningError> {
        (**self).sign_transaction(message).await
    }
}

/// Every required signature is present, non-default and valid.
pub fn ensure_fully_signed(transaction: &VersionedTransaction) -> Result<(), SigningError> {
    let required = usize::from(transaction.message.header().num_required_signatures);
    let present = transaction
        .signatures
        .iter()
        .filter(|signature| **signature != Signature::default())
        .count();

    if transaction.signatures.len() != required || present != required {
        return Err(SigningError::MissingSignatures { required, present });
    }

    match transaction.verify_with_results().iter().position(|ok| !ok) {
        Some(index) => Err(SigningError::InvalidSignature { index }),
        None => Ok(()),
    }
}

/// Keypairs held in process. The first signer pays the fees.
#[derive(Clone)]
pub struct LocalSigner {
    signers: Vec<Arc<dyn Signer + Send + Sync>>,
}

impl LocalSigner {
    pub fn new(payer: Arc<dyn Signer + Send + Sync>) -> Self {
        Self {
            signers: vec![payer],
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer + Send + Sync>) -> Self {
        self.signers.push(signer);
        self
    }

    /// Fills the signature slots this signer holds keys for and leaves the
    /// rest zeroed, for messages another party completes.
    pub fn partially_sign(
        &self,
        message: VersionedMessage,
    ) -> Result<VersionedTransaction, SigningError> {
        let mut transaction = unsigned_transaction(message);
        let bytes = transaction.message.serialize();
        let required = transaction.signatures.len();

        let mut present = 0;
        let keys = transaction.message.static_account_keys().iter().take(required);
        for (slot, key) in keys.enumerate() {
            if let Some(signer) = self.signers.iter().find(|s| s.pubkey() == *key) {
                transaction.signatures[slot] = signer.try_sign_message(&bytes)?;
                present += 1;
            }
        }

        if present == 0 {
            return Err(SigningError::MissingSignatures { required, present });
        }
        Ok(transaction)
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<Pubkey> = self.signers.iter().map(|s| s.pubkey()).collect();
        f.debug_struct("LocalSigner").field("signers", &keys).finish()
    }
}

#[async_trait]
impl TransactionSigner for LocalSigner {
    fn fee_payer(&self) -> Pubkey {
        self.signers[0].pubkey()
    }

    async fn sign_transaction(
        &self,
        message: VersionedMessage,
    ) -> Result<VersionedTransaction, SigningError> {
        let signers: Vec<&dyn Signer> = self
            .signers
            .iter()
            .map(|signer| signer.as_ref() as &dyn Signer)
            .collect();
        let required = message.static_account_keys()
            [..usize::from(message.header().num_required_signatures)]
            .to_vec();
        let signers = RequiredSigners::new(&signers, &required)?;

        let transaction = VersionedTransaction::try_new(message, &signers)?;
        ensure_fully_signed(&transaction)?;
        Ok(transaction)
    }
}

/// View over `signers` restricted to the keys a message requires, each key
/// at most once. Extra keypairs are ignored instead of failing the signature.
struct RequiredSigners<'a, S: Signers + ?Sized> {
    signers: &'a S,
    indexes: Vec<usize>,
}

impl<'a, S: Signers + ?Sized> RequiredSigners<'a, S> {
    fn new(signers: &'a S, required: &[Pubkey]) -> Result<Self, SignerError> {
        let signer_keys = signers.try_pubkeys()?;

        let mut seen = BTreeSet::new();
        let mut indexes = Vec::new();
        for (i, key) in signer_keys.into_iter().enumerate() {
            if !required.contains(&key) || !seen.insert(key) {
                continue;
            }
            indexes.push(i);
        }

        Ok(Self { signers, indexes })
    }
}

impl<'a, S: Signers + ?Sized> Signers for RequiredSigners<'a, S> {
    fn pubkeys(&self) -> Vec<Pubkey> {
        let pubkeys = self.signers.pubkeys();
        self.indexes.iter().map(|&i| pubkeys[i]).collect()
    }

    fn try_pubkeys(&self) -> Result<Vec<Pubkey>, SignerError> {
        let pubkeys = self.signers.try_pubkeys()?;
        Ok(self.indexes.iter().map(|&i| pubkeys[i]).collect())
    }

    fn sign_message(&self, message: &[u8]) -> Vec<Signature> {
        let signatures = self.signers.sign_message(message);
        self.indexes.iter().map(|&i| signatures[i]).collect()
    }

    fn try_sign_message(&self, message: &[u8]) -> Result<Vec<Signature>, SignerError> {
        let signatures = self.signers.try_sign_message(message)?;
        Ok(self.indexes.iter().map(|&i| signatures[i]).collect())
    }

    fn is_interactive(&self) -> bool {
        self.signers.is_interactive()
    }
}

/// Credentials for a custodial wallet service.
#[derive(Clone)]
pub struct RemoteSignerConfig {
    pub base_url: String,
    pub wallet_id: String,
    pub wallet_address: Pubkey,
    pub app_id: String,
    pub app_secret: String,
    pub authorization_signature: Option<String>,
}

impl RemoteSignerConfig {
    pub fn new(
        wallet_id: impl Into<String>,
        wallet_address: Pubkey,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: DEFAULT_REMOTE_SIGNER_URL.to_string(),
            wallet_id: wallet_id.into(),
            wallet_address,
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            authorization_signature: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_authorization_signature(mut self, signature: impl Into<String>) -> Self {
        self.authorization_signature = Some(signature.into());
        self
    }
}

impl std::fmt::Debug for RemoteSignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSignerConfig")
            .field("base_url", &self.base_url)
            .field("wallet_id", &self.wallet_id)
            .field("wallet_address", &self.wallet_address)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct SignTransactionRequest<'a> {
    method: &'static str,
    params: SignTransactionParams<'a>,
}

#[derive(Serialize)]
struct SignTransactionParams<'a> {
    transaction: &'a str,
    encoding: &'static str,
}

#[derive(Deserialize)]
struct SignTransactionResponse {
    data: SignedTransactionData,
}

#[derive(Deserialize)]
struct SignedTransactionData {
    signed_transaction: String,
}

/// Signs through a custodial wallet's JSON-RPC endpoint. The wallet is the
/// fee payer and must be the only required signer.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    http: reqwest::Client,
    config: RemoteSignerConfig,
}

impl RemoteSigner {
    pub fn new(config: RemoteSignerConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: RemoteSignerConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/wallets/{}/rpc",
            self.config.base_url.trim_end_matches('/'),
            self.config.wallet_id
        )
    }
}

#[async_trait]
impl TransactionSigner for RemoteSigner {
    fn fee_payer(&self) -> Pubkey {
        self.config.wallet_address
    }

    async fn sign_transaction(
        &self,
        message: VersionedMessage,
    ) -> Result<VersionedTransaction, SigningError> {
        let unsigned = unsigned_transaction(message);
        let serialized = bincode::serialize(&unsigned)
            .map_err(|e| SigningError::MalformedPayload(e.to_string()))?;
        let encoded = BASE64_STANDARD.encode(serialized);

        let mut request = self
            .http
            .post(self.endpoint())
            .basic_auth(&self.config.app_id, Some(&self.config.app_secret))
            .header(APP_ID_HEADER, &self.config.app_id)
            .json(&SignTransactionRequest {
                method: "signTransaction",
                params: SignTransactionParams {
                    transaction: &encoded,
                    encoding: "base64",
                },
            });
        if let Some(signature) = &self.config.authorization_signature {
            request = request.header(AUTHORIZATION_SIGNATURE_HEADER, signature);
        }

        debug!(wallet = %self.config.wallet_address, "requesting remote signature");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, wallet = %self.config.wallet_address, "remote signer rejected request");
            return Err(SigningError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let response: SignTransactionResponse = response
            .json()
            .await
            .map_err(|e| SigningError::MalformedPayload(e.to_string()))?;
        let bytes = BASE64_STANDARD
            .decode(response.data.signed_transaction)
            .map_err(|e| SigningError::MalformedPayload(e.to_string()))?;
        let signed: VersionedTransaction = bincode::deserialize(&bytes)
            .map_err(|e| SigningError::MalformedPayload(e.to_string()))?;

        if signed.message != unsigned.message {
            return Err(SigningError::MessageMismatch);
        }
        ensure_fully_signed(&signed)?;
        Ok(signed)
    }
}
