//! Fee-sponsored submission.
//!
//! A sponsor service co-signs as fee payer and broadcasts the transaction
//! itself, answering with the signature it landed under. The caller signs
//! every other required slot beforehand.

use std::str::FromStr;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;

use crate::errors::SigningError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorConfig {
    /// Full url the partially signed transaction is posted to.
    pub endpoint: String,
    /// Account the sponsor signs with. Must lead the message's account keys.
    pub fee_payer: Pubkey,
}

impl SponsorConfig {
    pub fn new(endpoint: impl Into<String>, fee_payer: Pubkey) -> Self {
        Self {
            endpoint: endpoint.into(),
            fee_payer,
        }
    }
}

#[derive(Serialize)]
struct SponsorRequest<'a> {
    transaction: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SponsorResponse {
    transaction_hash: Option<String>,
}

#[derive(Deserialize)]
struct SponsorRejection {
    error: Option<String>,
    details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SponsorSubmitter {
    http: reqwest::Client,
    config: SponsorConfig,
}

impl SponsorSubmitter {
    pub fn new(config: SponsorConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: SponsorConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn fee_payer(&self) -> Pubkey {
        self.config.fee_payer
    }

    /// Hands `transaction` to the sponsor and returns the signature it was
    /// broadcast under. The fee payer slot may still be zeroed.
    pub async fn submit(&self, transaction: &VersionedTransaction) -> Result<Signature, SigningError> {
        let serialized = bincode::serialize(transaction)
            .map_err(|e| SigningError::MalformedPayload(e.to_string()))?;
        let encoded = BASE64_STANDARD.encode(serialized);

        debug!(fee_payer = %self.config.fee_payer, "submitting to fee sponsor");
        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&SponsorRequest {
                transaction: &encoded,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, fee_payer = %self.config.fee_payer, "fee sponsor refused transaction");
            return Err(rejection(status.as_u16(), body));
        }

        let response: SponsorResponse = response
            .json()
            .await
            .map_err(|e| SigningError::MalformedPayload(e.to_string()))?;
        let hash = response.transaction_hash.ok_or_else(|| {
            SigningError::MalformedPayload("sponsor did not return a transaction hash".to_string())
        })?;
        Signature::from_str(&hash).map_err(|e| SigningError::MalformedPayload(e.to_string()))
    }
}

/// Structured `{error, details}` bodies keep their fields; anything else is
/// reported verbatim.
fn rejection(status: u16, body: String) -> SigningError {
    match serde_json::from_str::<SponsorRejection>(&body) {
        Ok(SponsorRejection {
            error: Some(error),
            details,
        }) => SigningError::Sponsor {
            status,
            error,
            details,
        },
        _ => SigningError::Rejected { status, body },
    }
}
