//! Wallet extension adapter.
//!
//! Key custody and the extension UI live outside this crate. A [`WalletKit`]
//! implementation bridges to whatever wallet the embedding UI talks to.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::strkey::AccountId;

pub const FREIGHTER_ID: &str = "freighter";
pub const XBULL_ID: &str = "xbull";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("wallet not connected")]
    NotConnected,

    #[error("unknown wallet: {0}")]
    UnknownWallet(String),

    #[error("wallet unavailable: {0}")]
    Unavailable(String),

    #[error("wallet returned an invalid address: {0}")]
    InvalidAddress(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("unrecognised sign response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub id: String,
    pub name: String,
    pub is_available: bool,
}

/// A browser-extension style wallet.
#[async_trait]
pub trait WalletKit: Send + Sync {
    async fn supported_wallets(&self) -> Vec<WalletInfo>;

    /// Select which wallet subsequent calls go to.
    fn set_wallet(&self, wallet_id: &str) -> Result<(), WalletError>;

    async fn get_address(&self) -> Result<String, WalletError>;

    /// Sign a base64 transaction envelope. Wallets disagree on the response
    /// shape, so the raw JSON is returned for [`SignResponse`] to normalize.
    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        network_passphrase: &str,
    ) -> Result<Value, WalletError>;
}

/// The response shapes wallets use for a signed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SignResponse {
    Raw(String),
    Result {
        result: String,
    },
    SignedTxXdr {
        #[serde(rename = "signedTxXdr")]
        signed_tx_xdr: String,
    },
}

impl SignResponse {
    pub fn from_value(value: Value) -> Result<Self, WalletError> {
        serde_json::from_value(value.clone())
            .map_err(|_| WalletError::MalformedResponse(value.to_string()))
    }

    fn shape(&self) -> &'static str {
        match self {
            SignResponse::Raw(_) => "raw",
            SignResponse::Result { .. } => "result",
            SignResponse::SignedTxXdr { .. } => "signedTxXdr",
        }
    }

    pub fn into_xdr(self) -> String {
        match self {
            SignResponse::Raw(xdr)
            | SignResponse::Result { result: xdr }
            | SignResponse::SignedTxXdr { signed_tx_xdr: xdr } => xdr,
        }
    }
}

/// Sign `envelope_xdr` and normalize the wallet's answer to the signed
/// envelope text.
pub async fn sign_envelope(
    kit: &dyn WalletKit,
    envelope_xdr: &str,
    network_passphrase: &str,
) -> Result<String, WalletError> {
    let raw = kit.sign_transaction(envelope_xdr, network_passphrase).await?;
    let response = SignResponse::from_value(raw)?;
    debug!(shape = response.shape(), "wallet signed transaction");
    Ok(response.into_xdr())
}

/// The connected identity plus, when available, the means to sign.
///
/// A session restored from disk carries the public key only; reads work but
/// writes need a fresh connection.
#[derive(Clone, Default)]
pub struct WalletSession {
    public_key: Option<AccountId>,
    signer: Option<Arc<dyn WalletKit>>,
}

impl WalletSession {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(public_key: AccountId, signer: Arc<dyn WalletKit>) -> Self {
        Self {
            public_key: Some(public_key),
            signer: Some(signer),
        }
    }

    pub fn restored(public_key: AccountId) -> Self {
        Self {
            public_key: Some(public_key),
            signer: None,
        }
    }

    pub fn public_key(&self) -> Option<&AccountId> {
        self.public_key.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.public_key.is_some()
    }

    pub fn can_sign(&self) -> bool {
        self.public_key.is_some() && self.signer.is_some()
    }

    /// Signer and the account it signs for.
    pub fn signer(&self) -> Result<(&AccountId, &Arc<dyn WalletKit>), WalletError> {
        match (&self.public_key, &self.signer) {
            (Some(key), Some(signer)) => Ok((key, signer)),
            _ => Err(WalletError::NotConnected),
        }
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("public_key", &self.public_key)
            .field("can_sign", &self.signer.is_some())
            .finish()
    }
}
