use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::ContractKind;
use crate::rpc::RpcError;
use crate::validation::ValidationError;
use crate::wallet::WalletError;
use crate::xdr::XdrError;

/// Errors surfaced by contract calls and the services built on them.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("{0} contract not configured")]
    ContractNotConfigured(ContractKind),

    #[error("Transaction cancelled by user")]
    UserDeclinedSigning,

    #[error("Insufficient XLM balance")]
    InsufficientBalance,

    #[error("Transaction format error. Please try reconnecting your wallet.")]
    TransactionFormatError,

    #[error("Network or decode error: {0}")]
    NetworkOrDecode(String),

    #[error("Transaction not confirmed after {attempts} attempts")]
    TransactionTimeout { attempts: u32 },

    #[error("Transaction {hash} failed")]
    TransactionFailed { hash: String },

    #[error("{0}")]
    Submission(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caused by user input or a user decision.
    UserError,
    /// Wallet missing or misbehaving.
    WalletError,
    /// Network connectivity, RPC, or response decoding.
    NetworkError,
    /// The chain rejected or never confirmed the transaction.
    ChainError,
    /// Missing deployment configuration.
    ConfigError,
}

impl ChainError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::WalletNotConnected | Self::TransactionFormatError => ErrorCategory::WalletError,
            Self::ContractNotConfigured(_) => ErrorCategory::ConfigError,
            Self::UserDeclinedSigning | Self::InsufficientBalance | Self::Validation(_) => {
                ErrorCategory::UserError
            }
            Self::NetworkOrDecode(_) => ErrorCategory::NetworkError,
            Self::TransactionTimeout { .. }
            | Self::TransactionFailed { .. }
            | Self::Submission(_) => ErrorCategory::ChainError,
        }
    }

    /// Message suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::WalletNotConnected => "Please connect your wallet first".into(),
            Self::ContractNotConfigured(kind) => {
                format!("{kind} contract is not configured for this network")
            }
            Self::NetworkOrDecode(_) => "Network error. Check your connection.".into(),
            Self::TransactionTimeout { .. } => {
                "Transaction is taking longer than expected. Check the explorer for its status."
                    .into()
            }
            other => other.to_string(),
        }
    }
}

impl From<RpcError> for ChainError {
    fn from(e: RpcError) -> Self {
        ChainError::NetworkOrDecode(e.to_string())
    }
}

impl From<XdrError> for ChainError {
    fn from(e: XdrError) -> Self {
        ChainError::NetworkOrDecode(e.to_string())
    }
}

impl From<WalletError> for ChainError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::NotConnected => ChainError::WalletNotConnected,
            WalletError::MalformedResponse(_) => ChainError::TransactionFormatError,
            other => translate_invoke_error(&other.to_string()),
        }
    }
}

/// Map a raw failure message from signing or submission onto the canonical
/// errors. Unrecognised messages pass through unchanged.
pub fn translate_invoke_error(message: &str) -> ChainError {
    let lower = message.to_lowercase();
    if lower.contains("insufficient") {
        ChainError::InsufficientBalance
    } else if lower.contains("user declined") || lower.contains("user rejected") {
        ChainError::UserDeclinedSigning
    } else if lower.contains("switch") {
        ChainError::TransactionFormatError
    } else {
        ChainError::Submission(message.to_string())
    }
}
