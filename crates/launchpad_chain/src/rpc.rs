//! Soroban JSON-RPC client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::strkey::AccountId;
use crate::xdr::{XdrError, XdrReader, XdrWriter, from_base64, to_base64};

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("RPC HTTP error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("failed to decode RPC response: {0}")]
    Decode(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        RpcError::Http(e.to_string())
    }
}

impl From<XdrError> for RpcError {
    fn from(e: XdrError) -> Self {
        RpcError::Decode(e.to_string())
    }
}

/// Ledger state of a source account needed to build a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub account_id: AccountId,
    pub sequence: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    Pending,
    Duplicate,
    TryAgainLater,
    Error,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    pub status: SendStatus,
    pub hash: String,
    #[serde(default)]
    pub error_result_xdr: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionResponse {
    pub status: TransactionStatus,
    #[serde(default)]
    pub ledger: Option<u32>,
}

/// The Soroban RPC methods the contract adapter relies on.
#[async_trait]
pub trait SorobanRpc: Send + Sync {
    async fn get_account(&self, account: &AccountId) -> Result<AccountSnapshot, RpcError>;

    /// Raw `simulateTransaction` result; decoding is left to the caller since
    /// the return value's location varies.
    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<Value, RpcError>;

    async fn send_transaction(
        &self,
        envelope_xdr: &str,
    ) -> Result<SendTransactionResponse, RpcError>;

    async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse, RpcError>;
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 over HTTP.
pub struct HttpSorobanRpc {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpSorobanRpc {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(url = %self.url, method, id, "Soroban RPC request");

        let resp = self.client.post(&self.url).json(&payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(RpcError::JsonRpc {
                code: err.code,
                message: err.message,
            });
        }
        body.result
            .ok_or_else(|| RpcError::Decode(format!("{method} response contained no result")))
    }

    async fn call_typed<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(|e| RpcError::Decode(format!("{method}: {e}")))
    }
}

#[async_trait]
impl SorobanRpc for HttpSorobanRpc {
    async fn get_account(&self, account: &AccountId) -> Result<AccountSnapshot, RpcError> {
        let key = to_base64(&account_ledger_key(account));
        let result = self
            .call("getLedgerEntries", json!({ "keys": [key] }))
            .await?;
        let entry = result
            .get("entries")
            .and_then(|e| e.get(0))
            .and_then(|e| e.get("xdr"))
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::AccountNotFound(account.to_string()))?;
        let sequence = account_sequence_from_entry(&from_base64(entry)?)?;
        Ok(AccountSnapshot {
            account_id: *account,
            sequence,
        })
    }

    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<Value, RpcError> {
        self.call("simulateTransaction", json!({ "transaction": envelope_xdr }))
            .await
    }

    async fn send_transaction(
        &self,
        envelope_xdr: &str,
    ) -> Result<SendTransactionResponse, RpcError> {
        self.call_typed("sendTransaction", json!({ "transaction": envelope_xdr }))
            .await
    }

    async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse, RpcError> {
        self.call_typed("getTransaction", json!({ "hash": hash }))
            .await
    }
}

const LEDGER_ENTRY_ACCOUNT: i32 = 0;

/// `LedgerKey::Account` for `account`.
pub fn account_ledger_key(account: &AccountId) -> Vec<u8> {
    let mut w = XdrWriter::new();
    w.i32(LEDGER_ENTRY_ACCOUNT).i32(0).fixed(account.as_bytes());
    w.into_bytes()
}

/// Read `seqNum` out of an `AccountEntry` ledger entry.
pub fn account_sequence_from_entry(entry: &[u8]) -> Result<i64, XdrError> {
    let mut r = XdrReader::new(entry);
    match r.i32()? {
        LEDGER_ENTRY_ACCOUNT => {}
        value => return Err(XdrError::Discriminant { what: "LedgerEntryType", value }),
    }
    match r.i32()? {
        0 => {}
        value => return Err(XdrError::Discriminant { what: "PublicKey", value }),
    }
    r.fixed32()?;
    r.i64()?; // balance
    r.i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_key_layout() {
        let key = account_ledger_key(&AccountId([5u8; 32]));
        assert_eq!(key.len(), 40);
        assert_eq!(&key[..8], &[0u8; 8]);
        assert_eq!(&key[8..], &[5u8; 32]);
    }

    #[test]
    fn sequence_read_from_account_entry() {
        let mut w = XdrWriter::new();
        w.i32(0).i32(0).fixed(&[5u8; 32]).i64(99_000_000).i64(123_456_789);
        // Remaining AccountEntry fields are ignored.
        w.u32(0).u32(0);
        assert_eq!(account_sequence_from_entry(&w.into_bytes()).unwrap(), 123_456_789);

        let mut w = XdrWriter::new();
        w.i32(6);
        assert!(account_sequence_from_entry(&w.into_bytes()).is_err());
    }

    #[test]
    fn send_response_deserializes() {
        let resp: SendTransactionResponse = serde_json::from_value(json!({
            "status": "TRY_AGAIN_LATER",
            "hash": "abc",
            "latestLedger": 10,
        }))
        .unwrap();
        assert_eq!(resp.status, SendStatus::TryAgainLater);
        assert!(resp.error_result_xdr.is_none());

        let resp: GetTransactionResponse =
            serde_json::from_value(json!({ "status": "NOT_FOUND" })).unwrap();
        assert_eq!(resp.status, TransactionStatus::NotFound);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_http_error() {
        let rpc = HttpSorobanRpc::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = rpc.simulate_transaction("AAAA").await.unwrap_err();
        assert!(matches!(err, RpcError::Http(_)));
    }
}
