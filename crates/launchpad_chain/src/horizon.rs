//! Horizon REST client for account balances.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rpc::RpcError;

/// One entry of an account's `balances` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonBalance {
    /// Decimal text with seven fractional digits, e.g. `"9999.9999900"`.
    pub balance: String,
    pub asset_type: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
}

impl HorizonBalance {
    pub fn is_native(&self) -> bool {
        self.asset_type == "native"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountBalances {
    pub account_id: String,
    pub balances: Vec<HorizonBalance>,
}

/// Read access to classic ledger accounts.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn load_account(&self, account: &str) -> Result<AccountBalances, RpcError>;
}

pub struct HorizonClient {
    client: Client,
    base_url: String,
}

impl HorizonClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn load_account(&self, account: &str) -> Result<AccountBalances, RpcError> {
        let url = format!("{}/accounts/{}", self.base_url, account);
        debug!(url = %url, "Horizon account request");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RpcError::AccountNotFound(account.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }
        resp.json()
            .await
            .map_err(|e| RpcError::Decode(format!("Horizon account: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_json_deserializes() {
        let body = serde_json::json!({
            "id": "GABC",
            "account_id": "GABC",
            "sequence": "123",
            "balances": [
                {
                    "balance": "100.5000000",
                    "limit": "922337203685.4775807",
                    "asset_type": "credit_alphanum4",
                    "asset_code": "DOGE",
                    "asset_issuer": "GISSUER"
                },
                { "balance": "9999.9999900", "asset_type": "native" }
            ]
        });
        let account: AccountBalances = serde_json::from_value(body).unwrap();
        assert_eq!(account.balances.len(), 2);
        assert!(!account.balances[0].is_native());
        assert_eq!(account.balances[0].asset_code.as_deref(), Some("DOGE"));
        assert!(account.balances[1].is_native());
        assert!(account.balances[1].asset_issuer.is_none());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client =
            HorizonClient::new("https://horizon-testnet.stellar.org/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.base_url, "https://horizon-testnet.stellar.org");
    }
}
