use std::sync::Arc;

use tracing::warn;

use crate::amount::{DEFAULT_DECIMALS, to_base_units};
use crate::horizon::{HorizonBalance, LedgerClient};
use crate::models::Balance;

/// Classic account balances from Horizon, in stroops / base units.
pub struct BalanceService {
    ledger: Arc<dyn LedgerClient>,
}

impl BalanceService {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    async fn balances(&self, account: &str) -> Option<Vec<HorizonBalance>> {
        match self.ledger.load_account(account).await {
            Ok(loaded) => Some(loaded.balances),
            Err(e) => {
                warn!(account, error = %e, "failed to load account balances");
                None
            }
        }
    }

    fn parse(entry: &HorizonBalance) -> i128 {
        to_base_units(&entry.balance, DEFAULT_DECIMALS).unwrap_or_else(|e| {
            warn!(balance = %entry.balance, error = %e, "unparseable balance");
            0
        })
    }

    pub async fn xlm_balance(&self, account: &str) -> i128 {
        self.balances(account)
            .await
            .and_then(|balances| balances.iter().find(|b| b.is_native()).map(Self::parse))
            .unwrap_or(0)
    }

    /// Balance of the asset issued by `issuer`, optionally narrowed to
    /// `asset_code` when the issuer has several.
    pub async fn token_balance(&self, account: &str, issuer: &str, asset_code: Option<&str>) -> i128 {
        self.balances(account)
            .await
            .and_then(|balances| {
                balances
                    .iter()
                    .find(|b| {
                        b.asset_code.is_some()
                            && b.asset_issuer.as_deref() == Some(issuer)
                            && asset_code.is_none_or(|code| b.asset_code.as_deref() == Some(code))
                    })
                    .map(Self::parse)
            })
            .unwrap_or(0)
    }

    pub async fn all_balances(&self, account: &str) -> Vec<Balance> {
        let Some(balances) = self.balances(account).await else {
            return Vec::new();
        };
        balances
            .iter()
            .filter_map(|entry| match Balance::from_horizon(entry) {
                Ok(balance) => Some(balance),
                Err(e) => {
                    warn!(balance = %entry.balance, error = %e, "skipping unparseable balance");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeLedger;

    fn entry(balance: &str, code: Option<&str>, issuer: Option<&str>) -> HorizonBalance {
        HorizonBalance {
            balance: balance.into(),
            asset_type: if code.is_some() { "credit_alphanum4" } else { "native" }.into(),
            asset_code: code.map(str::to_string),
            asset_issuer: issuer.map(str::to_string),
        }
    }

    fn service() -> BalanceService {
        let mut ledger = FakeLedger::default();
        ledger.accounts.insert(
            "GUSER".into(),
            vec![
                entry("25.0000000", Some("DOGE"), Some("GISSUER")),
                entry("5.5000000", Some("PEPE"), Some("GISSUER")),
                entry("9999.9999900", None, None),
            ],
        );
        BalanceService::new(Arc::new(ledger))
    }

    #[tokio::test]
    async fn xlm_balance_is_exact() {
        assert_eq!(service().xlm_balance("GUSER").await, 99_999_999_900);
    }

    #[tokio::test]
    async fn token_balance_matches_issuer_and_code() {
        let service = service();
        assert_eq!(service.token_balance("GUSER", "GISSUER", None).await, 250_000_000);
        assert_eq!(
            service.token_balance("GUSER", "GISSUER", Some("PEPE")).await,
            55_000_000
        );
        assert_eq!(service.token_balance("GUSER", "GOTHER", None).await, 0);
    }

    #[tokio::test]
    async fn missing_account_reads_as_empty() {
        let service = service();
        assert_eq!(service.xlm_balance("GNOBODY").await, 0);
        assert!(service.all_balances("GNOBODY").await.is_empty());

        let all = service.all_balances("GUSER").await;
        let assets: Vec<&str> = all.iter().map(|b| b.asset.as_str()).collect();
        assert_eq!(assets, vec!["DOGE", "PEPE", "XLM"]);
    }
}
