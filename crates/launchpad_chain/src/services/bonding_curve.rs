use std::sync::Arc;

use tracing::{debug, info};

use super::{actor, i128_or_zero};
use crate::contract::{ContractClient, ContractKind, InvocationReceipt};
use crate::error::ChainError;
use crate::models::{BondingListing, BondingToken};
use crate::scval::ScVal;

const KIND: ContractKind = ContractKind::BondingCurve;

/// Tokens sold along a virtual-reserve curve until they graduate.
pub struct BondingCurveService {
    client: Arc<ContractClient>,
}

impl BondingCurveService {
    pub fn new(client: Arc<ContractClient>) -> Self {
        Self { client }
    }

    pub async fn create_token(
        &self,
        name: &str,
        symbol: &str,
        total_supply: i128,
    ) -> Result<InvocationReceipt, ChainError> {
        let creator = actor(&self.client, KIND)?;

        info!(name, symbol, total_supply = %total_supply, "launching curve token");
        let args = vec![
            creator,
            ScVal::string(name),
            ScVal::string(symbol),
            ScVal::I128(total_supply),
        ];
        self.client
            .invoke(KIND, "create_token", args)
            .await?
            .ensure_not_failed()
    }

    /// Spend `xlm_amount` stroops on `token_id`.
    pub async fn buy(&self, token_id: u64, xlm_amount: i128) -> Result<InvocationReceipt, ChainError> {
        self.trade("buy", token_id, xlm_amount).await
    }

    /// Sell `token_amount` base units of `token_id` back to the curve.
    pub async fn sell(
        &self,
        token_id: u64,
        token_amount: i128,
    ) -> Result<InvocationReceipt, ChainError> {
        self.trade("sell", token_id, token_amount).await
    }

    async fn trade(
        &self,
        method: &str,
        token_id: u64,
        amount: i128,
    ) -> Result<InvocationReceipt, ChainError> {
        let trader = actor(&self.client, KIND)?;

        info!(method, token_id, amount = %amount, "curve trade");
        self.client
            .invoke(KIND, method, vec![trader, ScVal::U64(token_id), ScVal::I128(amount)])
            .await?
            .ensure_not_failed()
    }

    /// Tokens received for `xlm_amount` stroops.
    pub async fn calculate_buy(&self, token_id: u64, xlm_amount: i128) -> i128 {
        self.read_i128("calculate_buy", vec![ScVal::U64(token_id), ScVal::I128(xlm_amount)])
            .await
    }

    /// Stroops received for `token_amount`.
    pub async fn calculate_sell(&self, token_id: u64, token_amount: i128) -> i128 {
        self.read_i128("calculate_sell", vec![ScVal::U64(token_id), ScVal::I128(token_amount)])
            .await
    }

    pub async fn get_price(&self, token_id: u64) -> i128 {
        self.read_i128("get_price", vec![ScVal::U64(token_id)]).await
    }

    pub async fn get_market_cap(&self, token_id: u64) -> i128 {
        self.read_i128("get_market_cap", vec![ScVal::U64(token_id)])
            .await
    }

    pub async fn get_token_info(&self, token_id: u64) -> Option<BondingToken> {
        let value = self
            .client
            .simulate(KIND, "get_token_info", vec![ScVal::U64(token_id)])
            .await?;
        BondingToken::from_scval(&value, token_id)
    }

    pub async fn get_token_count(&self) -> u64 {
        self.client
            .simulate(KIND, "get_token_count", vec![])
            .await
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    /// Every curve token with its price and market cap, ascending by id.
    pub async fn get_all_tokens(&self) -> Vec<BondingListing> {
        let count = self.get_token_count().await;
        let mut tokens = Vec::new();
        for token_id in 1..=count {
            let Some(token) = self.get_token_info(token_id).await else {
                debug!(token_id, "curve token not readable, skipping");
                continue;
            };
            let price = self.get_price(token_id).await;
            let market_cap = self.get_market_cap(token_id).await;
            tokens.push(BondingListing {
                token,
                price,
                market_cap,
            });
        }
        tokens
    }

    async fn read_i128(&self, method: &str, args: Vec<ScVal>) -> i128 {
        i128_or_zero(self.client.simulate(KIND, method, args).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FinalityMode;
    use crate::strkey::AccountId;
    use crate::testing::{FakeRpc, FakeWallet, test_config};
    use crate::wallet::WalletSession;

    fn service(rpc: Arc<FakeRpc>) -> BondingCurveService {
        let client = ContractClient::new(&test_config(), rpc).with_finality(FinalityMode::Submit);
        client.set_session(WalletSession::connected(
            AccountId([3u8; 32]),
            Arc::new(FakeWallet::signing()),
        ));
        BondingCurveService::new(Arc::new(client))
    }

    #[tokio::test]
    async fn all_tokens_skips_unreadable_ids() {
        let rpc = Arc::new(FakeRpc::new(|method, args| {
            let id = args.first().and_then(ScVal::as_u64);
            match (method, id) {
                ("get_token_count", _) => Some(ScVal::U64(3)),
                ("get_token_info", Some(2)) => None,
                ("get_token_info", Some(id)) => Some(ScVal::Map(vec![
                    (ScVal::symbol("name"), ScVal::string("Curve")),
                    (ScVal::symbol("token_id"), ScVal::U64(id)),
                    (ScVal::symbol("virtual_xlm_reserve"), ScVal::I128(30_000_000_000)),
                ])),
                ("get_price", Some(_)) => Some(ScVal::I128(28)),
                _ => None,
            }
        }));
        let service = service(rpc.clone());

        let tokens = service.get_all_tokens().await;
        let ids: Vec<u64> = tokens.iter().map(|t| t.token.token_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(tokens[0].price, 28);
        assert_eq!(tokens[0].market_cap, 0);
        assert_eq!(tokens[1].token.virtual_xlm_reserve, 30_000_000_000);
    }

    #[tokio::test]
    async fn buy_and_sell_encode_trader_first() {
        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::Void)));
        let service = service(rpc.clone());

        service.buy(1, 50_000_000).await.unwrap();
        service.sell(1, 1_000).await.unwrap();

        let trader = ScVal::address(AccountId([3u8; 32]));
        let calls = rpc.simulated();
        assert_eq!(calls[0].0, "buy");
        assert_eq!(calls[0].1, vec![trader.clone(), ScVal::U64(1), ScVal::I128(50_000_000)]);
        assert_eq!(calls[1].0, "sell");
        assert_eq!(calls[1].1, vec![trader, ScVal::U64(1), ScVal::I128(1_000)]);
    }

    #[tokio::test]
    async fn calculations_pass_id_and_amount() {
        let rpc = Arc::new(FakeRpc::new(|method, args| match method {
            "calculate_buy" => args.get(1).and_then(ScVal::as_i128).map(|x| ScVal::I128(x * 2)),
            _ => None,
        }));
        let service = service(rpc.clone());
        assert_eq!(service.calculate_buy(1, 10).await, 20);
        assert_eq!(service.calculate_sell(1, 10).await, 0);
    }
}
