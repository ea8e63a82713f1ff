use std::sync::Arc;

use tracing::{info, warn};

use super::{actor, address_arg};
use crate::contract::{ContractClient, ContractKind, InvocationReceipt};
use crate::error::ChainError;
use crate::models::Order;
use crate::scval::ScVal;

const KIND: ContractKind = ContractKind::Dex;

/// Peer-to-peer order book. Amounts and prices are in base units.
pub struct DexService {
    client: Arc<ContractClient>,
}

impl DexService {
    pub fn new(client: Arc<ContractClient>) -> Self {
        Self { client }
    }

    pub async fn create_sell_order(
        &self,
        token_contract: &str,
        amount: i128,
        price_per_token: i128,
    ) -> Result<InvocationReceipt, ChainError> {
        let seller = actor(&self.client, KIND)?;
        let token = address_arg(token_contract)?;

        info!(token_contract, amount = %amount, price = %price_per_token, "creating sell order");
        let args = vec![seller, token, ScVal::I128(amount), ScVal::I128(price_per_token)];
        self.client
            .invoke(KIND, "create_sell_order", args)
            .await?
            .ensure_not_failed()
    }

    pub async fn buy_tokens(
        &self,
        order_id: u64,
        amount: i128,
    ) -> Result<InvocationReceipt, ChainError> {
        let buyer = actor(&self.client, KIND)?;

        info!(order_id, amount = %amount, "buying from order");
        let args = vec![buyer, ScVal::U64(order_id), ScVal::I128(amount)];
        self.client
            .invoke(KIND, "buy_tokens", args)
            .await?
            .ensure_not_failed()
    }

    pub async fn cancel_order(&self, order_id: u64) -> Result<InvocationReceipt, ChainError> {
        let seller = actor(&self.client, KIND)?;

        info!(order_id, "cancelling order");
        self.client
            .invoke(KIND, "cancel_order", vec![seller, ScVal::U64(order_id)])
            .await?
            .ensure_not_failed()
    }

    /// Every order listed for `token_contract`, active or not.
    pub async fn get_token_orders(&self, token_contract: &str) -> Vec<Order> {
        self.list_orders("get_token_orders", token_contract).await
    }

    pub async fn get_user_orders(&self, user: &str) -> Vec<Order> {
        self.list_orders("get_user_orders", user).await
    }

    /// Orders for `token_contract` that can still be filled.
    pub async fn active_order_book(&self, token_contract: &str) -> Vec<Order> {
        let mut orders = self.get_token_orders(token_contract).await;
        orders.retain(|o| o.is_active);
        orders
    }

    async fn list_orders(&self, method: &str, address: &str) -> Vec<Order> {
        let arg = match address_arg(address) {
            Ok(arg) => arg,
            Err(e) => {
                warn!(method, address, error = %e, "cannot list orders");
                return Vec::new();
            }
        };
        self.client
            .simulate(KIND, method, vec![arg])
            .await
            .map(|value| Order::list_from_scval(&value))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FinalityMode;
    use crate::strkey::{AccountId, ContractId};
    use crate::testing::{FakeRpc, FakeWallet, test_config};
    use crate::wallet::WalletSession;

    fn order(id: u64, active: bool) -> ScVal {
        ScVal::Map(vec![
            (ScVal::symbol("amount"), ScVal::I128(1_000)),
            (ScVal::symbol("is_active"), ScVal::Bool(active)),
            (ScVal::symbol("order_id"), ScVal::U64(id)),
            (ScVal::symbol("price_per_token"), ScVal::I128(12_340_000)),
        ])
    }

    fn service(rpc: Arc<FakeRpc>) -> DexService {
        let client = ContractClient::new(&test_config(), rpc).with_finality(FinalityMode::Submit);
        client.set_session(WalletSession::connected(
            AccountId([1u8; 32]),
            Arc::new(FakeWallet::signing()),
        ));
        DexService::new(Arc::new(client))
    }

    #[tokio::test]
    async fn active_order_book_drops_inactive_orders() {
        let rpc = Arc::new(FakeRpc::new(|method, _| match method {
            "get_token_orders" => Some(ScVal::Vec(vec![
                order(1, true),
                order(2, false),
                order(3, true),
            ])),
            _ => None,
        }));
        let service = service(rpc.clone());
        let token = ContractId([7u8; 32]).to_string();

        assert_eq!(service.get_token_orders(&token).await.len(), 3);
        let active: Vec<u64> = service
            .active_order_book(&token)
            .await
            .iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(active, vec![1, 3]);
    }

    #[tokio::test]
    async fn order_reads_degrade_to_empty() {
        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::U32(0))));
        let service = service(rpc.clone());
        let user = AccountId([2u8; 32]).to_string();

        assert!(service.get_user_orders(&user).await.is_empty());
        assert!(service.get_user_orders("bogus").await.is_empty());
        assert_eq!(rpc.simulated_methods(), vec!["get_user_orders"]);
    }

    #[tokio::test]
    async fn writes_put_the_actor_first() {
        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::Void)));
        let service = service(rpc.clone());
        let token = ContractId([7u8; 32]);

        service
            .create_sell_order(&token.to_string(), 500, 12_340_000)
            .await
            .unwrap();
        service.buy_tokens(4, 250).await.unwrap();
        service.cancel_order(4).await.unwrap();

        let actor = ScVal::address(AccountId([1u8; 32]));
        let calls = rpc.simulated();
        assert_eq!(
            calls[0].1,
            vec![actor.clone(), ScVal::address(token), ScVal::I128(500), ScVal::I128(12_340_000)]
        );
        assert_eq!(calls[1].1, vec![actor.clone(), ScVal::U64(4), ScVal::I128(250)]);
        assert_eq!(calls[2].1, vec![actor, ScVal::U64(4)]);
        assert_eq!(rpc.sent().len(), 3);
    }

    #[tokio::test]
    async fn bad_token_address_is_a_validation_error() {
        let rpc = Arc::new(FakeRpc::new(|_, _| None));
        let service = service(rpc.clone());
        let err = service.create_sell_order("CBAD", 1, 1).await.unwrap_err();
        assert!(matches!(err, ChainError::Validation(_)));
        assert_eq!(rpc.account_lookups(), 0);
    }

    #[tokio::test]
    async fn unconfigured_dex_rejects_writes_without_io() {
        let rpc = Arc::new(FakeRpc::new(|_, _| None));
        let mut config = test_config();
        config.contracts.dex = None;
        let client = ContractClient::new(&config, rpc.clone());
        let service = DexService::new(Arc::new(client));

        let err = service.cancel_order(1).await.unwrap_err();
        assert!(matches!(err, ChainError::ContractNotConfigured(ContractKind::Dex)));
        assert_eq!(rpc.account_lookups(), 0);
    }
}
