use std::sync::Arc;

use tracing::{debug, info};

use super::{actor, i128_or_zero};
use crate::contract::{ContractClient, ContractKind, InvocationReceipt};
use crate::error::ChainError;
use crate::models::{Pool, PoolListing};
use crate::scval::ScVal;

const KIND: ContractKind = ContractKind::Amm;

/// Constant-product pools pairing a launched token with XLM. All amounts are
/// base units; XLM amounts are stroops.
pub struct AmmService {
    client: Arc<ContractClient>,
}

impl AmmService {
    pub fn new(client: Arc<ContractClient>) -> Self {
        Self { client }
    }

    /// Mint a token and seed its pool with `initial_xlm`.
    pub async fn create_pool(
        &self,
        name: &str,
        symbol: &str,
        total_supply: i128,
        initial_xlm: i128,
    ) -> Result<InvocationReceipt, ChainError> {
        let creator = actor(&self.client, KIND)?;

        info!(name, symbol, total_supply = %total_supply, initial_xlm = %initial_xlm, "creating pool");
        let args = vec![
            creator,
            ScVal::string(name),
            ScVal::string(symbol),
            ScVal::I128(total_supply),
            ScVal::I128(initial_xlm),
        ];
        self.client
            .invoke(KIND, "create_pool", args)
            .await?
            .ensure_not_failed()
    }

    pub async fn swap_xlm_for_tokens(
        &self,
        pool_id: u64,
        xlm_amount: i128,
        min_tokens_out: i128,
    ) -> Result<InvocationReceipt, ChainError> {
        self.swap("swap_xlm_for_tokens", pool_id, xlm_amount, min_tokens_out)
            .await
    }

    pub async fn swap_tokens_for_xlm(
        &self,
        pool_id: u64,
        token_amount: i128,
        min_xlm_out: i128,
    ) -> Result<InvocationReceipt, ChainError> {
        self.swap("swap_tokens_for_xlm", pool_id, token_amount, min_xlm_out)
            .await
    }

    async fn swap(
        &self,
        method: &str,
        pool_id: u64,
        amount_in: i128,
        min_out: i128,
    ) -> Result<InvocationReceipt, ChainError> {
        let user = actor(&self.client, KIND)?;

        info!(method, pool_id, amount_in = %amount_in, min_out = %min_out, "swapping");
        let args = vec![user, ScVal::U64(pool_id), ScVal::I128(amount_in), ScVal::I128(min_out)];
        self.client
            .invoke(KIND, method, args)
            .await?
            .ensure_not_failed()
    }

    /// Tokens out for `xlm_amount` in.
    pub async fn quote_swap_xlm_to_tokens(&self, pool_id: u64, xlm_amount: i128) -> i128 {
        self.read_i128(
            "quote_swap_xlm_to_tokens",
            vec![ScVal::U64(pool_id), ScVal::I128(xlm_amount)],
        )
        .await
    }

    /// Stroops out for `token_amount` in.
    pub async fn quote_swap_tokens_to_xlm(&self, pool_id: u64, token_amount: i128) -> i128 {
        self.read_i128(
            "quote_swap_tokens_to_xlm",
            vec![ScVal::U64(pool_id), ScVal::I128(token_amount)],
        )
        .await
    }

    /// Stroops per whole token as reported by the contract.
    pub async fn get_price(&self, pool_id: u64) -> i128 {
        self.read_i128("get_price", vec![ScVal::U64(pool_id)]).await
    }

    pub async fn get_market_cap(&self, pool_id: u64) -> i128 {
        self.read_i128("get_market_cap", vec![ScVal::U64(pool_id)])
            .await
    }

    pub async fn get_pool(&self, pool_id: u64) -> Option<Pool> {
        let value = self
            .client
            .simulate(KIND, "get_pool", vec![ScVal::U64(pool_id)])
            .await?;
        Pool::from_scval(&value, pool_id)
    }

    pub async fn get_pool_count(&self) -> u64 {
        self.client
            .simulate(KIND, "get_pool_count", vec![])
            .await
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    /// Every pool with its price and market cap, ascending by id.
    pub async fn get_all_pools(&self) -> Vec<PoolListing> {
        let count = self.get_pool_count().await;
        let mut pools = Vec::new();
        for pool_id in 1..=count {
            let Some(pool) = self.get_pool(pool_id).await else {
                debug!(pool_id, "pool not readable, skipping");
                continue;
            };
            let price = self.get_price(pool_id).await;
            let market_cap = self.get_market_cap(pool_id).await;
            pools.push(PoolListing {
                pool,
                price,
                market_cap,
            });
        }
        pools
    }

    async fn read_i128(&self, method: &str, args: Vec<ScVal>) -> i128 {
        i128_or_zero(self.client.simulate(KIND, method, args).await)
    }
}
