use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::{actor, address_arg};
use crate::amount::to_base_units_f64;
use crate::contract::{ContractClient, ContractKind, InvocationReceipt};
use crate::error::ChainError;
use crate::models::Token;
use crate::scval::ScVal;
use crate::validation::ValidationError;

const KIND: ContractKind = ContractKind::TokenFactory;

pub struct TokenFactoryService {
    client: Arc<ContractClient>,
}

impl TokenFactoryService {
    pub fn new(client: Arc<ContractClient>) -> Self {
        Self { client }
    }

    /// Deploy a token. `initial_supply` is in display units and is floored
    /// to base units at `decimals`.
    pub async fn create_token(
        &self,
        name: &str,
        symbol: &str,
        decimals: u32,
        initial_supply: f64,
    ) -> Result<InvocationReceipt, ChainError> {
        let creator = actor(&self.client, KIND)?;
        let supply = to_base_units_f64(initial_supply, decimals)
            .map_err(|e| ValidationError::new(format!("Invalid initial supply: {e}")))?;

        info!(name, symbol, decimals, supply = %supply, "creating token");
        let args = vec![
            creator,
            ScVal::string(name),
            ScVal::string(symbol),
            ScVal::U32(decimals),
            ScVal::I128(supply),
        ];
        self.client
            .invoke(KIND, "create_token", args)
            .await?
            .ensure_not_failed()
    }

    /// Number of tokens deployed; `0` when the contract cannot be read.
    pub async fn get_token_count(&self) -> u32 {
        self.client
            .simulate(KIND, "get_token_count", vec![])
            .await
            .and_then(|v| v.as_u32())
            .unwrap_or(0)
    }

    pub async fn get_token_info(&self, token_id: u32) -> Option<Token> {
        let value = self
            .client
            .simulate(KIND, "get_token_info", vec![ScVal::U32(token_id)])
            .await?;
        let token = Token::from_scval(&value, token_id);
        if token.is_none() {
            debug!(token_id, "token info is not a struct");
        }
        token
    }

    /// Every token, ascending by id. Info reads run concurrently; ids that
    /// fail to load are skipped.
    pub async fn get_all_tokens(&self) -> Vec<Token> {
        let count = self.get_token_count().await;
        if count == 0 {
            return Vec::new();
        }

        let tokens: Vec<Token> = join_all((1..=count).map(|id| self.get_token_info(id)))
            .await
            .into_iter()
            .flatten()
            .collect();
        if tokens.len() < count as usize {
            warn!(loaded = tokens.len(), count, "some tokens failed to load");
        }
        tokens
    }

    /// Tokens deployed by `creator`, in the order the contract lists them.
    pub async fn get_creator_tokens(&self, creator: &str) -> Vec<Token> {
        let arg = match address_arg(creator) {
            Ok(arg) => arg,
            Err(e) => {
                warn!(creator, error = %e, "cannot look up creator tokens");
                return Vec::new();
            }
        };
        let Some(ids) = self.client.simulate(KIND, "get_creator_tokens", vec![arg]).await else {
            return Vec::new();
        };
        let ids: Vec<u32> = ids
            .as_vec()
            .map(|items| items.iter().filter_map(ScVal::as_u32).collect())
            .unwrap_or_default();

        let mut tokens = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(token) = self.get_token_info(id).await {
                tokens.push(token);
            }
        }
        tokens
    }
}
