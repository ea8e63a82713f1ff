//! Domain records decoded from contract return values.
//!
//! Contract structs arrive as symbol-keyed maps. Field names have drifted
//! between contract and client versions, so decoders accept the known
//! alternates and fall back to defaults rather than rejecting a record.

use serde::{Deserialize, Serialize};

use crate::amount::{AmountError, DEFAULT_DECIMALS, from_base_units, to_base_units};
use crate::horizon::HorizonBalance;
use crate::scval::ScVal;

const UNKNOWN_NAME: &str = "Unknown Token";
const UNKNOWN_SYMBOL: &str = "???";

fn text(value: &ScVal, names: &[&str]) -> Option<String> {
    let field = value.field_any(names)?;
    match field {
        ScVal::Address(a) => Some(a.to_string()),
        other => other.as_str().map(str::to_string),
    }
    .filter(|s| !s.is_empty())
}

fn int(value: &ScVal, names: &[&str]) -> Option<i128> {
    value.field_any(names).and_then(ScVal::as_i128)
}

fn uint(value: &ScVal, names: &[&str]) -> Option<u64> {
    value.field_any(names).and_then(ScVal::as_u64)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_id: u32,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub total_supply: i128,
    pub creator: String,
    pub contract_address: String,
    pub created_at: u64,
}

impl Token {
    /// Normalize a `TokenInfo` struct. `requested_id` stands in for a missing
    /// `token_id`. Anything that is not a struct yields `None`.
    pub fn from_scval(value: &ScVal, requested_id: u32) -> Option<Self> {
        if !matches!(value, ScVal::Map(_)) {
            return None;
        }
        Some(Self {
            token_id: value
                .field("token_id")
                .and_then(ScVal::as_u32)
                .filter(|id| *id != 0)
                .unwrap_or(requested_id),
            name: text(value, &["name"]).unwrap_or_else(|| UNKNOWN_NAME.into()),
            symbol: text(value, &["symbol"]).unwrap_or_else(|| UNKNOWN_SYMBOL.into()),
            decimals: value
                .field("decimals")
                .and_then(ScVal::as_u32)
                .unwrap_or(DEFAULT_DECIMALS),
            total_supply: int(value, &["total_supply", "totalSupply"]).unwrap_or(0),
            creator: text(value, &["creator"]).unwrap_or_default(),
            contract_address: text(value, &["contract_address", "contractAddress"])
                .unwrap_or_default(),
            created_at: uint(value, &["created_at", "createdAt"]).unwrap_or(0),
        })
    }

    /// `total_supply / 10^decimals`
    pub fn display_supply(&self) -> f64 {
        from_base_units(self.total_supply, self.decimals)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    pub seller: String,
    pub token_contract: String,
    pub amount: i128,
    pub price_per_token: i128,
    pub created_at: u64,
    pub is_active: bool,
}

impl Order {
    /// Normalize an order struct. `token_address`/`price` and an `OrderStatus`
    /// enum are accepted as alternates for `token_contract`/`price_per_token`
    /// and `is_active`.
    pub fn from_scval(value: &ScVal) -> Option<Self> {
        if !matches!(value, ScVal::Map(_)) {
            return None;
        }
        let is_active = match value.field("is_active").and_then(ScVal::as_bool) {
            Some(active) => active,
            None => value
                .field("status")
                .and_then(ScVal::enum_variant)
                .is_none_or(|status| status == "Open"),
        };
        Some(Self {
            order_id: uint(value, &["order_id"]).unwrap_or(0),
            seller: text(value, &["seller"]).unwrap_or_default(),
            token_contract: text(value, &["token_contract", "token_address"]).unwrap_or_default(),
            amount: int(value, &["amount"]).unwrap_or(0),
            price_per_token: int(value, &["price_per_token", "price"]).unwrap_or(0),
            created_at: uint(value, &["created_at"]).unwrap_or(0),
            is_active,
        })
    }

    /// Decode a `Vec<Order>`; anything else is an empty list.
    pub fn list_from_scval(value: &ScVal) -> Vec<Self> {
        value
            .as_vec()
            .map(|items| items.iter().filter_map(Order::from_scval).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub pool_id: u64,
    pub token_name: String,
    pub token_symbol: String,
    pub token_reserve: i128,
    pub xlm_reserve: i128,
    pub total_supply: i128,
    pub creator: String,
    pub created_at: u64,
    pub lp_tokens: i128,
}

impl Pool {
    pub fn from_scval(value: &ScVal, requested_id: u64) -> Option<Self> {
        if !matches!(value, ScVal::Map(_)) {
            return None;
        }
        Some(Self {
            pool_id: uint(value, &["pool_id"])
                .filter(|id| *id != 0)
                .unwrap_or(requested_id),
            token_name: text(value, &["token_name", "name"]).unwrap_or_default(),
            token_symbol: text(value, &["token_symbol", "symbol"]).unwrap_or_default(),
            token_reserve: int(value, &["token_reserve"]).unwrap_or(0),
            xlm_reserve: int(value, &["xlm_reserve"]).unwrap_or(0),
            total_supply: int(value, &["total_supply"]).unwrap_or(0),
            creator: text(value, &["creator"]).unwrap_or_default(),
            created_at: uint(value, &["created_at"]).unwrap_or(0),
            lp_tokens: int(value, &["lp_tokens"]).unwrap_or(0),
        })
    }

    /// XLM per token, `xlm_reserve / token_reserve`. `None` for an empty pool.
    pub fn price(&self) -> Option<f64> {
        if self.token_reserve == 0 {
            return None;
        }
        Some(self.xlm_reserve as f64 / self.token_reserve as f64)
    }
}

/// A pool with the price and market cap reported by the AMM contract, both in
/// stroops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolListing {
    #[serde(flatten)]
    pub pool: Pool,
    pub price: i128,
    pub market_cap: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondingToken {
    pub token_id: u64,
    pub name: String,
    pub symbol: String,
    pub total_supply: i128,
    pub current_supply: i128,
    pub virtual_xlm_reserve: i128,
    pub virtual_token_reserve: i128,
    pub creator: String,
    pub created_at: u64,
}

impl BondingToken {
    pub fn from_scval(value: &ScVal, requested_id: u64) -> Option<Self> {
        if !matches!(value, ScVal::Map(_)) {
            return None;
        }
        Some(Self {
            token_id: uint(value, &["token_id"])
                .filter(|id| *id != 0)
                .unwrap_or(requested_id),
            name: text(value, &["name"]).unwrap_or_else(|| UNKNOWN_NAME.into()),
            symbol: text(value, &["symbol"]).unwrap_or_else(|| UNKNOWN_SYMBOL.into()),
            total_supply: int(value, &["total_supply"]).unwrap_or(0),
            current_supply: int(value, &["current_supply"]).unwrap_or(0),
            virtual_xlm_reserve: int(value, &["virtual_xlm_reserve"]).unwrap_or(0),
            virtual_token_reserve: int(value, &["virtual_token_reserve"]).unwrap_or(0),
            creator: text(value, &["creator"]).unwrap_or_default(),
            created_at: uint(value, &["created_at"]).unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondingListing {
    #[serde(flatten)]
    pub token: BondingToken,
    pub price: i128,
    pub market_cap: i128,
}

/// An account balance in base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// `"XLM"` for the native asset, otherwise the asset code.
    pub asset: String,
    pub balance: i128,
    pub issuer: Option<String>,
}

impl Balance {
    pub fn from_horizon(entry: &HorizonBalance) -> Result<Self, AmountError> {
        let asset = if entry.is_native() {
            "XLM".to_string()
        } else {
            entry.asset_code.clone().unwrap_or_default()
        };
        Ok(Self {
            asset,
            balance: to_base_units(&entry.balance, DEFAULT_DECIMALS)?,
            issuer: entry.asset_issuer.clone(),
        })
    }

    pub fn display(&self) -> f64 {
        from_base_units(self.balance, DEFAULT_DECIMALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strkey::{AccountId, ContractId};

    fn map(entries: Vec<(&str, ScVal)>) -> ScVal {
        ScVal::Map(entries.into_iter().map(|(k, v)| (ScVal::symbol(k), v)).collect())
    }

    #[test]
    fn token_from_contract_struct() {
        let creator = AccountId([4u8; 32]);
        let contract = ContractId([5u8; 32]);
        let value = map(vec![
            ("contract_address", ScVal::address(contract)),
            ("created_at", ScVal::U64(1_700_000_000)),
            ("creator", ScVal::address(creator)),
            ("decimals", ScVal::U32(7)),
            ("name", ScVal::string("Doge Coin")),
            ("symbol", ScVal::string("DOGE")),
            ("token_id", ScVal::U32(2)),
            ("total_supply", ScVal::I128(10_000_000_000_000)),
        ]);
        let token = Token::from_scval(&value, 2).unwrap();
        assert_eq!(token.name, "Doge Coin");
        assert_eq!(token.creator, creator.to_string());
        assert_eq!(token.contract_address, contract.to_string());
        assert_eq!(token.display_supply(), 1_000_000.0);
    }

    #[test]
    fn token_defaults_and_alternate_names() {
        let value = map(vec![
            ("name", ScVal::string("")),
            ("totalSupply", ScVal::I128(5)),
            ("createdAt", ScVal::U64(9)),
        ]);
        let token = Token::from_scval(&value, 4).unwrap();
        assert_eq!(token.token_id, 4);
        assert_eq!(token.name, "Unknown Token");
        assert_eq!(token.symbol, "???");
        assert_eq!(token.decimals, 7);
        assert_eq!(token.total_supply, 5);
        assert_eq!(token.created_at, 9);
        assert_eq!(token.creator, "");

        assert!(Token::from_scval(&ScVal::Void, 1).is_none());
    }

    #[test]
    fn order_accepts_both_field_styles() {
        let client_style = map(vec![
            ("order_id", ScVal::U64(1)),
            ("token_contract", ScVal::string("CTOKEN")),
            ("price_per_token", ScVal::I128(12_340_000)),
            ("amount", ScVal::I128(50)),
            ("is_active", ScVal::Bool(false)),
        ]);
        let order = Order::from_scval(&client_style).unwrap();
        assert_eq!(order.token_contract, "CTOKEN");
        assert_eq!(order.price_per_token, 12_340_000);
        assert!(!order.is_active);

        let contract_style = map(vec![
            ("order_id", ScVal::U64(2)),
            ("token_address", ScVal::address(ContractId([6u8; 32]))),
            ("price", ScVal::I128(7)),
            ("status", ScVal::Vec(vec![ScVal::symbol("Cancelled")])),
        ]);
        let order = Order::from_scval(&contract_style).unwrap();
        assert_eq!(order.token_contract, ContractId([6u8; 32]).to_string());
        assert_eq!(order.price_per_token, 7);
        assert!(!order.is_active);

        // No flag and no status: active.
        let bare = map(vec![("order_id", ScVal::U64(3))]);
        assert!(Order::from_scval(&bare).unwrap().is_active);

        let open = map(vec![("status", ScVal::Vec(vec![ScVal::symbol("Open")]))]);
        assert!(Order::from_scval(&open).unwrap().is_active);
    }

    #[test]
    fn order_list_skips_non_structs() {
        let list = ScVal::Vec(vec![map(vec![("order_id", ScVal::U64(1))]), ScVal::Void]);
        assert_eq!(Order::list_from_scval(&list).len(), 1);
        assert!(Order::list_from_scval(&ScVal::U32(1)).is_empty());
    }

    #[test]
    fn pool_price() {
        let pool = Pool::from_scval(
            &map(vec![
                ("token_reserve", ScVal::I128(1_000)),
                ("xlm_reserve", ScVal::I128(250)),
                ("token_name", ScVal::string("Pool Token")),
            ]),
            3,
        )
        .unwrap();
        assert_eq!(pool.pool_id, 3);
        assert_eq!(pool.price(), Some(0.25));

        let empty = Pool::from_scval(&map(vec![]), 1).unwrap();
        assert_eq!(empty.price(), None);
    }

    #[test]
    fn balance_parses_exactly() {
        let native = HorizonBalance {
            balance: "9999.9999900".into(),
            asset_type: "native".into(),
            asset_code: None,
            asset_issuer: None,
        };
        let balance = Balance::from_horizon(&native).unwrap();
        assert_eq!(balance.asset, "XLM");
        assert_eq!(balance.balance, 99_999_999_900);

        let credit = HorizonBalance {
            balance: "1.5000000".into(),
            asset_type: "credit_alphanum4".into(),
            asset_code: Some("DOGE".into()),
            asset_issuer: Some("GISSUER".into()),
        };
        let balance = Balance::from_horizon(&credit).unwrap();
        assert_eq!(balance.asset, "DOGE");
        assert_eq!(balance.issuer.as_deref(), Some("GISSUER"));
        assert_eq!(balance.display(), 1.5);
    }
}
