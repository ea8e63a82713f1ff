//! Typed services over the launchpad contracts and Horizon.
//!
//! Reads degrade to zero, `None` or an empty list and log the cause; writes
//! return a [`ChainError`] and are never retried.

pub mod amm;
pub mod balances;
pub mod bonding_curve;
pub mod dex;
pub mod token_factory;

pub use amm::AmmService;
pub use balances::BalanceService;
pub use bonding_curve::BondingCurveService;
pub use dex::DexService;
pub use token_factory::TokenFactoryService;

use crate::contract::{ContractClient, ContractKind};
use crate::error::ChainError;
use crate::scval::ScVal;
use crate::strkey::Address;
use crate::validation::ValidationError;

/// The connected account as the leading argument of a write.
///
/// Checks the contract first so an unconfigured contract is reported before a
/// missing wallet.
fn actor(client: &ContractClient, kind: ContractKind) -> Result<ScVal, ChainError> {
    client.contract_id(kind)?;
    client
        .session()
        .public_key()
        .map(|key| ScVal::address(*key))
        .ok_or(ChainError::WalletNotConnected)
}

fn address_arg(address: &str) -> Result<ScVal, ChainError> {
    address
        .trim()
        .parse::<Address>()
        .map(ScVal::address)
        .map_err(|_| ValidationError::new("Invalid Stellar address").into())
}

fn i128_or_zero(value: Option<ScVal>) -> i128 {
    value.as_ref().and_then(ScVal::as_i128).unwrap_or(0)
}
