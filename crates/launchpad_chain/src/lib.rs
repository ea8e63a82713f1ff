pub mod amount;
pub mod contract;
pub mod error;
pub mod horizon;
pub mod models;
pub mod rpc;
pub mod scval;
pub mod services;
pub mod simulation;
pub mod strkey;
pub mod transaction;
pub mod validation;
pub mod wallet;
pub mod xdr;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use contract::{ContractClient, ContractKind, FinalityMode, InvocationReceipt, InvocationStatus};
pub use error::{ChainError, ErrorCategory};
pub use horizon::{HorizonClient, LedgerClient};
pub use models::{Balance, BondingListing, BondingToken, Order, Pool, PoolListing, Token};
pub use rpc::{HttpSorobanRpc, RpcError, SorobanRpc};
pub use scval::ScVal;
pub use services::{AmmService, BalanceService, BondingCurveService, DexService, TokenFactoryService};
pub use strkey::{AccountId, Address, ContractId};
pub use wallet::{WalletError, WalletInfo, WalletKit, WalletSession};
