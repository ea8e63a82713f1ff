//! State containers that sit between the launchpad services and a front end.

pub mod app_state;
pub mod token_store;
pub mod trade;
pub mod wallet_context;

pub use app_state::AppState;
pub use token_store::{RefreshOutcome, TokenSnapshot, TokenStore};
pub use trade::TradeDesk;
pub use wallet_context::{ConnectionTransition, WalletContext};
