//! The one typed store a front end holds: config, wallet, tokens, trading and
//! toasts, wired to a single contract client.

use std::path::PathBuf;
use std::sync::Arc;

use launchpad_chain::{ChainError, ContractClient, SorobanRpc, WalletKit};
use launchpad_core::{AppNotification, LaunchpadConfig, NotificationStore, NotificationType};
use parking_lot::Mutex;
use tracing::debug;

use crate::token_store::{RefreshOutcome, TokenStore};
use crate::trade::TradeDesk;
use crate::wallet_context::{ConnectionTransition, WalletContext};

pub struct AppState {
    config: LaunchpadConfig,
    client: Arc<ContractClient>,
    wallet: WalletContext,
    tokens: TokenStore,
    trade: TradeDesk,
    notifications: Arc<Mutex<NotificationStore>>,
}

impl AppState {
    pub fn new(
        config: LaunchpadConfig,
        rpc: Arc<dyn SorobanRpc>,
        kit: Arc<dyn WalletKit>,
        session_path: PathBuf,
    ) -> Self {
        let client = Arc::new(ContractClient::new(&config, rpc));
        let notifications = Arc::new(Mutex::new(NotificationStore::new()));
        Self {
            wallet: WalletContext::new(kit, client.clone(), session_path),
            tokens: TokenStore::new(client.clone()),
            trade: TradeDesk::new(client.clone(), notifications.clone()),
            notifications,
            client,
            config,
        }
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<ContractClient> {
        &self.client
    }

    pub fn wallet(&self) -> &WalletContext {
        &self.wallet
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn trade(&self) -> &TradeDesk {
        &self.trade
    }

    pub fn notifications(&self) -> &Arc<Mutex<NotificationStore>> {
        &self.notifications
    }

    /// Restore the persisted session and load tokens if it brought one back.
    pub async fn start(&self) -> ConnectionTransition {
        let transition = self.wallet.restore();
        self.on_transition(transition).await;
        transition
    }

    pub async fn connect_wallet(&self, wallet_id: &str) -> Result<ConnectionTransition, ChainError> {
        match self.wallet.connect(wallet_id).await {
            Ok(transition) => {
                self.on_transition(transition).await;
                Ok(transition)
            }
            Err(e) => {
                self.notifications.lock().push(AppNotification::new(
                    NotificationType::Error,
                    "Failed to connect wallet. Please try again.",
                ));
                Err(e)
            }
        }
    }

    pub fn disconnect_wallet(&self) -> ConnectionTransition {
        self.wallet.disconnect()
    }

    async fn on_transition(&self, transition: ConnectionTransition) {
        if transition != ConnectionTransition::Connected {
            return;
        }
        let outcome = self.tokens.refresh().await;
        if outcome != RefreshOutcome::Published {
            debug!(?outcome, "token refresh after connect did not publish");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use launchpad_chain::scval::ScVal;
    use launchpad_chain::testing::{FakeRpc, FakeWallet, test_config};
    use launchpad_chain::{WalletError, WalletInfo};
    use launchpad_core::SessionState;
    use serde_json::Value;
    use tempfile::TempDir;

    fn rpc() -> Arc<FakeRpc> {
        Arc::new(FakeRpc::new(|method, args| match method {
            "get_token_count" => Some(ScVal::U32(1)),
            "get_token_info" => args[0].as_u32().map(|id| {
                ScVal::Map(vec![(ScVal::symbol("token_id"), ScVal::U32(id))])
            }),
            _ => None,
        }))
    }

    struct UnavailableWallet;

    #[async_trait]
    impl WalletKit for UnavailableWallet {
        async fn supported_wallets(&self) -> Vec<WalletInfo> {
            Vec::new()
        }

        fn set_wallet(&self, wallet_id: &str) -> Result<(), WalletError> {
            Err(WalletError::UnknownWallet(wallet_id.to_string()))
        }

        async fn get_address(&self) -> Result<String, WalletError> {
            Err(WalletError::NotConnected)
        }

        async fn sign_transaction(&self, _xdr: &str, _passphrase: &str) -> Result<Value, WalletError> {
            Err(WalletError::NotConnected)
        }
    }

    #[tokio::test]
    async fn connecting_loads_tokens() {
        let dir = TempDir::new().unwrap();
        let rpc = rpc();
        let app = AppState::new(
            test_config(),
            rpc.clone(),
            Arc::new(FakeWallet::signing()),
            dir.path().join("session.json"),
        );
        assert!(app.tokens().tokens().is_empty());

        let transition = app.connect_wallet("freighter").await.unwrap();
        assert_eq!(transition, ConnectionTransition::Connected);
        assert_eq!(app.tokens().tokens().len(), 1);

        // Already connected: no second load.
        let before = rpc.simulated().len();
        app.connect_wallet("freighter").await.unwrap();
        assert_eq!(rpc.simulated().len(), before);
    }

    #[tokio::test]
    async fn start_refreshes_only_when_a_session_is_restored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let rpc = rpc();

        let app = AppState::new(test_config(), rpc.clone(), Arc::new(FakeWallet::signing()), path.clone());
        assert_eq!(app.start().await, ConnectionTransition::Unchanged);
        assert!(rpc.simulated().is_empty());

        SessionState {
            wallet_public_key: Some(launchpad_chain::AccountId([2u8; 32]).to_string()),
        }
        .save_to(&path)
        .unwrap();
        let app = AppState::new(test_config(), rpc.clone(), Arc::new(FakeWallet::signing()), path);
        assert_eq!(app.start().await, ConnectionTransition::Connected);
        assert_eq!(app.tokens().tokens().len(), 1);
        assert!(!app.wallet().can_sign());
    }

    #[tokio::test]
    async fn failed_connect_pushes_error_toast() {
        let dir = TempDir::new().unwrap();
        let app = AppState::new(
            test_config(),
            rpc(),
            Arc::new(UnavailableWallet),
            dir.path().join("session.json"),
        );
        assert!(app.connect_wallet("ledger").await.is_err());
        assert!(!app.wallet().is_connected());
        let store = app.notifications().lock();
        assert_eq!(store.all()[0].notification_type, NotificationType::Error);
    }
}
