//! Wallet connection state shared by every page.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use launchpad_chain::{AccountId, ChainError, ContractClient, WalletError, WalletInfo, WalletKit, WalletSession};
use launchpad_core::SessionState;
use tracing::{info, warn};

/// How a call changed the connected state, so dependants can react once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionTransition {
    Connected,
    Disconnected,
    Unchanged,
}

impl ConnectionTransition {
    fn between(was_connected: bool, is_connected: bool) -> Self {
        match (was_connected, is_connected) {
            (false, true) => Self::Connected,
            (true, false) => Self::Disconnected,
            _ => Self::Unchanged,
        }
    }
}

pub struct WalletContext {
    kit: Arc<dyn WalletKit>,
    client: Arc<ContractClient>,
    session_path: PathBuf,
    loading: AtomicBool,
}

impl WalletContext {
    pub fn new(kit: Arc<dyn WalletKit>, client: Arc<ContractClient>, session_path: PathBuf) -> Self {
        Self {
            kit,
            client,
            session_path,
            loading: AtomicBool::new(false),
        }
    }

    pub fn public_key(&self) -> Option<String> {
        self.client.session().public_key().map(|k| k.to_string())
    }

    pub fn is_connected(&self) -> bool {
        self.client.session().is_connected()
    }

    /// True only after an interactive connect in this process.
    pub fn can_sign(&self) -> bool {
        self.client.session().can_sign()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn supported_wallets(&self) -> Vec<WalletInfo> {
        self.kit.supported_wallets().await
    }

    /// Bring back the last persisted public key. The restored session can
    /// read but not sign.
    pub fn restore(&self) -> ConnectionTransition {
        let was_connected = self.is_connected();
        let Some(saved) = SessionState::load_public_key_from(&self.session_path) else {
            return ConnectionTransition::Unchanged;
        };
        match saved.parse::<AccountId>() {
            Ok(key) => {
                info!(public_key = %key, "restored wallet session");
                self.client.set_session(WalletSession::restored(key));
            }
            Err(e) => {
                warn!(error = %e, "ignoring invalid persisted public key");
                return ConnectionTransition::Unchanged;
            }
        }
        ConnectionTransition::between(was_connected, true)
    }

    /// Select `wallet_id`, ask it for the account address and persist it.
    pub async fn connect(&self, wallet_id: &str) -> Result<ConnectionTransition, ChainError> {
        let was_connected = self.is_connected();
        self.loading.store(true, Ordering::SeqCst);
        let result = self.establish(wallet_id).await;
        self.loading.store(false, Ordering::SeqCst);

        let key = result.inspect_err(|e| warn!(wallet_id, error = %e, "wallet connection failed"))?;
        self.client
            .set_session(WalletSession::connected(key, self.kit.clone()));

        let state = SessionState {
            wallet_public_key: Some(key.to_string()),
        };
        if let Err(e) = state.save_to(&self.session_path) {
            warn!(error = %e, "failed to persist wallet session");
        }
        info!(wallet_id, public_key = %key, "wallet connected");
        Ok(ConnectionTransition::between(was_connected, true))
    }

    async fn establish(&self, wallet_id: &str) -> Result<AccountId, ChainError> {
        self.kit.set_wallet(wallet_id)?;
        let address = self.kit.get_address().await?;
        address
            .parse::<AccountId>()
            .map_err(|_| WalletError::InvalidAddress(address).into())
    }

    /// Forget the session in memory and on disk.
    pub fn disconnect(&self) -> ConnectionTransition {
        let was_connected = self.is_connected();
        self.client.set_session(WalletSession::disconnected());
        if let Err(e) = SessionState::clear_at(&self.session_path) {
            warn!(error = %e, "failed to remove persisted wallet session");
        }
        info!("wallet disconnected");
        ConnectionTransition::between(was_connected, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_chain::testing::{FakeRpc, FakeWallet, test_config};
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> (WalletContext, Arc<ContractClient>) {
        let client = Arc::new(ContractClient::new(
            &test_config(),
            Arc::new(FakeRpc::new(|_, _| None)),
        ));
        let ctx = WalletContext::new(
            Arc::new(FakeWallet::signing()),
            client.clone(),
            dir.path().join("session.json"),
        );
        (ctx, client)
    }

    #[tokio::test]
    async fn connect_persists_and_disconnect_clears() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = context(&dir);
        let expected = AccountId([1u8; 32]).to_string();

        assert_eq!(
            ctx.connect("freighter").await.unwrap(),
            ConnectionTransition::Connected
        );
        assert!(ctx.can_sign());
        assert_eq!(ctx.public_key().as_deref(), Some(expected.as_str()));
        assert_eq!(
            SessionState::load_public_key_from(&dir.path().join("session.json")),
            Some(expected)
        );

        assert_eq!(ctx.connect("freighter").await.unwrap(), ConnectionTransition::Unchanged);
        assert_eq!(ctx.disconnect(), ConnectionTransition::Disconnected);
        assert!(!ctx.is_connected());
        assert!(!dir.path().join("session.json").exists());
        assert_eq!(ctx.disconnect(), ConnectionTransition::Unchanged);
    }

    #[tokio::test]
    async fn restore_brings_back_key_without_signer() {
        let dir = TempDir::new().unwrap();
        let key = AccountId([8u8; 32]).to_string();
        SessionState {
            wallet_public_key: Some(key.clone()),
        }
        .save_to(&dir.path().join("session.json"))
        .unwrap();

        let (ctx, client) = context(&dir);
        assert_eq!(ctx.restore(), ConnectionTransition::Connected);
        assert_eq!(ctx.public_key(), Some(key));
        assert!(!ctx.can_sign());
        assert!(client.session().is_connected());
    }

    #[test]
    fn restore_without_saved_key_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = context(&dir);
        assert_eq!(ctx.restore(), ConnectionTransition::Unchanged);

        SessionState {
            wallet_public_key: Some("GARBAGE".into()),
        }
        .save_to(&dir.path().join("session.json"))
        .unwrap();
        assert_eq!(ctx.restore(), ConnectionTransition::Unchanged);
        assert!(!ctx.is_connected());
    }
}
