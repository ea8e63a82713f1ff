//! Order-book actions driven from the trade page.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use launchpad_chain::amount::{DEFAULT_DECIMALS, to_base_units_f64};
use launchpad_chain::validation::ValidationError;
use launchpad_chain::{ChainError, ContractClient, DexService, InvocationReceipt, Order};
use launchpad_core::{NotificationStore, NotificationType};
use parking_lot::Mutex;
use tracing::warn;

/// Wraps [`DexService`] with display-unit inputs, a busy flag and toasts.
/// Amounts and prices are entered in whole units and sent as stroops.
pub struct TradeDesk {
    client: Arc<ContractClient>,
    dex: DexService,
    notifications: Arc<Mutex<NotificationStore>>,
    loading: AtomicBool,
}

fn stroops(display: f64, field: &str) -> Result<i128, ChainError> {
    to_base_units_f64(display, DEFAULT_DECIMALS)
        .map_err(|e| ChainError::Validation(ValidationError::new(format!("Invalid {field}: {e}"))))
}

impl TradeDesk {
    pub fn new(client: Arc<ContractClient>, notifications: Arc<Mutex<NotificationStore>>) -> Self {
        Self {
            dex: DexService::new(client.clone()),
            client,
            notifications,
            loading: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn create_sell_order(
        &self,
        token_contract: &str,
        amount: f64,
        price_per_token: f64,
    ) -> Result<InvocationReceipt, ChainError> {
        self.ensure_signer()?;
        let amount = stroops(amount, "amount")?;
        let price = stroops(price_per_token, "price")?;
        self.tracked(
            "Creating sell order...",
            "Sell order created successfully!",
            self.dex.create_sell_order(token_contract, amount, price),
        )
        .await
    }

    pub async fn buy_tokens(&self, order_id: u64, amount: f64) -> Result<InvocationReceipt, ChainError> {
        self.ensure_signer()?;
        let amount = stroops(amount, "amount")?;
        self.tracked(
            "Buying tokens...",
            "Tokens purchased successfully!",
            self.dex.buy_tokens(order_id, amount),
        )
        .await
    }

    pub async fn cancel_order(&self, order_id: u64) -> Result<InvocationReceipt, ChainError> {
        self.ensure_signer()?;
        self.tracked(
            "Canceling order...",
            "Order canceled successfully!",
            self.dex.cancel_order(order_id),
        )
        .await
    }

    /// Open orders for `token_contract`; empty while disconnected.
    pub async fn get_token_orders(&self, token_contract: &str) -> Vec<Order> {
        if !self.client.session().is_connected() {
            return Vec::new();
        }
        self.dex.get_token_orders(token_contract).await
    }

    fn ensure_signer(&self) -> Result<(), ChainError> {
        if self.client.session().can_sign() {
            Ok(())
        } else {
            Err(ChainError::WalletNotConnected)
        }
    }

    async fn tracked<F>(&self, pending: &str, done: &str, action: F) -> Result<InvocationReceipt, ChainError>
    where
        F: Future<Output = Result<InvocationReceipt, ChainError>>,
    {
        self.loading.store(true, Ordering::SeqCst);
        let toast = self.notifications.lock().loading(pending);

        let result = action.await;
        match &result {
            Ok(_) => self
                .notifications
                .lock()
                .resolve(&toast, NotificationType::Success, done),
            Err(e) => {
                warn!(action = pending, error = %e, "trade failed");
                self.notifications
                    .lock()
                    .resolve(&toast, NotificationType::Error, e.user_message());
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }
}
