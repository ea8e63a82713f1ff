//! In-memory stand-ins for the RPC server, Horizon and the wallet.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use launchpad_core::LaunchpadConfig;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::horizon::{AccountBalances, HorizonBalance, LedgerClient};
use crate::rpc::{
    AccountSnapshot, GetTransactionResponse, RpcError, SendStatus, SendTransactionResponse,
    SorobanRpc, TransactionStatus,
};
use crate::scval::ScVal;
use crate::strkey::{AccountId, ContractId};
use crate::transaction::decode_invocation;
use crate::wallet::{WalletError, WalletInfo, WalletKit};
use crate::xdr::to_base64;

pub fn contract(byte: u8) -> String {
    ContractId([byte; 32]).to_string()
}

/// Testnet config with every contract configured.
pub fn test_config() -> LaunchpadConfig {
    let mut config = LaunchpadConfig::default();
    config.contracts.token_factory = Some(contract(1));
    config.contracts.dex = Some(contract(2));
    config.contracts.amm = Some(contract(3));
    config.contracts.bonding_curve = Some(contract(4));
    config
}

type Responder = Box<dyn Fn(&str, &[ScVal]) -> Option<ScVal> + Send + Sync>;

pub struct FakeRpc {
    responder: Responder,
    simulation_error: Option<String>,
    send_status: SendStatus,
    statuses: Mutex<VecDeque<TransactionStatus>>,
    simulated: Mutex<Vec<(String, Vec<ScVal>)>>,
    sent: Mutex<Vec<String>>,
    account_lookups: AtomicUsize,
    status_polls: AtomicUsize,
}

impl FakeRpc {
    /// `responder` maps a simulated call to its return value; `None` leaves
    /// the return value out of the response.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &[ScVal]) -> Option<ScVal> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            simulation_error: None,
            send_status: SendStatus::Pending,
            statuses: Mutex::new(VecDeque::new()),
            simulated: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            account_lookups: AtomicUsize::new(0),
            status_polls: AtomicUsize::new(0),
        }
    }

    pub fn with_simulation_error(mut self, message: &str) -> Self {
        self.simulation_error = Some(message.to_string());
        self
    }

    pub fn with_send_status(mut self, status: SendStatus) -> Self {
        self.send_status = status;
        self
    }

    pub fn with_statuses(self, statuses: Vec<TransactionStatus>) -> Self {
        *self.statuses.lock() = statuses.into();
        self
    }

    pub fn simulated(&self) -> Vec<(String, Vec<ScVal>)> {
        self.simulated.lock().clone()
    }

    pub fn simulated_methods(&self) -> Vec<String> {
        self.simulated.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn account_lookups(&self) -> usize {
        self.account_lookups.load(Ordering::SeqCst)
    }

    pub fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SorobanRpc for FakeRpc {
    async fn get_account(&self, account: &AccountId) -> Result<AccountSnapshot, RpcError> {
        self.account_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(AccountSnapshot {
            account_id: *account,
            sequence: 100,
        })
    }

    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<Value, RpcError> {
        let call = decode_invocation(envelope_xdr)?;
        self.simulated
            .lock()
            .push((call.function.clone(), call.args.clone()));

        if let Some(err) = &self.simulation_error {
            return Ok(json!({ "error": err, "latestLedger": 1 }));
        }

        let mut response = json!({
            "latestLedger": 1,
            "minResourceFee": "1000",
            "transactionData": to_base64(&[0, 0, 0, 0]),
        });
        let result = match (self.responder)(&call.function, &call.args) {
            Some(value) => json!({ "auth": [], "retval": value.to_xdr_base64() }),
            None => json!({ "auth": [] }),
        };
        response["results"] = json!([result]);
        Ok(response)
    }

    async fn send_transaction(
        &self,
        envelope_xdr: &str,
    ) -> Result<SendTransactionResponse, RpcError> {
        self.sent.lock().push(envelope_xdr.to_string());
        Ok(SendTransactionResponse {
            status: self.send_status,
            hash: "feedface".into(),
            error_result_xdr: None,
        })
    }

    async fn get_transaction(&self, _hash: &str) -> Result<GetTransactionResponse, RpcError> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .lock()
            .pop_front()
            .unwrap_or(TransactionStatus::NotFound);
        Ok(GetTransactionResponse {
            status,
            ledger: Some(7),
        })
    }
}

/// Wallet that either signs (echoing the envelope back as `{signedTxXdr}`),
/// returns a canned response, or fails with a message.
pub struct FakeWallet {
    response: Option<Value>,
    failure: Option<String>,
    signs: AtomicUsize,
}

impl FakeWallet {
    pub fn signing() -> Self {
        Self {
            response: None,
            failure: None,
            signs: AtomicUsize::new(0),
        }
    }

    pub fn responding(response: Value) -> Self {
        Self {
            response: Some(response),
            ..Self::signing()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::signing()
        }
    }

    pub fn sign_count(&self) -> usize {
        self.signs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletKit for FakeWallet {
    async fn supported_wallets(&self) -> Vec<WalletInfo> {
        Vec::new()
    }

    fn set_wallet(&self, _wallet_id: &str) -> Result<(), WalletError> {
        Ok(())
    }

    async fn get_address(&self) -> Result<String, WalletError> {
        Ok(AccountId([1u8; 32]).to_string())
    }

    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        _network_passphrase: &str,
    ) -> Result<Value, WalletError> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(WalletError::Signing(message.clone()));
        }
        Ok(self
            .response
            .clone()
            .unwrap_or_else(|| json!({ "signedTxXdr": envelope_xdr })))
    }
}

/// Horizon stand-in keyed by account strkey.
#[derive(Default)]
pub struct FakeLedger {
    pub accounts: HashMap<String, Vec<HorizonBalance>>,
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn load_account(&self, account: &str) -> Result<AccountBalances, RpcError> {
        self.accounts
            .get(account)
            .map(|balances| AccountBalances {
                account_id: account.to_string(),
                balances: balances.clone(),
            })
            .ok_or_else(|| RpcError::AccountNotFound(account.to_string()))
    }
}
