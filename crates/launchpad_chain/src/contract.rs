//! Contract-invocation adapter.
//!
//! Every service call goes through [`ContractClient`]: reads are simulated
//! against the RPC server and never touch the wallet; writes are simulated
//! for resources, signed by the wallet, submitted, and optionally polled to
//! finality.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use launchpad_core::{ContractAddresses, LaunchpadConfig};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ChainError, translate_invoke_error};
use crate::rpc::{SendStatus, SorobanRpc, TransactionStatus};
use crate::scval::ScVal;
use crate::simulation::{SimulationOutcome, decode_simulate_result, prepared_resources, simulation_error};
use crate::strkey::ContractId;
use crate::transaction::{INVOKE_FEE, SIMULATION_FEE, SignedEnvelope, TransactionBuilder};
use crate::wallet::{WalletSession, sign_envelope};

/// The launchpad's deployed contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    TokenFactory,
    Dex,
    Amm,
    BondingCurve,
}

impl ContractKind {
    pub const ALL: [ContractKind; 4] = [
        ContractKind::TokenFactory,
        ContractKind::Dex,
        ContractKind::Amm,
        ContractKind::BondingCurve,
    ];

    fn configured_id(self, contracts: &ContractAddresses) -> Option<&str> {
        match self {
            ContractKind::TokenFactory => contracts.token_factory.as_deref(),
            ContractKind::Dex => contracts.dex.as_deref(),
            ContractKind::Amm => contracts.amm.as_deref(),
            ContractKind::BondingCurve => contracts.bonding_curve.as_deref(),
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContractKind::TokenFactory => "Token Factory",
            ContractKind::Dex => "DEX",
            ContractKind::Amm => "AMM",
            ContractKind::BondingCurve => "Bonding Curve",
        })
    }
}

/// What `invoke` waits for after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalityMode {
    /// Return as soon as the RPC server accepts the transaction.
    Submit,
    /// Poll `getTransaction` until it succeeds or fails.
    Poll { interval: Duration, max_attempts: u32 },
}

impl FinalityMode {
    pub fn from_config(config: &LaunchpadConfig) -> Self {
        if config.wait_for_finality {
            FinalityMode::Poll {
                interval: config.poll_interval(),
                max_attempts: config.poll_max_attempts,
            }
        } else {
            FinalityMode::Submit
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationStatus {
    Submitted,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationReceipt {
    pub transaction_hash: String,
    pub status: InvocationStatus,
    pub ledger: Option<u32>,
}

impl InvocationReceipt {
    /// Turn a `Failed` receipt into [`ChainError::TransactionFailed`].
    pub fn ensure_not_failed(self) -> Result<Self, ChainError> {
        match self.status {
            InvocationStatus::Failed => Err(ChainError::TransactionFailed {
                hash: self.transaction_hash,
            }),
            _ => Ok(self),
        }
    }
}

pub struct ContractClient {
    rpc: Arc<dyn SorobanRpc>,
    contracts: HashMap<ContractKind, ContractId>,
    network_passphrase: String,
    read_timeout: Duration,
    write_timeout: Duration,
    finality: FinalityMode,
    session: RwLock<WalletSession>,
}

impl ContractClient {
    pub fn new(config: &LaunchpadConfig, rpc: Arc<dyn SorobanRpc>) -> Self {
        let mut contracts = HashMap::new();
        for kind in ContractKind::ALL {
            let Some(raw) = kind.configured_id(&config.contracts) else {
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<ContractId>() {
                Ok(id) => {
                    contracts.insert(kind, id);
                }
                Err(e) => warn!(contract = %kind, error = %e, "ignoring invalid contract id"),
            }
        }

        Self {
            rpc,
            contracts,
            network_passphrase: config.network_passphrase.clone(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            finality: FinalityMode::from_config(config),
            session: RwLock::new(WalletSession::disconnected()),
        }
    }

    pub fn with_finality(mut self, finality: FinalityMode) -> Self {
        self.finality = finality;
        self
    }

    pub fn set_session(&self, session: WalletSession) {
        *self.session.write() = session;
    }

    pub fn session(&self) -> WalletSession {
        self.session.read().clone()
    }

    pub fn is_configured(&self, kind: ContractKind) -> bool {
        self.contracts.contains_key(&kind)
    }

    pub fn contract_id(&self, kind: ContractKind) -> Result<ContractId, ChainError> {
        self.contracts
            .get(&kind)
            .copied()
            .ok_or(ChainError::ContractNotConfigured(kind))
    }

    /// Simulate a read and report exactly what came back.
    pub async fn try_simulate(
        &self,
        kind: ContractKind,
        method: &str,
        args: Vec<ScVal>,
    ) -> Result<SimulationOutcome, ChainError> {
        let contract = self.contract_id(kind)?;
        let source = *self
            .session
            .read()
            .public_key()
            .ok_or(ChainError::WalletNotConnected)?;

        let account = self.rpc.get_account(&source).await?;
        let tx = TransactionBuilder::new(source, account.sequence)
            .fee(SIMULATION_FEE)
            .timeout(self.read_timeout)
            .invoke(contract, method, args);

        debug!(contract = %kind, method, "simulating contract call");
        let response = self.rpc.simulate_transaction(&tx.to_envelope_base64()).await?;
        if let Some(err) = simulation_error(&response) {
            warn!(contract = %kind, method, error = %err, "simulation reported an error");
        }
        Ok(decode_simulate_result(&response))
    }

    /// Read-only call. Every failure reads as `None`.
    pub async fn simulate(&self, kind: ContractKind, method: &str, args: Vec<ScVal>) -> Option<ScVal> {
        match self.try_simulate(kind, method, args).await {
            Ok(SimulationOutcome::Found(value, _)) => Some(value),
            Ok(SimulationOutcome::NotFound) => {
                warn!(contract = %kind, method, "no return value in simulation response");
                None
            }
            Ok(SimulationOutcome::DecodeError(path, e)) => {
                warn!(contract = %kind, method, path = ?path, error = %e, "failed to decode return value");
                None
            }
            Err(e) => {
                warn!(contract = %kind, method, error = %e, "simulation failed");
                None
            }
        }
    }

    /// State-changing call: prepare, sign, submit and (per [`FinalityMode`])
    /// wait. Failures are never retried.
    pub async fn invoke(
        &self,
        kind: ContractKind,
        method: &str,
        args: Vec<ScVal>,
    ) -> Result<InvocationReceipt, ChainError> {
        let contract = self.contract_id(kind)?;
        let session = self.session();
        let (source, signer) = session.signer()?;

        info!(contract = %kind, method, "invoking contract");

        let account = self.rpc.get_account(source).await?;
        let mut tx = TransactionBuilder::new(*source, account.sequence)
            .fee(INVOKE_FEE)
            .timeout(self.write_timeout)
            .invoke(contract, method, args);

        let simulated = self.rpc.simulate_transaction(&tx.to_envelope_base64()).await?;
        if let Some(err) = simulation_error(&simulated) {
            return Err(translate_invoke_error(&err));
        }
        tx.apply_resources(prepared_resources(&simulated)?);
        debug!(fee = tx.fee, hash = %tx.hash_hex(&self.network_passphrase), "prepared transaction");

        let signed_xdr =
            sign_envelope(signer.as_ref(), &tx.to_envelope_base64(), &self.network_passphrase)
                .await?;
        let signed = SignedEnvelope::parse(&signed_xdr).map_err(|e| {
            warn!(error = %e, "wallet returned an unparseable envelope");
            ChainError::TransactionFormatError
        })?;

        let sent = self.rpc.send_transaction(&signed.xdr).await?;
        match sent.status {
            SendStatus::Error => {
                let detail = sent
                    .error_result_xdr
                    .unwrap_or_else(|| "Transaction failed".into());
                return Err(translate_invoke_error(&detail));
            }
            SendStatus::TryAgainLater => {
                return Err(ChainError::Submission(
                    "Network is busy, transaction was not accepted".into(),
                ));
            }
            SendStatus::Pending | SendStatus::Duplicate => {}
        }
        info!(contract = %kind, method, hash = %sent.hash, "transaction submitted");

        match self.finality {
            FinalityMode::Submit => Ok(InvocationReceipt {
                transaction_hash: sent.hash,
                status: InvocationStatus::Submitted,
                ledger: None,
            }),
            FinalityMode::Poll {
                interval,
                max_attempts,
            } => self.await_finality(sent.hash, interval, max_attempts).await,
        }
    }

    async fn await_finality(
        &self,
        hash: String,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<InvocationReceipt, ChainError> {
        for attempt in 1..=max_attempts {
            tokio::time::sleep(interval).await;
            let status = match self.rpc.get_transaction(&hash).await {
                Ok(resp) => resp,
                Err(e) => {
                    debug!(%hash, attempt, error = %e, "getTransaction failed, polling again");
                    continue;
                }
            };
            match status.status {
                TransactionStatus::Success => {
                    info!(%hash, attempt, "transaction confirmed");
                    return Ok(InvocationReceipt {
                        transaction_hash: hash,
                        status: InvocationStatus::Success,
                        ledger: status.ledger,
                    });
                }
                TransactionStatus::Failed => {
                    warn!(%hash, "transaction failed on chain");
                    return Ok(InvocationReceipt {
                        transaction_hash: hash,
                        status: InvocationStatus::Failed,
                        ledger: status.ledger,
                    });
                }
                TransactionStatus::NotFound => {}
            }
        }
        warn!(%hash, max_attempts, "transaction not confirmed in time");
        Err(ChainError::TransactionTimeout {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRpc, FakeWallet, test_config};
    use crate::strkey::AccountId;
    use serde_json::json;

    fn client(rpc: Arc<FakeRpc>) -> ContractClient {
        ContractClient::new(&test_config(), rpc)
    }

    #[tokio::test]
    async fn simulate_returns_decoded_value() {
        let rpc = Arc::new(FakeRpc::new(|method, _| match method {
            "get_token_count" => Some(ScVal::U32(3)),
            _ => None,
        }));
        let client = client(rpc.clone());
        client.set_session(WalletSession::restored(AccountId([1u8; 32])));

        let value = client
            .simulate(ContractKind::TokenFactory, "get_token_count", vec![])
            .await;
        assert_eq!(value, Some(ScVal::U32(3)));
        assert_eq!(rpc.simulated_methods(), vec!["get_token_count"]);
    }

    #[tokio::test]
    async fn simulate_without_any_return_path_is_none() {
        let rpc = Arc::new(FakeRpc::new(|_, _| None));
        let client = client(rpc.clone());
        client.set_session(WalletSession::restored(AccountId([1u8; 32])));

        assert_eq!(
            client.simulate(ContractKind::TokenFactory, "get_token_count", vec![]).await,
            None
        );
        assert!(matches!(
            client
                .try_simulate(ContractKind::TokenFactory, "get_token_count", vec![])
                .await,
            Ok(SimulationOutcome::NotFound)
        ));
    }

    #[tokio::test]
    async fn simulate_needs_configured_contract_and_source() {
        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::U32(1))));
        let mut config = test_config();
        config.contracts.amm = None;
        let client = ContractClient::new(&config, rpc.clone());

        assert!(matches!(
            client.try_simulate(ContractKind::TokenFactory, "get_token_count", vec![]).await,
            Err(ChainError::WalletNotConnected)
        ));
        client.set_session(WalletSession::restored(AccountId([1u8; 32])));
        assert!(matches!(
            client.try_simulate(ContractKind::Amm, "get_pool_count", vec![]).await,
            Err(ChainError::ContractNotConfigured(ContractKind::Amm))
        ));
        assert!(rpc.simulated_methods().is_empty());
    }

    #[tokio::test]
    async fn invoke_unconfigured_contract_does_no_io() {
        let rpc = Arc::new(FakeRpc::new(|_, _| None));
        let mut config = test_config();
        config.contracts.dex = None;
        let client = ContractClient::new(&config, rpc.clone());
        let wallet = Arc::new(FakeWallet::signing());
        client.set_session(WalletSession::connected(AccountId([1u8; 32]), wallet.clone()));

        let err = client
            .invoke(ContractKind::Dex, "cancel_order", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::ContractNotConfigured(ContractKind::Dex)));
        assert_eq!(rpc.account_lookups(), 0);
        assert_eq!(wallet.sign_count(), 0);
    }

    #[tokio::test]
    async fn invoke_requires_signer() {
        let rpc = Arc::new(FakeRpc::new(|_, _| None));
        let client = client(rpc.clone());
        client.set_session(WalletSession::restored(AccountId([1u8; 32])));

        let err = client
            .invoke(ContractKind::Dex, "cancel_order", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::WalletNotConnected));
        assert_eq!(rpc.account_lookups(), 0);
    }

    #[tokio::test]
    async fn invoke_submits_signed_envelope() {
        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::Void)));
        let wallet = Arc::new(FakeWallet::signing());
        let client = client(rpc.clone()).with_finality(FinalityMode::Submit);
        client.set_session(WalletSession::connected(AccountId([1u8; 32]), wallet.clone()));

        let receipt = client
            .invoke(ContractKind::Dex, "cancel_order", vec![ScVal::U64(4)])
            .await
            .unwrap();
        assert_eq!(receipt.status, InvocationStatus::Submitted);
        assert_eq!(receipt.transaction_hash, "feedface");
        assert_eq!(wallet.sign_count(), 1);
        assert_eq!(rpc.sent().len(), 1);
    }

    #[tokio::test]
    async fn insufficient_simulation_error_is_canonical() {
        let rpc = Arc::new(FakeRpc::new(|_, _| None).with_simulation_error(
            "HostError: Error(Contract, #3) insufficient balance",
        ));
        let wallet = Arc::new(FakeWallet::signing());
        let client = client(rpc.clone());
        client.set_session(WalletSession::connected(AccountId([1u8; 32]), wallet.clone()));

        let err = client
            .invoke(ContractKind::Dex, "buy_tokens", vec![])
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Insufficient XLM balance");
        assert_eq!(wallet.sign_count(), 0);
    }

    #[tokio::test]
    async fn declined_signature_is_canonical() {
        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::Void)));
        let wallet = Arc::new(FakeWallet::failing("User declined access"));
        let client = client(rpc.clone());
        client.set_session(WalletSession::connected(AccountId([1u8; 32]), wallet));

        let err = client
            .invoke(ContractKind::Dex, "buy_tokens", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::UserDeclinedSigning));
        assert!(rpc.sent().is_empty());
    }

    #[tokio::test]
    async fn garbage_signature_is_a_format_error() {
        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::Void)));
        let wallet = Arc::new(FakeWallet::responding(json!({ "result": "bm90IGFuIGVudmVsb3Bl" })));
        let client = client(rpc.clone());
        client.set_session(WalletSession::connected(AccountId([1u8; 32]), wallet));

        let err = client
            .invoke(ContractKind::Dex, "buy_tokens", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::TransactionFormatError));
        assert!(rpc.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_reaches_success() {
        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::Void)).with_statuses(vec![
            TransactionStatus::NotFound,
            TransactionStatus::NotFound,
            TransactionStatus::Success,
        ]));
        let wallet = Arc::new(FakeWallet::signing());
        let client = client(rpc.clone());
        client.set_session(WalletSession::connected(AccountId([1u8; 32]), wallet));

        let receipt = client
            .invoke(ContractKind::Dex, "cancel_order", vec![])
            .await
            .unwrap();
        assert_eq!(receipt.status, InvocationStatus::Success);
        assert_eq!(rpc.status_polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_reports_failure_and_timeout() {
        let rpc = Arc::new(
            FakeRpc::new(|_, _| Some(ScVal::Void)).with_statuses(vec![TransactionStatus::Failed]),
        );
        let client = client(rpc.clone());
        client.set_session(WalletSession::connected(
            AccountId([1u8; 32]),
            Arc::new(FakeWallet::signing()),
        ));
        let receipt = client
            .invoke(ContractKind::Dex, "cancel_order", vec![])
            .await
            .unwrap();
        assert_eq!(receipt.status, InvocationStatus::Failed);
        assert!(matches!(
            receipt.ensure_not_failed(),
            Err(ChainError::TransactionFailed { .. })
        ));

        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::Void)));
        let client = ContractClient::new(&test_config(), rpc.clone());
        client.set_session(WalletSession::connected(
            AccountId([1u8; 32]),
            Arc::new(FakeWallet::signing()),
        ));
        let err = client
            .invoke(ContractKind::Dex, "cancel_order", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::TransactionTimeout { attempts: 30 }));
        assert_eq!(rpc.status_polls(), 30);
    }

    #[tokio::test]
    async fn rejected_submission_is_surfaced() {
        let rpc = Arc::new(FakeRpc::new(|_, _| Some(ScVal::Void)).with_send_status(SendStatus::Error));
        let client = client(rpc.clone());
        client.set_session(WalletSession::connected(
            AccountId([1u8; 32]),
            Arc::new(FakeWallet::signing()),
        ));
        let err = client
            .invoke(ContractKind::Dex, "cancel_order", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Submission(_)));
    }

    #[test]
    fn invalid_contract_ids_are_unconfigured() {
        let mut config = test_config();
        config.contracts.amm = Some("CNOTAREALCONTRACT".into());
        let client = ContractClient::new(&config, Arc::new(FakeRpc::new(|_, _| None)));
        assert!(!client.is_configured(ContractKind::Amm));
        assert!(client.is_configured(ContractKind::TokenFactory));
        assert_eq!(ContractKind::BondingCurve.to_string(), "Bonding Curve");
    }
}
