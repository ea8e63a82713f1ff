use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Environment variable names
// ---------------------------------------------------------------------------

pub const ENV_NETWORK: &str = "LAUNCHPAD_NETWORK";
pub const ENV_HORIZON_URL: &str = "LAUNCHPAD_HORIZON_URL";
pub const ENV_SOROBAN_RPC_URL: &str = "LAUNCHPAD_SOROBAN_RPC_URL";
pub const ENV_NETWORK_PASSPHRASE: &str = "LAUNCHPAD_NETWORK_PASSPHRASE";
pub const ENV_TOKEN_FACTORY: &str = "LAUNCHPAD_TOKEN_FACTORY_CONTRACT_ID";
pub const ENV_DEX: &str = "LAUNCHPAD_DEX_CONTRACT_ID";
pub const ENV_AMM: &str = "LAUNCHPAD_AMM_CONTRACT_ID";
pub const ENV_BONDING_CURVE: &str = "LAUNCHPAD_BONDING_CURVE_CONTRACT_ID";
pub const ENV_LOG: &str = "LAUNCHPAD_LOG";

const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 180;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 30;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Stellar network the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Network {
    Testnet,
    Mainnet,
    Futurenet,
    Standalone,
}

impl Network {
    pub fn label(&self) -> &'static str {
        match self {
            Network::Testnet => "TESTNET",
            Network::Mainnet => "MAINNET",
            Network::Futurenet => "FUTURENET",
            Network::Standalone => "STANDALONE",
        }
    }

    /// Passphrase mixed into every transaction hash on this network.
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Mainnet => "Public Global Stellar Network ; September 2015",
            Network::Futurenet => "Test SDF Future Network ; October 2022",
            Network::Standalone => "Standalone Network ; February 2017",
        }
    }

    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://horizon-testnet.stellar.org",
            Network::Mainnet => "https://horizon.stellar.org",
            Network::Futurenet => "https://horizon-futurenet.stellar.org",
            Network::Standalone => "http://localhost:8000",
        }
    }

    pub fn default_soroban_rpc_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://soroban-testnet.stellar.org",
            Network::Mainnet => "https://mainnet.sorobanrpc.com",
            Network::Futurenet => "https://rpc-futurenet.stellar.org",
            Network::Standalone => "http://localhost:8000/soroban/rpc",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TESTNET" => Ok(Network::Testnet),
            "MAINNET" | "PUBLIC" => Ok(Network::Mainnet),
            "FUTURENET" => Ok(Network::Futurenet),
            "STANDALONE" | "LOCAL" => Ok(Network::Standalone),
            other => anyhow::bail!("unknown network: {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Contract addresses
// ---------------------------------------------------------------------------

/// Deployed contract addresses. A missing entry means the feature backed by
/// that contract is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractAddresses {
    pub token_factory: Option<String>,
    pub dex: Option<String>,
    pub amm: Option<String>,
    pub bonding_curve: Option<String>,
}

/// Outcome of [`LaunchpadConfig::validate_contracts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractValidation {
    pub is_valid: bool,
    pub missing: Vec<&'static str>,
}

// ---------------------------------------------------------------------------
// LaunchpadConfig
// ---------------------------------------------------------------------------

/// Client configuration stored at `~/.launchpad/config.json` and overlaid by
/// `LAUNCHPAD_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchpadConfig {
    pub network: Network,
    pub horizon_url: String,
    pub soroban_rpc_url: String,
    pub network_passphrase: String,
    pub contracts: ContractAddresses,

    // Transaction bounds
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,

    // Finality polling after submission
    pub wait_for_finality: bool,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,

    pub log_level: String,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        let network = Network::Testnet;
        Self {
            network,
            horizon_url: network.default_horizon_url().into(),
            soroban_rpc_url: network.default_soroban_rpc_url().into(),
            network_passphrase: network.passphrase().into(),
            contracts: ContractAddresses::default(),
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT_SECS,
            wait_for_finality: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            log_level: "info".into(),
        }
    }
}

impl LaunchpadConfig {
    /// Returns the base config directory: `~/.launchpad/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".launchpad"))
    }

    /// Returns the config file path: `~/.launchpad/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.launchpad/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Returns the persisted session path: `~/.launchpad/session.json`
    pub fn session_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("session.json"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        for dir in [Self::base_dir()?, Self::logs_dir()?] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk (creating the default file if missing), applies
    /// environment overrides and validates the endpoints.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        let mut config = Self::load_from_path(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self =
                serde_json::from_str(&content).with_context(|| "Failed to parse config.json")?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Switch network and reset the endpoints and passphrase to its defaults.
    pub fn set_network(&mut self, network: Network) {
        self.network = network;
        self.horizon_url = network.default_horizon_url().into();
        self.soroban_rpc_url = network.default_soroban_rpc_url().into();
        self.network_passphrase = network.passphrase().into();
    }

    /// Overlay values from the environment. `lookup` is normally
    /// `std::env::var`; tests pass a map instead.
    ///
    /// The network is applied first so that explicit endpoint variables win
    /// over the network defaults. Empty values are treated as unset.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(raw) = get(ENV_NETWORK) {
            match raw.parse::<Network>() {
                Ok(network) => self.set_network(network),
                Err(e) => warn!("Ignoring {ENV_NETWORK}: {e}"),
            }
        }
        if let Some(url) = get(ENV_HORIZON_URL) {
            self.horizon_url = url;
        }
        if let Some(url) = get(ENV_SOROBAN_RPC_URL) {
            self.soroban_rpc_url = url;
        }
        if let Some(passphrase) = get(ENV_NETWORK_PASSPHRASE) {
            self.network_passphrase = passphrase;
        }
        if let Some(id) = get(ENV_TOKEN_FACTORY) {
            self.contracts.token_factory = Some(id);
        }
        if let Some(id) = get(ENV_DEX) {
            self.contracts.dex = Some(id);
        }
        if let Some(id) = get(ENV_AMM) {
            self.contracts.amm = Some(id);
        }
        if let Some(id) = get(ENV_BONDING_CURVE) {
            self.contracts.bonding_curve = Some(id);
        }
        if let Some(level) = get(ENV_LOG) {
            self.log_level = level;
        }
    }

    /// Reject configurations whose endpoints cannot be used.
    pub fn validate(&self) -> Result<()> {
        if !validate_url(&self.horizon_url) {
            anyhow::bail!("invalid Horizon URL: {}", self.horizon_url);
        }
        if !validate_url(&self.soroban_rpc_url) {
            anyhow::bail!("invalid Soroban RPC URL: {}", self.soroban_rpc_url);
        }
        if self.network_passphrase.is_empty() {
            anyhow::bail!("network passphrase must not be empty");
        }
        if self.poll_max_attempts == 0 {
            anyhow::bail!("poll_max_attempts must be at least 1");
        }
        Ok(())
    }

    /// Report which of the core contracts (token factory, DEX) are unset.
    pub fn validate_contracts(&self) -> ContractValidation {
        let mut missing = Vec::new();
        if is_unset(&self.contracts.token_factory) {
            missing.push("Token Factory");
        }
        if is_unset(&self.contracts.dex) {
            missing.push("DEX");
        }
        ContractValidation {
            is_valid: missing.is_empty(),
            missing,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn is_unset(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}
