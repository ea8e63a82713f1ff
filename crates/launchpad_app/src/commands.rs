//! Read-only commands over the launchpad services.

use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use serde::Serialize;
use tracing::debug;

use launchpad_chain::amount::{
    DEFAULT_DECIMALS, format_address, format_base_units, format_date, timestamp_from_secs,
    to_base_units_f64,
};
use launchpad_chain::transaction::decode_invocation;
use launchpad_chain::{
    AccountId, AmmService, BalanceService, BondingCurveService, ContractClient, ContractKind,
    DexService, HorizonClient, HttpSorobanRpc, ScVal, TokenFactoryService, WalletSession,
};
use launchpad_core::{LaunchpadConfig, SessionState};

use crate::cli::Command;

pub struct Context {
    config: LaunchpadConfig,
    client: Arc<ContractClient>,
    balances: BalanceService,
}

impl Context {
    pub fn build(config: LaunchpadConfig, source: Option<&str>, command: &Command) -> Result<Self> {
        let rpc = HttpSorobanRpc::new(&config.soroban_rpc_url, config.read_timeout())
            .context("Failed to create Soroban RPC client")?;
        let horizon = HorizonClient::new(&config.horizon_url, config.read_timeout())
            .context("Failed to create Horizon client")?;
        let client = ContractClient::new(&config, Arc::new(rpc));

        if command.reads_contracts() {
            let key = match source {
                Some(key) => key.to_string(),
                None => SessionState::load()?.wallet_public_key.context(
                    "no source account: pass --source <G...> or connect a wallet first",
                )?,
            };
            let account: AccountId = key
                .parse()
                .with_context(|| format!("invalid source account: {key}"))?;
            debug!(source = %account, "simulating from source account");
            client.set_session(WalletSession::restored(account));
        }

        Ok(Self {
            config,
            client: Arc::new(client),
            balances: BalanceService::new(Arc::new(horizon)),
        })
    }
}

/// Pretty JSON text. Serializes straight to text so i128 amounts beyond the
/// u64 range are written as plain integers.
fn render_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", render_json(value)?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct QuoteReport {
    pool_id: u64,
    xlm_in: i128,
    tokens_out: i128,
}

fn xlm(stroops: i128) -> String {
    format!("{} XLM", format_base_units(stroops, DEFAULT_DECIMALS))
}

pub async fn execute(ctx: &Context, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Tokens => {
            let tokens = TokenFactoryService::new(ctx.client.clone())
                .get_all_tokens()
                .await;
            if json {
                return print_json(&tokens);
            }
            if tokens.is_empty() {
                println!("No tokens found");
            }
            for t in &tokens {
                println!(
                    "#{:<4} {:<8} {:<24} supply {:>20}  creator {}",
                    t.token_id,
                    t.symbol,
                    t.name,
                    format_base_units(t.total_supply, t.decimals),
                    format_address(&t.creator, 4, 4),
                );
            }
        }
        Command::Token { id } => {
            let token = TokenFactoryService::new(ctx.client.clone())
                .get_token_info(id)
                .await
                .with_context(|| format!("token {id} not found"))?;
            if json {
                return print_json(&token);
            }
            println!("Token #{}: {} ({})", token.token_id, token.name, token.symbol);
            println!("  decimals:     {}", token.decimals);
            println!("  total supply: {}", format_base_units(token.total_supply, token.decimals));
            println!("  creator:      {}", token.creator);
            println!("  contract:     {}", token.contract_address);
            println!("  created:      {}", format_date(timestamp_from_secs(token.created_at)));
        }
        Command::Creator { address } => {
            let tokens = TokenFactoryService::new(ctx.client.clone())
                .get_creator_tokens(&address)
                .await;
            if json {
                return print_json(&tokens);
            }
            println!("{} token(s) created by {}", tokens.len(), format_address(&address, 6, 4));
            for t in &tokens {
                println!("  #{:<4} {:<8} {}", t.token_id, t.symbol, t.name);
            }
        }
        Command::Orders {
            token,
            include_inactive,
        } => {
            let dex = DexService::new(ctx.client.clone());
            let orders = if include_inactive {
                dex.get_token_orders(&token).await
            } else {
                dex.active_order_book(&token).await
            };
            if json {
                return print_json(&orders);
            }
            if orders.is_empty() {
                println!("No orders found");
            }
            for o in &orders {
                println!(
                    "#{:<5} {:>20} @ {:<18} seller {}{}",
                    o.order_id,
                    format_base_units(o.amount, DEFAULT_DECIMALS),
                    xlm(o.price_per_token),
                    format_address(&o.seller, 4, 4),
                    if o.is_active { "" } else { "  (closed)" },
                );
            }
        }
        Command::UserOrders { address } => {
            let orders = DexService::new(ctx.client.clone())
                .get_user_orders(&address)
                .await;
            if json {
                return print_json(&orders);
            }
            for o in &orders {
                println!(
                    "#{:<5} {:>20} @ {:<18} {}",
                    o.order_id,
                    format_base_units(o.amount, DEFAULT_DECIMALS),
                    xlm(o.price_per_token),
                    if o.is_active { "open" } else { "closed" },
                );
            }
        }
        Command::Pools => {
            let pools = AmmService::new(ctx.client.clone()).get_all_pools().await;
            if json {
                return print_json(&pools);
            }
            if pools.is_empty() {
                println!("No pools found");
            }
            for p in &pools {
                println!(
                    "#{:<4} {:<8} reserves {} / {}  price {}  mcap {}",
                    p.pool.pool_id,
                    p.pool.token_symbol,
                    format_base_units(p.pool.token_reserve, DEFAULT_DECIMALS),
                    xlm(p.pool.xlm_reserve),
                    xlm(p.price),
                    xlm(p.market_cap),
                );
            }
        }
        Command::Quote { pool_id, xlm: amount } => {
            let stroops = to_base_units_f64(amount, DEFAULT_DECIMALS)
                .with_context(|| format!("invalid XLM amount: {amount}"))?;
            let out = AmmService::new(ctx.client.clone())
                .quote_swap_xlm_to_tokens(pool_id, stroops)
                .await;
            if json {
                return print_json(&QuoteReport {
                    pool_id,
                    xlm_in: stroops,
                    tokens_out: out,
                });
            }
            println!("{} -> {} tokens", xlm(stroops), format_base_units(out, DEFAULT_DECIMALS));
        }
        Command::Bonding => {
            let tokens = BondingCurveService::new(ctx.client.clone())
                .get_all_tokens()
                .await;
            if json {
                return print_json(&tokens);
            }
            if tokens.is_empty() {
                println!("No bonding-curve tokens found");
            }
            for t in &tokens {
                println!(
                    "#{:<4} {:<8} sold {} / {}  price {}  mcap {}",
                    t.token.token_id,
                    t.token.symbol,
                    format_base_units(t.token.current_supply, DEFAULT_DECIMALS),
                    format_base_units(t.token.total_supply, DEFAULT_DECIMALS),
                    xlm(t.price),
                    xlm(t.market_cap),
                );
            }
        }
        Command::Balance { address } => {
            let balances = ctx.balances.all_balances(&address).await;
            if json {
                return print_json(&balances);
            }
            if balances.is_empty() {
                println!("No balances (account missing or unreachable)");
            }
            for b in &balances {
                println!(
                    "{:<12} {:>24}  {}",
                    b.asset,
                    format_base_units(b.balance, DEFAULT_DECIMALS),
                    b.issuer.as_deref().map(|i| format_address(i, 4, 4)).unwrap_or_default(),
                );
            }
        }
        Command::CheckConfig => check_config(ctx, json)?,
        Command::Decode { xdr } => decode(&xdr)?,
    }
    Ok(())
}

fn check_config(ctx: &Context, json: bool) -> Result<()> {
    let config = &ctx.config;
    let validation = config.validate_contracts();
    if json {
        return print_json(&serde_json::json!({
            "network": config.network.label(),
            "horizon_url": config.horizon_url,
            "soroban_rpc_url": config.soroban_rpc_url,
            "network_passphrase": config.network_passphrase,
            "contracts": config.contracts,
            "missing": validation.missing,
        }));
    }

    println!("network:    {}", config.network.label());
    println!("horizon:    {}", config.horizon_url);
    println!("soroban:    {}", config.soroban_rpc_url);
    println!("passphrase: {}", config.network_passphrase);
    for kind in ContractKind::ALL {
        let status = match ctx.client.contract_id(kind) {
            Ok(id) => id.to_string(),
            Err(_) => "not configured".to_string(),
        };
        println!("{:<14} {}", format!("{kind}:"), status);
    }
    if !validation.is_valid {
        bail!("missing contract addresses: {}", validation.missing.join(", "));
    }
    Ok(())
}

fn decode(xdr: &str) -> Result<()> {
    if let Ok(value) = ScVal::from_xdr_base64(xdr) {
        return print_json(&value.to_json());
    }
    let call = decode_invocation(xdr).context("not a base64 SCVal or contract-call envelope")?;
    let args: Vec<_> = call.args.iter().map(ScVal::to_json).collect();
    print_json(&serde_json::json!({
        "contract": call.contract.to_string(),
        "function": call.function,
        "args": args,
    }))
}
