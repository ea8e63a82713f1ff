//! Command-line interface for the `launchpad` binary.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "launchpad")]
#[command(about = "Launchpad client - tokens, order book, AMM pools and bonding curves", long_about = None)]
#[command(version, arg_required_else_help = true)]
pub struct Cli {
    /// Account contract reads are simulated from (default: last connected wallet)
    #[arg(long, global = true, value_name = "G...")]
    pub source: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List every token from the token factory
    Tokens,

    /// Show one token
    Token {
        /// Token id
        id: u32,
    },

    /// Tokens deployed by an account
    Creator {
        /// Creator address
        address: String,
    },

    /// Open orders for a token contract
    Orders {
        /// Token contract address
        token: String,

        /// Include filled and cancelled orders
        #[arg(long = "all")]
        include_inactive: bool,
    },

    /// Orders placed by an account
    UserOrders {
        /// Account address
        address: String,
    },

    /// AMM pools with price and market cap
    Pools,

    /// Tokens received for an XLM amount
    Quote {
        /// Pool id
        pool_id: u64,

        /// XLM amount to swap
        xlm: f64,
    },

    /// Bonding-curve tokens with price and market cap
    Bonding,

    /// Classic account balances
    Balance {
        /// Account address
        address: String,
    },

    /// Show endpoints and contract configuration
    CheckConfig,

    /// Decode a base64 SCVal or transaction envelope
    Decode {
        /// Base64 XDR
        xdr: String,
    },
}

impl Command {
    /// Whether the command simulates contract calls and so needs a source.
    pub fn reads_contracts(&self) -> bool {
        matches!(
            self,
            Command::Tokens
                | Command::Token { .. }
                | Command::Creator { .. }
                | Command::Orders { .. }
                | Command::UserOrders { .. }
                | Command::Pools
                | Command::Quote { .. }
                | Command::Bonding
        )
    }
}
