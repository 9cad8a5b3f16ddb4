use std::path::PathBuf;

use bitcoin::Network;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::logging;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[clap(
    author = "Blockstack",
    version = "0.1.0",
    about = "Blockstack operations",
    long_about = r#"Funds, signs and broadcasts Blockstack bitcoin transactions"#
)]
pub struct Cli {
    #[clap(flatten)]
    pub config: Config,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
pub struct Config {
    #[clap(
        long,
        env = "LOG_FORMAT",
        help = "Log format (plain, json)",
        default_value = "plain"
    )]
    pub log_format: logging::Format,

    #[clap(
        long,
        env = "BITCOIN_RPC_URL",
        help = "URL of the Bitcoin RPC server (e.g., http://localhost:8332)",
        default_value = "http://127.0.0.1:8332"
    )]
    pub bitcoin_rpc_url: String,

    #[clap(
        long,
        env = "BITCOIN_RPC_USER",
        help = "User for Bitcoin RPC authentication",
        default_value = "rpc"
    )]
    pub bitcoin_rpc_user: String,

    #[clap(
        long,
        env = "BITCOIN_RPC_PASSWORD",
        help = "Password for Bitcoin RPC authentication",
        default_value = "rpc"
    )]
    pub bitcoin_rpc_password: String,

    #[clap(
        long,
        env = "NETWORK",
        help = "Bitcoin network of the payment key and addresses",
        default_value = "bitcoin"
    )]
    pub network: Network,

    #[clap(
        long,
        env = "CONF_TARGET",
        help = "Confirmation target in blocks for fee estimation",
        default_value = "6"
    )]
    pub conf_target: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum Command {
    /// Decode a base40 string into hex
    DecodeB40 { input: String },
    /// Encode a hex string into base40
    EncodeB40 { hex: String },
    /// Print the hash160 of hex encoded data
    Hash160 { hex: String },
    /// Pay an address from the UTXOs of a P2PKH payment key
    Spend {
        #[clap(long, help = "Destination address")]
        to: String,

        #[clap(long, help = "Amount in satoshis, fees are deducted from it")]
        amount: u64,

        #[clap(
            long,
            env = "PAYMENT_KEY_PATH",
            help = "Full path to a file holding the WIF payment key"
        )]
        payment_key_path: PathBuf,

        #[clap(long, help = "Fee rate in sat/vB, estimated by the node when omitted")]
        fee_rate: Option<u64>,

        #[clap(long, help = "Broadcast the signed transaction")]
        broadcast: bool,
    },
}
