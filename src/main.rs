use std::fs;

use anyhow::{Result, anyhow};
use bitcoin::{
    Address, Amount, FeeRate, address::NetworkUnchecked, consensus::encode::serialize_hex,
};
use blockstack_ops::{
    base40,
    bitcoin_client::{self, UtxoSource},
    config::{Cli, Command, Config},
    hashing, logging,
    operations::{
        PubkeyHashSigner, SpendInputs, TransactionSigner, build_bitcoin_spend, sign_inputs,
    },
    retry::retry,
    stopper,
};
use clap::Parser;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

async fn spend(
    config: &Config,
    to: &str,
    amount: u64,
    payment_key: &str,
    fee_rate: Option<u64>,
    broadcast: bool,
    cancel_token: CancellationToken,
) -> Result<()> {
    let bitcoin = bitcoin_client::Client::new_from_config(config)?;
    let signer = PubkeyHashSigner::from_wif(payment_key.trim())?;
    let destination = to
        .parse::<Address<NetworkUnchecked>>()?
        .require_network(config.network)?;
    let change_address = signer.address().await?;
    info!("Paying {} sat to {} from {}", amount, destination, change_address);

    let utxos = retry(
        || bitcoin.get_utxos(&change_address),
        "get_utxos",
        cancel_token.clone(),
    )
    .await?;
    let fee_rate = match fee_rate {
        Some(sat_per_vb) => {
            FeeRate::from_sat_per_vb(sat_per_vb).ok_or(anyhow!("Invalid fee rate"))?
        }
        None => retry(|| bitcoin.get_fee_rate(), "get_fee_rate", cancel_token.clone()).await?,
    };

    let mut tx = build_bitcoin_spend(
        SpendInputs::builder()
            .destination(destination.script_pubkey())
            .change(change_address.script_pubkey())
            .utxos(utxos)
            .amount(Amount::from_sat(amount))
            .fee_rate(fee_rate)
            .build(),
    )?;
    sign_inputs(&mut tx, &signer, &[]).await?;

    if broadcast {
        let txid = retry(
            || bitcoin.broadcast_transaction(&tx),
            "broadcast_transaction",
            cancel_token,
        )
        .await?;
        info!("Broadcast {}", txid);
    }
    println!("{}", serialize_hex(&tx));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::try_parse()?;
    logging::setup(cli.config.log_format);

    match &cli.command {
        Command::DecodeB40 { input } => println!("{}", base40::decode_b40(input)?),
        Command::EncodeB40 { hex } => println!("{}", base40::encode_b40(hex)?),
        Command::Hash160 { hex: data } => {
            println!("{}", hex::encode(hashing::hash160(&hex::decode(data)?)))
        }
        Command::Spend {
            to,
            amount,
            payment_key_path,
            fee_rate,
            broadcast,
        } => {
            let cancel_token = CancellationToken::new();
            let stopper_handle = stopper::run(cancel_token.clone());
            let payment_key = fs::read_to_string(payment_key_path)?;
            let result = select! {
                biased;
                _ = cancel_token.cancelled() => Err(anyhow!("Cancelled")),
                result = spend(
                    &cli.config,
                    to,
                    *amount,
                    &payment_key,
                    *fee_rate,
                    *broadcast,
                    cancel_token.clone(),
                ) => result,
            };
            cancel_token.cancel();
            let _ = stopper_handle.await;
            result?;
        }
    }
    Ok(())
}
