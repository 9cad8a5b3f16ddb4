use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::Result;
use bitcoin::{Amount, FeeRate};
use blockstack_ops::{
    bitcoin_client::{Error as RpcError, UtxoSource, types::UnspentOutput},
    operations::{
        PubkeyHashSigner, SpendInputs, TransactionSigner, Utxo, build_bitcoin_spend, sign_inputs,
    },
    retry::retry,
    test_utils::{MockUtxoSource, mock_txid, mock_utxo, test_private_key},
};
use tokio_util::sync::CancellationToken;

#[test]
fn test_utxo_json_shape() -> Result<()> {
    let utxo = mock_utxo(7, 12_345);
    let json = serde_json::to_value(&utxo)?;
    assert_eq!(json["value"], 12_345);
    assert_eq!(json["tx_output_n"], 0);
    assert_eq!(json["tx_hash"], mock_txid(7).to_string());
    assert!(json.get("confirmations").is_none());

    let parsed: Utxo = serde_json::from_value(json)?;
    assert_eq!(parsed, utxo);
    Ok(())
}

#[test]
fn test_unspent_output_conversion() -> Result<()> {
    let unspent: UnspentOutput = serde_json::from_value(serde_json::json!({
        "txid": mock_txid(3).to_string(),
        "vout": 2,
        "address": "mipcBbFg9gMiCh81Kj8tqqdgoZub1ZJRfn",
        "scriptPubKey": "76a914243f1394f44554f4ce3fd68649c19adc483ce92488ac",
        "amount": 0.0005,
        "confirmations": 12,
        "spendable": false,
    }))?;
    let utxo = Utxo::from(unspent);
    assert_eq!(utxo.value, Amount::from_sat(50_000));
    assert_eq!(utxo.outpoint(), bitcoin::OutPoint::new(mock_txid(3), 2));
    assert_eq!(utxo.confirmations, Some(12));
    Ok(())
}

#[tokio::test]
async fn test_spend_from_source() -> Result<()> {
    let signer = PubkeyHashSigner::new(test_private_key(1));
    let payer = signer.address().await?;
    let recipient = PubkeyHashSigner::new(test_private_key(2)).address().await?;

    let source = MockUtxoSource::new(FeeRate::from_sat_per_vb(2));
    source.add_utxos(&payer, vec![mock_utxo(1, 40_000), mock_utxo(2, 80_000)]);

    let utxos = source.get_utxos(&payer).await?;
    assert_eq!(utxos.len(), 2);
    assert!(source.get_utxos(&recipient).await?.is_empty());

    let mut tx = build_bitcoin_spend(
        SpendInputs::builder()
            .destination(recipient.script_pubkey())
            .change(payer.script_pubkey())
            .utxos(utxos)
            .amount(Amount::from_sat(60_000))
            .fee_rate(source.get_fee_rate().await?)
            .build(),
    )?;
    sign_inputs(&mut tx, &signer, &[]).await?;

    let txid = source.broadcast_transaction(&tx).await?;
    assert_eq!(txid, tx.compute_txid());
    assert_eq!(source.broadcasts(), vec![tx.clone()]);
    assert_eq!(tx.input.len(), 1);
    assert_eq!(tx.input[0].previous_output.txid, mock_txid(2));
    // (10 + 148 + 34 + 34) vbytes at 2 sat/vB
    assert_eq!(tx.output[0].value, Amount::from_sat(60_000 - 452));
    assert_eq!(tx.output[1].value, Amount::from_sat(20_000));
    Ok(())
}

#[tokio::test]
async fn test_missing_fee_estimate() {
    let source = MockUtxoSource::new(None);
    assert!(matches!(
        source.get_fee_rate().await,
        Err(RpcError::NoFeeEstimate(_))
    ));
}

#[tokio::test]
async fn test_rpc_errors_are_not_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let result: Result<Vec<Utxo>> = retry(
        || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RpcError::BitcoinRpc {
                    code: -5,
                    message: "Invalid address".to_string(),
                })
            }
        },
        "get_utxos",
        CancellationToken::new(),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_http_errors_are_retried() -> Result<()> {
    let attempts = Arc::new(AtomicUsize::new(0));
    let fee_rate = retry(
        || {
            let attempts = attempts.clone();
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    let error = reqwest::Client::new()
                        .get("not a url")
                        .build()
                        .expect_err("url should not parse");
                    return Err(RpcError::Http(error));
                }
                Ok(FeeRate::from_sat_per_vb_unchecked(3))
            }
        },
        "get_fee_rate",
        CancellationToken::new(),
    )
    .await?;

    assert_eq!(fee_rate, FeeRate::from_sat_per_vb_unchecked(3));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_cancel_abandons_hung_request() -> Result<()> {
    let cancel_token = CancellationToken::new();
    let canceller = cancel_token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result: Result<FeeRate> = tokio::time::timeout(
        Duration::from_secs(5),
        retry(
            std::future::pending::<Result<FeeRate, RpcError>>,
            "get_fee_rate",
            cancel_token,
        ),
    )
    .await?;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_token_skips_request() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let cancel_token = CancellationToken::new();
    cancel_token.cancel();

    let result: Result<FeeRate> = retry(
        || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok(FeeRate::ZERO)
            }
        },
        "get_fee_rate",
        cancel_token,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}
