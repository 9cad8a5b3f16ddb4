use std::sync::{Arc, Mutex};

use anyhow::Result;
use bitcoin::{
    Address, Amount, EcdsaSighashType, Network, PublicKey, Transaction, TxOut, ecdsa,
    hashes::Hash,
    script::Instruction,
    secp256k1::{Message, Secp256k1},
    sighash::SighashCache,
};
use blockstack_ops::{
    Error,
    operations::{PubkeyHashSigner, TransactionSigner, estimate_tx_bytes, sign_inputs},
    test_utils::{
        FailingSigner, RecordingSigner, empty_transaction, mock_utxo, test_private_key,
    },
};

fn transaction_with_inputs(count: u32) -> Transaction {
    let mut tx = empty_transaction();
    for i in 0..count {
        tx.input.push(mock_utxo(i + 1, 10_000).to_txin());
    }
    tx.output.push(TxOut {
        value: Amount::from_sat(5_000),
        script_pubkey: PubkeyHashSigner::new(test_private_key(9)).script_pubkey(),
    });
    tx
}

#[tokio::test]
async fn test_overrides_are_signed_in_index_order() -> Result<()> {
    let log = Arc::new(Mutex::new(vec![]));
    let default_signer = RecordingSigner::new("default", log.clone());
    let override_signer = RecordingSigner::new("override", log.clone());
    let mut tx = transaction_with_inputs(3);

    let overrides: [(usize, &dyn TransactionSigner); 1] = [(1, &override_signer)];
    sign_inputs(&mut tx, &default_signer, &overrides).await?;

    assert_eq!(
        *log.lock().unwrap(),
        vec![(0, "default"), (1, "override"), (2, "default")]
    );
    assert!(tx.input.iter().all(|input| !input.script_sig.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_signer_failure_stops_signing() {
    let log = Arc::new(Mutex::new(vec![]));
    let default_signer = RecordingSigner::new("default", log.clone());
    let mut tx = transaction_with_inputs(3);

    let overrides: [(usize, &dyn TransactionSigner); 1] = [(1, &FailingSigner)];
    let result = sign_inputs(&mut tx, &default_signer, &overrides).await;

    match result {
        Err(Error::Signer(e)) => assert_eq!(e.to_string(), "device rejected input 1"),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(*log.lock().unwrap(), vec![(0, "default")]);
    assert!(!tx.input[0].script_sig.is_empty());
    assert!(tx.input[1].script_sig.is_empty());
    assert!(tx.input[2].script_sig.is_empty());
}

#[tokio::test]
async fn test_override_outside_inputs_is_rejected() {
    let log = Arc::new(Mutex::new(vec![]));
    let default_signer = RecordingSigner::new("default", log.clone());
    let mut tx = transaction_with_inputs(3);

    let overrides: [(usize, &dyn TransactionSigner); 1] = [(5, &FailingSigner)];
    let result = sign_inputs(&mut tx, &default_signer, &overrides).await;

    assert!(matches!(
        result,
        Err(Error::SignerIndexOutOfRange { index: 5, inputs: 3 })
    ));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_pubkey_hash_signer_produces_valid_signatures() -> Result<()> {
    let signer = PubkeyHashSigner::new(test_private_key(1));
    let mut tx = transaction_with_inputs(2);
    let unsigned = tx.clone();

    sign_inputs(&mut tx, &signer, &[]).await?;

    let secp = Secp256k1::verification_only();
    for (index, input) in tx.input.iter().enumerate() {
        let pushes: Vec<Vec<u8>> = input
            .script_sig
            .instructions()
            .map(|instruction| match instruction.unwrap() {
                Instruction::PushBytes(bytes) => bytes.as_bytes().to_vec(),
                Instruction::Op(op) => panic!("unexpected opcode {}", op),
            })
            .collect();
        assert_eq!(pushes.len(), 2);

        let signature = ecdsa::Signature::from_slice(&pushes[0])?;
        assert_eq!(signature.sighash_type, EcdsaSighashType::All);
        let public_key = PublicKey::from_slice(&pushes[1])?;
        assert_eq!(&public_key, signer.public_key());

        let sighash = SighashCache::new(&unsigned).legacy_signature_hash(
            index,
            &signer.script_pubkey(),
            EcdsaSighashType::All.to_u32(),
        )?;
        let message = Message::from_digest(sighash.to_byte_array());
        secp.verify_ecdsa(&message, &signature.signature, &public_key.inner)?;
    }

    let expected_size = 10
        + tx
            .input
            .iter()
            .map(|input| 41 + input.script_sig.len() as u64)
            .sum::<u64>()
        + 34;
    assert_eq!(estimate_tx_bytes(&tx, 0, 0), expected_size);
    Ok(())
}

#[tokio::test]
async fn test_pubkey_hash_signer_address() -> Result<()> {
    let signer = PubkeyHashSigner::new(test_private_key(1));
    let address = signer.address().await?;
    assert_eq!(address, Address::p2pkh(*signer.public_key(), Network::Regtest));
    assert_eq!(address.script_pubkey(), signer.script_pubkey());
    assert_eq!(signer.signer_version(), 1);

    let wif = test_private_key(1).to_wif();
    let from_wif = PubkeyHashSigner::from_wif(&wif)?;
    assert_eq!(from_wif.public_key(), signer.public_key());
    assert!(matches!(
        PubkeyHashSigner::from_wif("not a key"),
        Err(Error::InvalidKey(_))
    ));
    Ok(())
}
