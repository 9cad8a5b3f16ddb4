use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use bitcoin::{
    Address, Amount, FeeRate, Network, PrivateKey, Transaction, Txid, absolute::LockTime,
    hashes::Hash, script::Builder, secp256k1::SecretKey, transaction::Version,
};

use crate::bitcoin_client::{Error as RpcError, UtxoSource};
use crate::error::Result;
use crate::operations::{TransactionSigner, Utxo};

pub fn mock_txid(txid_num: u32) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0..4].copy_from_slice(&txid_num.to_le_bytes());
    Txid::from_byte_array(bytes)
}

pub fn mock_utxo(txid_num: u32, value: u64) -> Utxo {
    Utxo::builder()
        .value(Amount::from_sat(value))
        .tx_hash(mock_txid(txid_num))
        .tx_output_n(0)
        .build()
}

pub fn empty_transaction() -> Transaction {
    Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: vec![],
        output: vec![],
    }
}

/// Deterministic regtest key; `seed` must be non-zero.
pub fn test_private_key(seed: u8) -> PrivateKey {
    let secret = SecretKey::from_slice(&[seed; 32]).unwrap();
    PrivateKey::new(secret, Network::Regtest)
}

#[derive(Clone, Debug)]
pub struct MockUtxoSource {
    utxos: Arc<Mutex<HashMap<String, Vec<Utxo>>>>,
    fee_rate: Option<FeeRate>,
    broadcasts: Arc<Mutex<Vec<Transaction>>>,
}

impl MockUtxoSource {
    pub fn new(fee_rate: Option<FeeRate>) -> Self {
        Self {
            utxos: Arc::new(Mutex::new(HashMap::new())),
            fee_rate,
            broadcasts: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn add_utxos(&self, address: &Address, utxos: Vec<Utxo>) {
        self.utxos
            .lock()
            .unwrap()
            .entry(address.to_string())
            .or_default()
            .extend(utxos);
    }

    pub fn broadcasts(&self) -> Vec<Transaction> {
        self.broadcasts.lock().unwrap().clone()
    }
}

impl UtxoSource for MockUtxoSource {
    async fn get_utxos(&self, address: &Address) -> Result<Vec<Utxo>, RpcError> {
        Ok(self
            .utxos
            .lock()
            .unwrap()
            .get(&address.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn get_fee_rate(&self) -> Result<FeeRate, RpcError> {
        self.fee_rate
            .ok_or_else(|| RpcError::NoFeeEstimate("Insufficient data or no feerate found".into()))
    }

    async fn broadcast_transaction(&self, tx: &Transaction) -> Result<Txid, RpcError> {
        self.broadcasts.lock().unwrap().push(tx.clone());
        Ok(tx.compute_txid())
    }
}

/// Signer that records the order it is invoked in and stamps each input's
/// script_sig with its name.
#[derive(Clone, Debug)]
pub struct RecordingSigner {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<(usize, &'static str)>>>,
}

impl RecordingSigner {
    pub fn new(name: &'static str, log: Arc<Mutex<Vec<(usize, &'static str)>>>) -> Self {
        Self { name, log }
    }
}

#[async_trait]
impl TransactionSigner for RecordingSigner {
    async fn address(&self) -> Result<Address> {
        Err(anyhow!("{} has no address", self.name).into())
    }

    async fn sign_transaction(&self, tx: &mut Transaction, input_index: usize) -> Result<()> {
        self.log.lock().unwrap().push((input_index, self.name));
        tokio::task::yield_now().await;
        tx.input[input_index].script_sig = Builder::new()
            .push_slice(<&bitcoin::script::PushBytes>::try_from(self.name.as_bytes()).unwrap())
            .into_script();
        Ok(())
    }

    fn signer_version(&self) -> u32 {
        0
    }
}

#[derive(Clone, Debug)]
pub struct FailingSigner;

#[async_trait]
impl TransactionSigner for FailingSigner {
    async fn address(&self) -> Result<Address> {
        Err(anyhow!("device unavailable").into())
    }

    async fn sign_transaction(&self, _tx: &mut Transaction, input_index: usize) -> Result<()> {
        Err(anyhow!("device rejected input {}", input_index).into())
    }

    fn signer_version(&self) -> u32 {
        0
    }
}
