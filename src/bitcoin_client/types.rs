use bitcoin::{Amount, Txid};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operations::Utxo;

#[derive(Serialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    pub params: Vec<Value>,
}

#[derive(Deserialize, Debug)]
pub struct Response {
    pub result: Option<Value>,
    pub error: Option<Value>,
    pub id: String,
}

/// Entry of a `listunspent` result; amounts are denominated in BTC.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UnspentOutput {
    pub txid: Txid,
    pub vout: u32,
    pub address: Option<String>,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: String,
    #[serde(with = "bitcoin::amount::serde::as_btc")]
    pub amount: Amount,
    pub confirmations: u32,
    #[serde(default)]
    pub spendable: bool,
}

impl From<UnspentOutput> for Utxo {
    fn from(unspent: UnspentOutput) -> Self {
        Utxo {
            value: unspent.amount,
            tx_hash: unspent.txid,
            tx_output_n: unspent.vout,
            confirmations: Some(unspent.confirmations),
        }
    }
}

/// Result of `estimatesmartfee`; `feerate` is in BTC/kvB.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EstimateSmartFeeResult {
    pub feerate: Option<f64>,
    pub errors: Option<Vec<String>>,
    pub blocks: u32,
}
