use bitcoin::{Amount, OutPoint, TxIn, Txid};
use bon::Builder;
use serde::{Deserialize, Serialize};

/// An unspent output as reported by a UTXO provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct Utxo {
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,
    pub tx_hash: Txid,
    pub tx_output_n: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u32>,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.tx_hash, self.tx_output_n)
    }

    /// Unsigned input spending this output, as appended by the funder.
    pub fn to_txin(&self) -> TxIn {
        TxIn {
            previous_output: self.outpoint(),
            ..Default::default()
        }
    }
}
