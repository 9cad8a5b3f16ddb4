use bitcoin::{
    Amount, FeeRate, ScriptBuf, Transaction, TxOut, absolute::LockTime, transaction::Version,
};
use bon::Builder;
use tracing::{info, warn};

use crate::error::{Error, Result};

use super::{DUST_MINIMUM, add_utxos_to_fund, estimate::estimate_tx_bytes, utxo::Utxo};

#[derive(Debug, Clone, Builder)]
pub struct SpendInputs {
    pub destination: ScriptBuf,
    pub change: ScriptBuf,
    pub utxos: Vec<Utxo>,
    pub amount: Amount,
    pub fee_rate: FeeRate,
}

fn fee_for(tx: &Transaction, additional_outputs: usize, fee_rate: FeeRate) -> Result<Amount> {
    fee_rate
        .fee_vb(estimate_tx_bytes(tx, 0, additional_outputs))
        .ok_or(Error::FeeOverflow)
}

/// Builds an unsigned payment of `amount` to `destination`, paying fees out
/// of the sent amount.
///
/// If the UTXOs cannot cover `amount`, everything they hold is sent instead.
/// A change output is only added when the change is worth more than the fee
/// of carrying it.
pub fn build_bitcoin_spend(params: SpendInputs) -> Result<Transaction> {
    let mut tx = Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: vec![],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: params.destination,
        }],
    };

    let mut amount = params.amount;
    let change = match add_utxos_to_fund(&mut tx, &params.utxos, amount, params.fee_rate, false) {
        Ok(change) => change,
        Err(Error::NotEnoughFunds { left_to_fund }) => {
            warn!(
                "Cannot fund {}, sending {} less",
                params.amount, left_to_fund
            );
            amount = amount.checked_sub(left_to_fund).unwrap_or(Amount::ZERO);
            Amount::ZERO
        }
        Err(e) => return Err(e),
    };

    let mut fees = fee_for(&tx, 0, params.fee_rate)?;
    let fee_for_change = fee_for(&tx, 1, params.fee_rate)? - fees;
    if change > fee_for_change {
        fees += fee_for_change;
        tx.output.push(TxOut {
            value: change,
            script_pubkey: params.change,
        });
    }

    let output_amount = amount
        .checked_sub(fees)
        .filter(|value| *value >= DUST_MINIMUM)
        .ok_or(Error::InvalidAmount {
            fees,
            specified: amount,
        })?;
    tx.output[0].value = output_amount;
    info!(
        "Built spend of {} with {} inputs, fees {}",
        output_amount,
        tx.input.len(),
        fees
    );
    Ok(tx)
}
