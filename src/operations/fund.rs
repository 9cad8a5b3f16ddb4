use bitcoin::{Amount, FeeRate, Transaction};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::{estimate::estimate_tx_bytes, utxo::Utxo};

/// Fee incurred by appending one more P2PKH input to `tx` at `fee_rate`.
pub fn marginal_input_fee(tx: &Transaction, fee_rate: FeeRate) -> Result<Amount> {
    let delta = estimate_tx_bytes(tx, 1, 0) - estimate_tx_bytes(tx, 0, 0);
    fee_rate.fee_vb(delta).ok_or(Error::FeeOverflow)
}

/// Appends inputs from `utxos` to `tx` until `amount_to_fund` is covered and
/// returns the leftover change.
///
/// When `fund_new_fees` is set, the fee of every appended input is funded as
/// well and deducted from the change. Prefers the smallest single UTXO that
/// covers the remaining target; otherwise consumes the largest UTXO and keeps
/// going with what is still owed.
///
/// Inputs appended before a failure stay on `tx`.
pub fn add_utxos_to_fund(
    tx: &mut Transaction,
    utxos: &[Utxo],
    amount_to_fund: Amount,
    fee_rate: FeeRate,
    fund_new_fees: bool,
) -> Result<Amount> {
    let mut pool = utxos.to_vec();
    let mut remaining = amount_to_fund;

    loop {
        if pool.is_empty() {
            return Err(Error::NotEnoughFunds {
                left_to_fund: remaining,
            });
        }

        let new_fees = marginal_input_fee(tx, fee_rate)?;
        let threshold = if fund_new_fees {
            remaining
                .checked_add(new_fees)
                .ok_or(Error::AmountOverflow)?
        } else {
            remaining
        };

        // min_by_key keeps the first of equal values, so ties follow pool order
        if let Some(selected) = pool
            .iter()
            .filter(|utxo| utxo.value >= threshold)
            .min_by_key(|utxo| utxo.value)
        {
            tx.input.push(selected.to_txin());
            let change = selected.value - threshold;
            debug!(
                "Selected {} worth {} to cover {}",
                selected.outpoint(),
                selected.value,
                threshold
            );
            info!(
                "Funded {} with {} inputs, change {}",
                amount_to_fund,
                tx.input.len(),
                change
            );
            return Ok(change);
        }

        pool.sort_by(|a, b| b.value.cmp(&a.value));
        let largest = pool.remove(0);
        if new_fees >= largest.value {
            return Err(Error::NotEnoughFunds {
                left_to_fund: remaining,
            });
        }

        tx.input.push(largest.to_txin());
        // no UTXO reached the threshold, so this cannot underflow
        remaining = threshold - largest.value;
        debug!(
            "Consumed {} worth {}, {} left to fund",
            largest.outpoint(),
            largest.value,
            remaining
        );
    }
}
