//! Serialized size estimates for legacy transactions under construction.
//!
//! Inputs without a script_sig and outputs without a script_pubkey are priced
//! as standard pay-to-pubkey-hash, which is also how hypothetical inputs and
//! outputs are counted.

use bitcoin::{Amount, Transaction, TxIn, TxOut};

/// version (4) + input count (1) + output count (1) + locktime (4)
pub const TX_EMPTY_SIZE: u64 = 4 + 1 + 1 + 4;
/// prevout hash (32) + prevout index (4) + script length (1) + sequence (4)
pub const TX_INPUT_BASE: u64 = 32 + 4 + 1 + 4;
/// signature push (~73) + compressed pubkey push (34)
pub const TX_INPUT_PUBKEYHASH: u64 = 107;
/// value (8) + script length (1)
pub const TX_OUTPUT_BASE: u64 = 8 + 1;
/// OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
pub const TX_OUTPUT_PUBKEYHASH: u64 = 25;

fn input_bytes(input: Option<&TxIn>) -> u64 {
    match input {
        Some(input) if !input.script_sig.is_empty() => {
            TX_INPUT_BASE + input.script_sig.len() as u64
        }
        _ => TX_INPUT_BASE + TX_INPUT_PUBKEYHASH,
    }
}

fn output_bytes(output: Option<&TxOut>) -> u64 {
    match output {
        Some(output) if !output.script_pubkey.is_empty() => {
            TX_OUTPUT_BASE + output.script_pubkey.len() as u64
        }
        _ => TX_OUTPUT_BASE + TX_OUTPUT_PUBKEYHASH,
    }
}

/// Estimated byte size of `tx` once `additional_inputs` and
/// `additional_outputs` placeholder P2PKH items are appended.
pub fn estimate_tx_bytes(
    tx: &Transaction,
    additional_inputs: usize,
    additional_outputs: usize,
) -> u64 {
    let inputs = tx
        .input
        .iter()
        .map(Some)
        .chain(std::iter::repeat_n(None, additional_inputs))
        .map(input_bytes)
        .sum::<u64>();
    let outputs = tx
        .output
        .iter()
        .map(Some)
        .chain(std::iter::repeat_n(None, additional_outputs))
        .map(output_bytes)
        .sum::<u64>();
    TX_EMPTY_SIZE + inputs + outputs
}

/// Sum of all output values. Saturates rather than overflowing on malformed
/// transactions.
pub fn sum_output_values(tx: &Transaction) -> Amount {
    tx.output.iter().fold(Amount::ZERO, |acc, out| {
        acc.checked_add(out.value).unwrap_or(Amount::MAX)
    })
}
