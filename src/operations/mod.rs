pub mod estimate;
pub mod fund;
pub mod signers;
pub mod spend;
pub mod utxo;

use bitcoin::Amount;

pub use estimate::{estimate_tx_bytes, sum_output_values};
pub use fund::{add_utxos_to_fund, marginal_input_fee};
pub use signers::{PubkeyHashSigner, TransactionSigner, sign_inputs};
pub use spend::{SpendInputs, build_bitcoin_spend};
pub use utxo::Utxo;

/// Smallest output value worth creating.
pub const DUST_MINIMUM: Amount = Amount::from_sat(5500);
