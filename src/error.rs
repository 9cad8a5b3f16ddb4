use bitcoin::Amount;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Not enough UTXOs to fund. Left to fund: {left_to_fund}")]
    NotEnoughFunds { left_to_fund: Amount },
    #[error("Not enough funds to pay fees of {fees} from a specified amount of {specified}")]
    InvalidAmount { fees: Amount, specified: Amount },
    #[error("Invalid base40 character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("Invalid hex input: {0}")]
    InvalidHex(String),
    #[error("Signer override for input {index} but transaction has {inputs} inputs")]
    SignerIndexOutOfRange { index: usize, inputs: usize },
    #[error("Fee calculation overflow")]
    FeeOverflow,
    #[error("Amount overflow")]
    AmountOverflow,
    #[error("Sighash error: {0}")]
    Sighash(#[from] bitcoin::transaction::InputsIndexError),
    #[error("Invalid private key: {0}")]
    InvalidKey(#[from] bitcoin::key::FromWifError),
    #[error(transparent)]
    Signer(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
