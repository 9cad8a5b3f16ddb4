//! Base40 codec used for name hashes.
//!
//! Digits are the characters of [`ALPHABET`], most significant first. Hex
//! output is lowercase and left-padded to an even number of digits.

use num::{BigUint, Integer, Zero};

use crate::error::{Error, Result};

pub const ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz-_.+";

const BASE: u32 = 40;

fn digit_value(character: char, position: usize) -> Result<u32> {
    ALPHABET
        .find(character)
        .map(|index| index as u32)
        .ok_or(Error::InvalidCharacter {
            character,
            position,
        })
}

fn to_even_hex(value: &BigUint) -> String {
    let hex = value.to_str_radix(16);
    if hex.len() % 2 == 1 {
        format!("0{}", hex)
    } else {
        hex
    }
}

/// Decodes a base40 string into the hex encoding of its integer value.
pub fn decode_b40(input: &str) -> Result<String> {
    let value = input
        .chars()
        .enumerate()
        .try_fold(BigUint::zero(), |acc, (position, character)| {
            Ok::<_, Error>(acc * BASE + digit_value(character, position)?)
        })?;
    Ok(to_even_hex(&value))
}

/// Encodes the integer value of a hex string in base40.
pub fn encode_b40(hex: &str) -> Result<String> {
    let mut value = BigUint::parse_bytes(hex.as_bytes(), 16)
        .ok_or_else(|| Error::InvalidHex(hex.to_string()))?;
    if value.is_zero() {
        return Ok("0".to_string());
    }

    let alphabet = ALPHABET.as_bytes();
    let base = BigUint::from(BASE);
    let mut digits = vec![];
    while !value.is_zero() {
        let (quotient, remainder) = value.div_rem(&base);
        let index = remainder.to_u32_digits().first().copied().unwrap_or(0) as usize;
        digits.push(alphabet[index] as char);
        value = quotient;
    }
    Ok(digits.into_iter().rev().collect())
}
