//! Per-input transaction signing.
//!
//! A [`TransactionSigner`] knows how to produce the unlocking script for a
//! single input. [`sign_inputs`] walks every input in order and hands it to
//! either the default signer or the override registered for that index.

use async_trait::async_trait;
use bitcoin::{
    Address, EcdsaSighashType, PrivateKey, PublicKey, ScriptBuf, Transaction,
    ecdsa,
    hashes::Hash,
    script::Builder,
    secp256k1::{All, Message, Secp256k1},
    sighash::SighashCache,
};
use tracing::{debug, info};

use crate::error::{Error, Result};

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Address whose outputs this signer can spend.
    async fn address(&self) -> Result<Address>;

    /// Attaches an unlocking script for `input_index` to `tx`.
    async fn sign_transaction(&self, tx: &mut Transaction, input_index: usize) -> Result<()>;

    fn signer_version(&self) -> u32;
}

/// Signs pay-to-pubkey-hash inputs with a single private key.
#[derive(Debug, Clone)]
pub struct PubkeyHashSigner {
    secp: Secp256k1<All>,
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl PubkeyHashSigner {
    pub fn new(private_key: PrivateKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = private_key.public_key(&secp);
        Self {
            secp,
            private_key,
            public_key,
        }
    }

    pub fn from_wif(wif: &str) -> Result<Self> {
        Ok(Self::new(PrivateKey::from_wif(wif)?))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::new_p2pkh(&self.public_key.pubkey_hash())
    }
}

#[async_trait]
impl TransactionSigner for PubkeyHashSigner {
    async fn address(&self) -> Result<Address> {
        Ok(Address::p2pkh(self.public_key, self.private_key.network))
    }

    async fn sign_transaction(&self, tx: &mut Transaction, input_index: usize) -> Result<()> {
        let sighash_type = EcdsaSighashType::All;
        let sighash = SighashCache::new(&*tx).legacy_signature_hash(
            input_index,
            &self.script_pubkey(),
            sighash_type.to_u32(),
        )?;
        let message = Message::from_digest(sighash.to_byte_array());
        let signature = ecdsa::Signature {
            signature: self.secp.sign_ecdsa(&message, &self.private_key.inner),
            sighash_type,
        };
        tx.input[input_index].script_sig = Builder::new()
            .push_slice(signature.serialize())
            .push_key(&self.public_key)
            .into_script();
        Ok(())
    }

    fn signer_version(&self) -> u32 {
        1
    }
}

/// Signs every input of `tx` in ascending index order, one at a time.
///
/// Inputs listed in `overrides` are signed by their paired signer, every
/// other input by `default_signer`. The first failure aborts; inputs signed
/// before it keep their scripts.
///
/// An override whose index is past the last input is rejected with
/// [`Error::SignerIndexOutOfRange`] before any input is signed, rather than
/// being ignored.
pub async fn sign_inputs(
    tx: &mut Transaction,
    default_signer: &dyn TransactionSigner,
    overrides: &[(usize, &dyn TransactionSigner)],
) -> Result<()> {
    let inputs = tx.input.len();
    let mut assigned = vec![default_signer; inputs];
    for &(index, signer) in overrides {
        let slot = assigned
            .get_mut(index)
            .ok_or(Error::SignerIndexOutOfRange { index, inputs })?;
        *slot = signer;
    }

    for (index, signer) in assigned.into_iter().enumerate() {
        signer.sign_transaction(tx, index).await?;
        debug!("Signed input {} with signer v{}", index, signer.signer_version());
    }
    info!("Signed {} inputs", inputs);
    Ok(())
}
