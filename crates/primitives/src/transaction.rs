//! Transaction layout, hashing and signing payloads.

use crate::{
    encoding::BinaryWriter,
    error::PrimitiveError,
    hash::{ScriptHash, hash256_to_string},
    witness::{Signer, Witness},
};
use alloy_primitives::{B256, Bytes};
use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

/// Only transaction version accepted by N3 nodes.
pub const TRANSACTION_VERSION: u8 = 0;

/// An N3 transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: u8,
    pub nonce: u32,
    pub system_fee: i64,
    pub network_fee: i64,
    pub valid_until_block: u32,
    pub signers: Vec<Signer>,
    pub script: Bytes,
    pub witnesses: Vec<Witness>,
}

impl Transaction {
    /// Creates an unsigned transaction with a random nonce and no fees.
    pub fn new(script: Bytes, signers: Vec<Signer>, valid_until_block: u32) -> Self {
        Self {
            version: TRANSACTION_VERSION,
            nonce: rand::random(),
            system_fee: 0,
            network_fee: 0,
            valid_until_block,
            signers,
            script,
            witnesses: Vec::new(),
        }
    }

    /// Accounts of every signer, in order.
    pub fn signer_accounts(&self) -> Result<Vec<ScriptHash>, PrimitiveError> {
        self.signers.iter().map(Signer::account).collect()
    }

    fn encode_header(&self, writer: &mut BinaryWriter) -> Result<(), PrimitiveError> {
        writer
            .write_u8(self.version)
            .write_u32(self.nonce)
            .write_i64(self.system_fee)
            .write_i64(self.network_fee)
            .write_u32(self.valid_until_block)
            .write_var_int(self.signers.len() as u64);
        for signer in &self.signers {
            signer.encode(writer)?;
        }
        // no attributes
        writer.write_var_int(0).write_var_bytes(&self.script);
        Ok(())
    }

    /// Serialization without witnesses; this is what gets hashed.
    pub fn encode_unsigned(&self) -> Result<Vec<u8>, PrimitiveError> {
        let mut writer = BinaryWriter::new();
        self.encode_header(&mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Full serialization, witnesses included.
    pub fn encode(&self) -> Result<Vec<u8>, PrimitiveError> {
        let mut writer = BinaryWriter::new();
        self.encode_header(&mut writer)?;
        writer.write_var_int(self.witnesses.len() as u64);
        for witness in &self.witnesses {
            witness.encode(&mut writer);
        }
        Ok(writer.into_bytes())
    }

    /// SHA-256 of the unsigned serialization.
    pub fn hash(&self) -> Result<B256, PrimitiveError> {
        Ok(B256::from_slice(&Sha256::digest(self.encode_unsigned()?)))
    }

    /// The transaction id as printed by nodes.
    pub fn txid(&self) -> Result<String, PrimitiveError> {
        Ok(hash256_to_string(&self.hash()?))
    }

    /// Bytes a witness signs: the network magic followed by the transaction hash.
    pub fn sign_payload(&self, network_magic: u32) -> Result<Vec<u8>, PrimitiveError> {
        let mut payload = Vec::with_capacity(36);
        payload.extend_from_slice(&network_magic.to_le_bytes());
        payload.extend_from_slice(self.hash()?.as_slice());
        Ok(payload)
    }

    /// Base64 of the full serialization, the form `sendrawtransaction` accepts.
    pub fn to_base64(&self) -> Result<String, PrimitiveError> {
        Ok(STANDARD.encode(self.encode()?))
    }
}
