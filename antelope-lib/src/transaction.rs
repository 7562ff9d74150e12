use crate::{
    keys::{K1Signature, KeyError, Signer},
    name::Name,
    serialize::{Pack, Writer},
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("expiration is outside the representable range")]
    Expiration,
    #[error(transparent)]
    Key(#[from] KeyError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

impl Pack for PermissionLevel {
    fn pack(&self, writer: &mut Writer) {
        writer.write_name(&self.actor);
        writer.write_name(&self.permission);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    /// Already serialized action payload.
    pub data: Vec<u8>,
}

impl Action {
    pub fn new<T: Pack>(
        account: Name,
        name: Name,
        authorization: Vec<PermissionLevel>,
        data: &T,
    ) -> Self {
        Self {
            account,
            name,
            authorization,
            data: data.packed(),
        }
    }
}

impl Pack for Action {
    fn pack(&self, writer: &mut Writer) {
        writer.write_name(&self.account);
        writer.write_name(&self.name);
        writer.write_vec(&self.authorization);
        writer.write_bytes(&self.data);
    }
}

/// Chain id and reference block used to anchor a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOptions {
    pub chain_id: [u8; 32],
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
}

fn decode_fixed<const N: usize>(hex_str: &str) -> Result<[u8; N], Error> {
    let bytes = hex::decode(hex_str)?;
    bytes.as_slice().try_into().map_err(|_| Error::Length {
        expected: N,
        actual: bytes.len(),
    })
}

impl TxOptions {
    /// Builds options from the `chain_id` and a block id, both hex encoded.
    ///
    /// The block number sits big-endian in the first four bytes of a block id,
    /// the prefix is read little-endian from bytes 8..12.
    pub fn from_chain(chain_id: &str, block_id: &str) -> Result<Self, Error> {
        let chain_id = decode_fixed::<32>(chain_id)?;
        let block_id = decode_fixed::<32>(block_id)?;
        let block_num = u32::from_be_bytes([block_id[0], block_id[1], block_id[2], block_id[3]]);
        Ok(Self {
            chain_id,
            ref_block_num: (block_num & 0xffff) as u16,
            ref_block_prefix: u32::from_le_bytes([
                block_id[8],
                block_id[9],
                block_id[10],
                block_id[11],
            ]),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Seconds since the unix epoch.
    pub expiration: u32,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub actions: Vec<Action>,
}

impl Transaction {
    pub fn new(actions: Vec<Action>, opts: &TxOptions) -> Self {
        Self {
            expiration: 0,
            ref_block_num: opts.ref_block_num,
            ref_block_prefix: opts.ref_block_prefix,
            actions,
        }
    }

    pub fn set_expiration(&mut self, now: SystemTime, lifetime: Duration) -> Result<(), Error> {
        let expires_at = (now + lifetime)
            .duration_since(UNIX_EPOCH)
            .map_err(|_| Error::Expiration)?;
        self.expiration = u32::try_from(expires_at.as_secs()).map_err(|_| Error::Expiration)?;
        Ok(())
    }

    /// Packs with no compression and no context free data.
    pub fn pack_unsigned(&self) -> PackedTransaction {
        PackedTransaction {
            packed_trx: self.packed(),
            signatures: Vec::new(),
        }
    }
}

impl Pack for Transaction {
    fn pack(&self, writer: &mut Writer) {
        writer.write_u32(self.expiration);
        writer.write_u16(self.ref_block_num);
        writer.write_u32(self.ref_block_prefix);
        // max_net_usage_words, max_cpu_usage_ms, delay_sec
        writer.write_varuint32(0);
        writer.write_u8(0);
        writer.write_varuint32(0);
        // context free actions
        writer.write_varuint32(0);
        writer.write_vec(&self.actions);
        // transaction extensions
        writer.write_varuint32(0);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedTransaction {
    pub packed_trx: Vec<u8>,
    pub signatures: Vec<K1Signature>,
}

impl PackedTransaction {
    /// `sha256(chain_id || packed_trx || cfd_hash)`, where the hash of empty
    /// context free data is 32 zero bytes.
    pub fn signing_digest(&self, chain_id: &[u8; 32]) -> [u8; 32] {
        Sha256::new()
            .chain_update(chain_id)
            .chain_update(&self.packed_trx)
            .chain_update([0u8; 32])
            .finalize()
            .into()
    }

    pub fn sign_with<S: Signer + ?Sized>(
        &mut self,
        chain_id: &[u8; 32],
        signer: &S,
    ) -> Result<(), Error> {
        let digest = self.signing_digest(chain_id);
        self.signatures.push(signer.sign(&digest)?);
        Ok(())
    }

    pub fn to_request(&self) -> PushTransactionRequest {
        PushTransactionRequest {
            signatures: self.signatures.iter().map(ToString::to_string).collect(),
            compression: "none",
            packed_context_free_data: String::new(),
            packed_trx: hex::encode(&self.packed_trx),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct PushTransactionRequest {
    pub signatures: Vec<String>,
    pub compression: &'static str,
    pub packed_context_free_data: String,
    pub packed_trx: String,
}
