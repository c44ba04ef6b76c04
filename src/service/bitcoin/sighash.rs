//! 签名哈希计算
//!
//! 基于 `bitcoin::sighash::SighashCache`：
//! - legacy：P2PKH 输入
//! - BIP143：P2WPKH 输入使用 segwit v0 算法，承诺被花费金额
//!
//! 请求里的 hash type 是 `u32`，这里负责校验并转换成 `EcdsaSighashType`。

use bitcoin::hashes::Hash;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Amount, Script, Transaction};

use crate::error::{Result, WalletError};

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_NONE: u32 = 0x02;
pub const SIGHASH_SINGLE: u32 = 0x03;
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// 只接受 ALL / NONE / SINGLE，可叠加 ANYONECANPAY
pub fn hash_type_from_u32(value: u32) -> Result<EcdsaSighashType> {
    EcdsaSighashType::from_standard(value).map_err(|_| WalletError::UnsupportedHashType(value))
}

/// 同一笔交易逐个输入计算签名哈希，复用 BIP143 的中间哈希
pub struct SighashCalculator<'a> {
    cache: SighashCache<&'a Transaction>,
}

impl<'a> SighashCalculator<'a> {
    pub fn new(tx: &'a Transaction) -> Self {
        Self {
            cache: SighashCache::new(tx),
        }
    }

    /// Legacy 签名哈希；SIGHASH_SINGLE 且序号超出输出数量时返回固定值 1
    pub fn legacy(
        &mut self,
        input_index: usize,
        script_pubkey: &Script,
        hash_type: EcdsaSighashType,
    ) -> Result<[u8; 32]> {
        let hash = self
            .cache
            .legacy_signature_hash(input_index, script_pubkey, hash_type.to_u32())
            .map_err(|e| WalletError::MalformedTransaction(e.to_string()))?;
        Ok(hash.to_byte_array())
    }

    /// BIP143 签名哈希，`script_pubkey` 必须是 P2WPKH
    pub fn segwit_v0(
        &mut self,
        input_index: usize,
        script_pubkey: &Script,
        value: u64,
        hash_type: EcdsaSighashType,
    ) -> Result<[u8; 32]> {
        let hash = self
            .cache
            .p2wpkh_signature_hash(
                input_index,
                script_pubkey,
                Amount::from_sat(value),
                hash_type,
            )
            .map_err(|e| WalletError::MalformedTransaction(e.to_string()))?;
        Ok(hash.to_byte_array())
    }
}

pub fn legacy_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_pubkey: &Script,
    hash_type: EcdsaSighashType,
) -> Result<[u8; 32]> {
    SighashCalculator::new(tx).legacy(input_index, script_pubkey, hash_type)
}

pub fn segwit_v0_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_pubkey: &Script,
    value: u64,
    hash_type: EcdsaSighashType,
) -> Result<[u8; 32]> {
    SighashCalculator::new(tx).segwit_v0(input_index, script_pubkey, value, hash_type)
}
