//! 比特币系锁定脚本
//!
//! 脚本本身使用 `bitcoin::ScriptBuf`；这里按哈希构造标准模板，并把锁定脚本识别为
//! 签名与找零需要的几类模板：P2PKH、P2SH、P2WPKH、P2WSH 以及其它版本的见证程序。

use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::{PubkeyHash, Script, ScriptBuf, ScriptHash, WPubkeyHash, WScriptHash};

use crate::error::{Result, WalletError};

/// 识别出的脚本模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptTemplate {
    PayToPubkeyHash([u8; 20]),
    PayToScriptHash([u8; 20]),
    PayToWitnessPubkeyHash([u8; 20]),
    PayToWitnessScriptHash([u8; 32]),
    /// 其它版本的见证程序（例如 taproot v1）
    WitnessProgram { version: u8, program: Vec<u8> },
    NonStandard,
}

/// OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
pub fn p2pkh(pubkey_hash: &[u8; 20]) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(*pubkey_hash))
}

/// OP_HASH160 <20> OP_EQUAL
pub fn p2sh(script_hash: &[u8; 20]) -> ScriptBuf {
    ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(*script_hash))
}

pub fn p2wpkh(pubkey_hash: &[u8; 20]) -> ScriptBuf {
    ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array(*pubkey_hash))
}

pub fn p2wsh(script_hash: &[u8; 32]) -> ScriptBuf {
    ScriptBuf::new_p2wsh(&WScriptHash::from_byte_array(*script_hash))
}

/// `<version> <program>`
///
/// v0 只接受 20 / 32 字节程序；v1..=16 接受 2..=40 字节。
pub fn witness_program(version: u8, program: &[u8]) -> Result<ScriptBuf> {
    let unsupported = || {
        WalletError::UnsupportedScriptTemplate(format!(
            "witness v{} program of {} bytes",
            version,
            program.len()
        ))
    };

    match (version, program.len()) {
        (0, 20) | (0, 32) | (1..=16, 2..=40) => {
            let push = PushBytesBuf::try_from(program.to_vec()).map_err(|_| unsupported())?;
            Ok(Builder::new()
                .push_int(i64::from(version))
                .push_slice(push)
                .into_script())
        }
        _ => Err(unsupported()),
    }
}

/// 锁定脚本的模板识别
pub trait ScriptExt {
    fn template(&self) -> ScriptTemplate;
}

impl ScriptExt for Script {
    fn template(&self) -> ScriptTemplate {
        let bytes = self.as_bytes();

        if self.is_p2pkh() {
            return ScriptTemplate::PayToPubkeyHash(array(&bytes[3..23]));
        }
        if self.is_p2sh() {
            return ScriptTemplate::PayToScriptHash(array(&bytes[2..22]));
        }
        if self.is_p2wpkh() {
            return ScriptTemplate::PayToWitnessPubkeyHash(array(&bytes[2..22]));
        }
        if self.is_p2wsh() {
            return ScriptTemplate::PayToWitnessScriptHash(array(&bytes[2..34]));
        }

        if self.is_witness_program() {
            match self.witness_version() {
                Some(version) if version.to_num() > 0 => {
                    return ScriptTemplate::WitnessProgram {
                        version: version.to_num(),
                        program: bytes[2..].to_vec(),
                    }
                }
                _ => {}
            }
        }

        ScriptTemplate::NonStandard
    }
}

fn array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}
