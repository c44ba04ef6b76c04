//! 地址验证模块
//!
//! 面向调用方的统一入口：按币种标识（名称/符号/别名）校验地址。
//! 与签名路径不同，这里对带大写字母的 EVM 地址强制 EIP-55 校验。

use crate::domain::address;
use crate::domain::chain_config::{CoinType, SigningProtocol};
use crate::error::Result;
use crate::utils::hash::keccak256;

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    /// 验证地址格式
    ///
    /// # 返回
    /// - Ok(true): 地址有效
    /// - Ok(false): 地址无效
    /// - Err: 不支持的币种
    pub fn validate(coin: &str, address: &str) -> Result<bool> {
        let coin: CoinType = coin.parse()?;
        Ok(Self::validate_for(coin, address))
    }

    pub fn validate_for(coin: CoinType, address: &str) -> bool {
        let params = coin.params();
        match params.signing_protocol {
            SigningProtocol::Ethereum => Self::validate_evm_address(address),
            SigningProtocol::Bitcoin => address::validate_address(address, params),
        }
    }

    /// 验证EVM地址（包含大写字母时校验 EIP-55）
    fn validate_evm_address(address: &str) -> bool {
        if address::parse_ethereum_address(address).is_err() {
            return false;
        }

        let hex_part = &address[2..];
        if hex_part.chars().any(|c| c.is_ascii_uppercase()) {
            return Self::verify_eip55_checksum(hex_part);
        }

        true
    }

    /// https://eips.ethereum.org/EIPS/eip-55
    fn verify_eip55_checksum(hex_part: &str) -> bool {
        let hash = keccak256(hex_part.to_lowercase().as_bytes());

        hex_part.chars().enumerate().all(|(i, ch)| {
            if !ch.is_ascii_alphabetic() {
                return true;
            }
            let hash_byte = hash[i / 2];
            let hash_nibble = if i % 2 == 0 {
                hash_byte >> 4
            } else {
                hash_byte & 0x0f
            };
            ch.is_ascii_uppercase() == (hash_nibble >= 8)
        })
    }
}
