//! 大端整数字节工具
//!
//! 签名请求中的数值字段 (nonce、gas、金额、chain id) 均以大端字节表示，
//! 编码前统一去掉前导零。

use crate::error::{Result, WalletError};

/// 去掉前导零字节；全零时返回空
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// 将大端字节解析为 u64，超过 8 个有效字节时返回 None
pub fn be_bytes_to_u64(bytes: &[u8]) -> Option<u64> {
    let trimmed = trim_leading_zeros(bytes);
    if trimmed.len() > 8 {
        return None;
    }
    Some(trimmed.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// u128 编码为去零的大端字节
pub fn u128_to_be_trimmed(value: u128) -> Vec<u8> {
    trim_leading_zeros(&value.to_be_bytes()).to_vec()
}

/// 校验 256 位以内的数值字段，返回去零后的字节
pub fn uint256_field(name: &str, bytes: &[u8]) -> Result<Vec<u8>> {
    let trimmed = trim_leading_zeros(bytes);
    if trimmed.len() > 32 {
        return Err(WalletError::InvalidAmount(format!(
            "{} exceeds 256 bits ({} bytes)",
            name,
            trimmed.len()
        )));
    }
    Ok(trimmed.to_vec())
}
