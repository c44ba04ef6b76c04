//! 地址编码与解析
//!
//! 地址只能通过 `encode_address(公钥, 币种参数)` 生成；UTXO 链的输出脚本
//! 通过 `lock_script_for(地址, 币种参数)` 得到。两者都是纯函数。

use bech32::segwit;
use bech32::Hrp;
use bitcoin::ScriptBuf;

use crate::domain::chain_config::{AddressFormat, CoinParams};
use crate::domain::keys::PublicKey;
use crate::domain::script;
use crate::error::{Result, WalletError};
use crate::utils::hash::keccak256;

/// 按币种默认格式编码地址
pub fn encode_address(public_key: &PublicKey, params: &CoinParams) -> String {
    match params.address_format {
        AddressFormat::Hex => to_checksum_address(&public_key.ethereum_address()),
        AddressFormat::Base58 => encode_base58(params.p2pkh_prefix, &public_key.hash160()),
        AddressFormat::Bech32 => match params.hrp.and_then(|hrp| Hrp::parse(hrp).ok()) {
            Some(hrp) => segwit::encode(hrp, segwit::VERSION_0, &public_key.hash160())
                // 20 字节 v0 程序配合合法 HRP 不会失败
                .unwrap_or_else(|_| encode_base58(params.p2pkh_prefix, &public_key.hash160())),
            None => encode_base58(params.p2pkh_prefix, &public_key.hash160()),
        },
    }
}

/// Legacy P2PKH 地址（所有 UTXO 币种都支持）
pub fn encode_legacy_address(public_key: &PublicKey, params: &CoinParams) -> String {
    encode_base58(params.p2pkh_prefix, &public_key.hash160())
}

fn encode_base58(prefix: u8, hash: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(prefix);
    payload.extend_from_slice(hash);
    bs58::encode(payload).with_check().into_string()
}

/// EIP-55 大小写校验地址
pub fn to_checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// 解析以太坊地址：`0x` + 40 个十六进制字符
///
/// 只校验格式，不强制 EIP-55 大小写；严格校验见 `AddressValidator`。
pub fn parse_ethereum_address(address: &str) -> Result<[u8; 20]> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| WalletError::InvalidRecipientAddress(address.to_string()))?;
    if hex_part.len() != 40 {
        return Err(WalletError::InvalidRecipientAddress(address.to_string()));
    }
    let bytes =
        hex::decode(hex_part).map_err(|_| WalletError::InvalidRecipientAddress(address.to_string()))?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// UTXO 币种：地址 → 锁定脚本
pub fn lock_script_for(address: &str, params: &CoinParams) -> Result<ScriptBuf> {
    let invalid = || WalletError::InvalidRecipientAddress(address.to_string());

    if !params.is_utxo() {
        return Err(invalid());
    }

    if let Some(expected_hrp) = params.hrp {
        if let Ok((hrp, version, program)) = segwit::decode(address) {
            if !hrp.to_string().eq_ignore_ascii_case(expected_hrp) {
                return Err(invalid());
            }
            return script::witness_program(version.to_u8(), &program).map_err(|_| invalid());
        }
    }

    let payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|_| invalid())?;
    if payload.len() != 21 {
        return Err(invalid());
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);

    if payload[0] == params.p2pkh_prefix {
        Ok(script::p2pkh(&hash))
    } else if payload[0] == params.p2sh_prefix {
        Ok(script::p2sh(&hash))
    } else {
        Err(invalid())
    }
}

/// 地址格式校验
pub fn validate_address(address: &str, params: &CoinParams) -> bool {
    if params.is_utxo() {
        lock_script_for(address, params).is_ok()
    } else {
        parse_ethereum_address(address).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain_config::CoinType;
    use crate::domain::keys::PrivateKey;
    use crate::domain::script::{ScriptExt, ScriptTemplate};

    fn generator_key() -> PublicKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        PrivateKey::from_bytes(&bytes).unwrap().public_key()
    }

    #[test]
    fn test_checksum_address_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        ] {
            let bytes = parse_ethereum_address(expected).unwrap();
            assert_eq!(to_checksum_address(&bytes), expected);
        }
    }

    #[test]
    fn test_parse_ethereum_address_errors() {
        assert!(parse_ethereum_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
        assert!(parse_ethereum_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeA").is_err());
        assert!(parse_ethereum_address("0xZZAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
        // 不强制大小写校验
        assert!(parse_ethereum_address("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED").is_ok());
    }

    #[test]
    fn test_bitcoin_addresses_for_generator() {
        let pubkey = generator_key();
        let btc = CoinType::Bitcoin.params();
        assert_eq!(
            encode_address(&pubkey, btc),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
        assert_eq!(
            encode_legacy_address(&pubkey, btc),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
    }

    #[test]
    fn test_lock_script_for_segwit_and_legacy() {
        let btc = CoinType::Bitcoin.params();
        let hash = generator_key().hash160();

        let script = lock_script_for("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", btc).unwrap();
        assert_eq!(script.template(), ScriptTemplate::PayToWitnessPubkeyHash(hash));

        let script = lock_script_for("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH", btc).unwrap();
        assert_eq!(script.template(), ScriptTemplate::PayToPubkeyHash(hash));
    }

    #[test]
    fn test_lock_script_for_rejects_foreign_addresses() {
        let btc = CoinType::Bitcoin.params();
        let ltc = CoinType::Litecoin.params();

        // 错误的 HRP
        assert!(lock_script_for("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", ltc).is_err());
        // 校验和错误
        assert!(lock_script_for("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMJ", btc).is_err());
        assert!(lock_script_for("not-an-address", btc).is_err());
        // 账户模型币种没有锁定脚本
        assert!(lock_script_for(
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH",
            CoinType::Ethereum.params()
        )
        .is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address(
            "0xC37054b3b48C3317082E7ba872d7753D13da4986",
            CoinType::Ethereum.params()
        ));
        assert!(validate_address(
            "1Bp9U1ogV3A14FMvKbRJms7ctyso4Z4Tcx",
            CoinType::Bitcoin.params()
        ));
        assert!(!validate_address(
            "1Bp9U1ogV3A14FMvKbRJms7ctyso4Z4Tcx",
            CoinType::Dogecoin.params()
        ));
    }
}
