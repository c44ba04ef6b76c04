//! 多链配置模块
//!
//! 定义所有支持的区块链及其签名协议、地址格式与派生路径。
//! 注册表是进程级只读静态表，初始化后不再变更。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletError};

/// 加密曲线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    /// secp256k1 曲线 (Bitcoin, Ethereum, BSC, Polygon)
    Secp256k1,
}

/// 默认地址编码格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFormat {
    /// 十六进制 0x... + EIP-55 校验大小写 (Ethereum 系列)
    Hex,
    /// Base58Check P2PKH (legacy)
    Base58,
    /// Bech32 P2WPKH (native segwit)
    Bech32,
}

/// 签名协议族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningProtocol {
    /// 账户模型：nonce / gas / value，EIP-155 链 ID 绑定
    Ethereum,
    /// UTXO 模型：多输入多输出，逐输入 sighash
    Bitcoin,
}

/// 支持的币种（数值即 SLIP-44 编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum CoinType {
    Bitcoin = 0,
    Litecoin = 2,
    Dogecoin = 3,
    Ethereum = 60,
    EthereumClassic = 61,
    Polygon = 966,
    SmartChain = 20000714,
}

impl CoinType {
    pub const ALL: [CoinType; 7] = [
        CoinType::Bitcoin,
        CoinType::Litecoin,
        CoinType::Dogecoin,
        CoinType::Ethereum,
        CoinType::EthereumClassic,
        CoinType::Polygon,
        CoinType::SmartChain,
    ];

    /// SLIP-44 编号
    pub fn id(self) -> u32 {
        self as u32
    }

    /// 取得币种参数，已知币种不会失败
    pub fn params(self) -> &'static CoinParams {
        match self {
            CoinType::Bitcoin => &BITCOIN,
            CoinType::Litecoin => &LITECOIN,
            CoinType::Dogecoin => &DOGECOIN,
            CoinType::Ethereum => &ETHEREUM,
            CoinType::EthereumClassic => &ETHEREUM_CLASSIC,
            CoinType::Polygon => &POLYGON,
            CoinType::SmartChain => &SMART_CHAIN,
        }
    }
}

impl TryFrom<u32> for CoinType {
    type Error = WalletError;

    fn try_from(id: u32) -> Result<Self> {
        CoinType::ALL
            .iter()
            .copied()
            .find(|coin| coin.id() == id)
            .ok_or_else(|| WalletError::UnsupportedCoin(id.to_string()))
    }
}

impl FromStr for CoinType {
    type Err = WalletError;

    /// 按名称、符号或别名解析（大小写不敏感）
    fn from_str(s: &str) -> Result<Self> {
        COIN_ALIASES
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| WalletError::UnsupportedCoin(s.to_string()))
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.params().name)
    }
}

/// 币种参数（不可变）
#[derive(Debug, Clone, Serialize)]
pub struct CoinParams {
    pub coin: CoinType,
    /// 链名称
    pub name: &'static str,
    /// 链符号 (ETH, BTC, ...)
    pub symbol: &'static str,
    /// 最小单位小数位
    pub decimals: u8,
    pub curve: CurveType,
    /// BIP43 purpose (44 / 84)
    pub purpose: u32,
    /// 派生路径中的 coin type（EVM 侧链沿用 60）
    pub path_coin_type: u32,
    pub address_format: AddressFormat,
    pub signing_protocol: SigningProtocol,
    /// 默认 EIP-155 链 ID（仅账户模型）
    pub chain_id: Option<u64>,
    /// Base58Check P2PKH 版本字节
    pub p2pkh_prefix: u8,
    /// Base58Check P2SH 版本字节
    pub p2sh_prefix: u8,
    /// segwit 地址 HRP
    pub hrp: Option<&'static str>,
    /// 粉尘阈值，低于此值的找零并入手续费
    pub dust_threshold: u64,
}

impl CoinParams {
    /// 构建派生路径：m/purpose'/coin_type'/account'/change/index
    pub fn derivation_path(&self, account: u32, change: u32, index: u32) -> String {
        format!(
            "m/{}'/{}'/{}'/{}/{}",
            self.purpose, self.path_coin_type, account, change, index
        )
    }

    /// 默认派生路径（首个外部地址）
    pub fn default_derivation_path(&self) -> String {
        self.derivation_path(0, 0, 0)
    }

    pub fn is_utxo(&self) -> bool {
        self.signing_protocol == SigningProtocol::Bitcoin
    }
}

static BITCOIN: CoinParams = CoinParams {
    coin: CoinType::Bitcoin,
    name: "Bitcoin",
    symbol: "BTC",
    decimals: 8,
    curve: CurveType::Secp256k1,
    purpose: 84,
    path_coin_type: 0,
    address_format: AddressFormat::Bech32,
    signing_protocol: SigningProtocol::Bitcoin,
    chain_id: None,
    p2pkh_prefix: 0x00,
    p2sh_prefix: 0x05,
    hrp: Some("bc"),
    dust_threshold: 546,
};

static LITECOIN: CoinParams = CoinParams {
    coin: CoinType::Litecoin,
    name: "Litecoin",
    symbol: "LTC",
    decimals: 8,
    curve: CurveType::Secp256k1,
    purpose: 84,
    path_coin_type: 2,
    address_format: AddressFormat::Bech32,
    signing_protocol: SigningProtocol::Bitcoin,
    chain_id: None,
    p2pkh_prefix: 0x30,
    p2sh_prefix: 0x32,
    hrp: Some("ltc"),
    dust_threshold: 546,
};

static DOGECOIN: CoinParams = CoinParams {
    coin: CoinType::Dogecoin,
    name: "Dogecoin",
    symbol: "DOGE",
    decimals: 8,
    curve: CurveType::Secp256k1,
    purpose: 44,
    path_coin_type: 3,
    address_format: AddressFormat::Base58,
    signing_protocol: SigningProtocol::Bitcoin,
    chain_id: None,
    p2pkh_prefix: 0x1e,
    p2sh_prefix: 0x16,
    hrp: None,
    dust_threshold: 1_000_000,
};

static ETHEREUM: CoinParams = CoinParams {
    coin: CoinType::Ethereum,
    name: "Ethereum",
    symbol: "ETH",
    decimals: 18,
    curve: CurveType::Secp256k1,
    purpose: 44,
    path_coin_type: 60,
    address_format: AddressFormat::Hex,
    signing_protocol: SigningProtocol::Ethereum,
    chain_id: Some(1),
    p2pkh_prefix: 0,
    p2sh_prefix: 0,
    hrp: None,
    dust_threshold: 0,
};

static ETHEREUM_CLASSIC: CoinParams = CoinParams {
    coin: CoinType::EthereumClassic,
    name: "Ethereum Classic",
    symbol: "ETC",
    decimals: 18,
    curve: CurveType::Secp256k1,
    purpose: 44,
    path_coin_type: 61,
    address_format: AddressFormat::Hex,
    signing_protocol: SigningProtocol::Ethereum,
    chain_id: Some(61),
    p2pkh_prefix: 0,
    p2sh_prefix: 0,
    hrp: None,
    dust_threshold: 0,
};

static POLYGON: CoinParams = CoinParams {
    coin: CoinType::Polygon,
    name: "Polygon",
    symbol: "MATIC",
    decimals: 18,
    curve: CurveType::Secp256k1,
    purpose: 44,
    path_coin_type: 60,
    address_format: AddressFormat::Hex,
    signing_protocol: SigningProtocol::Ethereum,
    chain_id: Some(137),
    p2pkh_prefix: 0,
    p2sh_prefix: 0,
    hrp: None,
    dust_threshold: 0,
};

static SMART_CHAIN: CoinParams = CoinParams {
    coin: CoinType::SmartChain,
    name: "BNB Smart Chain",
    symbol: "BNB",
    decimals: 18,
    curve: CurveType::Secp256k1,
    purpose: 44,
    path_coin_type: 60,
    address_format: AddressFormat::Hex,
    signing_protocol: SigningProtocol::Ethereum,
    chain_id: Some(56),
    p2pkh_prefix: 0,
    p2sh_prefix: 0,
    hrp: None,
    dust_threshold: 0,
};

/// 币种别名表（静态初始化）
static COIN_ALIASES: Lazy<HashMap<&'static str, CoinType>> = Lazy::new(|| {
    let entries: [(CoinType, &[&'static str]); 7] = [
        (CoinType::Bitcoin, &["bitcoin", "btc"]),
        (CoinType::Litecoin, &["litecoin", "ltc"]),
        (CoinType::Dogecoin, &["dogecoin", "doge"]),
        (CoinType::Ethereum, &["ethereum", "eth"]),
        (CoinType::EthereumClassic, &["ethereumclassic", "ethereum classic", "etc"]),
        (CoinType::Polygon, &["polygon", "matic"]),
        (CoinType::SmartChain, &["smartchain", "bsc", "bnb", "binance"]),
    ];

    let mut map = HashMap::new();
    for (coin, aliases) in entries {
        for alias in aliases {
            map.insert(*alias, coin);
        }
    }
    map
});

/// 按数值编号查找币种参数
pub fn lookup(coin_id: u32) -> Result<&'static CoinParams> {
    CoinType::try_from(coin_id).map(CoinType::params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_coins() {
        let btc = lookup(0).unwrap();
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.signing_protocol, SigningProtocol::Bitcoin);

        let eth = lookup(60).unwrap();
        assert_eq!(eth.chain_id, Some(1));
        assert_eq!(eth.default_derivation_path(), "m/44'/60'/0'/0/0");
    }

    #[test]
    fn test_lookup_unknown_coin() {
        assert!(matches!(lookup(12345), Err(WalletError::UnsupportedCoin(_))));
    }

    #[test]
    fn test_params_match_coin() {
        for coin in CoinType::ALL {
            assert_eq!(coin.params().coin, coin);
            assert_eq!(CoinType::try_from(coin.id()).unwrap(), coin);
        }
    }

    #[test]
    fn test_derivation_paths() {
        assert_eq!(
            CoinType::Bitcoin.params().default_derivation_path(),
            "m/84'/0'/0'/0/0"
        );
        assert_eq!(
            CoinType::SmartChain.params().derivation_path(1, 0, 5),
            "m/44'/60'/1'/0/5"
        );
        assert_eq!(
            CoinType::Dogecoin.params().default_derivation_path(),
            "m/44'/3'/0'/0/0"
        );
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("BTC".parse::<CoinType>().unwrap(), CoinType::Bitcoin);
        assert_eq!("bsc".parse::<CoinType>().unwrap(), CoinType::SmartChain);
        assert_eq!(" Matic ".parse::<CoinType>().unwrap(), CoinType::Polygon);
        assert!("solana".parse::<CoinType>().is_err());
    }
}
