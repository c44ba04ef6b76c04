//! HD 钱包句柄
//!
//! 持有 BIP39 种子（drop 时清零），按币种默认路径或自定义路径派生密钥与地址。

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::address::encode_address;
use crate::domain::chain_config::CoinType;
use crate::domain::derivation::{derive_path_with, DerivationPath, ExtendedKey};
use crate::domain::keys::PrivateKey;
use crate::domain::mnemonic::{derive_seed, Seed};
use crate::error::{Result, WalletError};

/// 派生出的账户信息（不含私钥）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    /// 钱包地址
    pub address: String,
    /// 压缩公钥 (hex)
    pub public_key: String,
    /// 派生路径
    pub derivation_path: String,
}

pub struct HdWallet {
    seed: Seed,
}

impl HdWallet {
    /// 由助记词和可选口令创建
    pub fn new(mnemonic: &str, passphrase: &str) -> Result<Self> {
        Ok(Self {
            seed: derive_seed(mnemonic, passphrase)?,
        })
    }

    pub fn from_seed(seed: Seed) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    /// 派生扩展密钥；`path` 为空时使用币种默认路径
    pub fn get_key(&self, coin: CoinType, path: Option<&DerivationPath>) -> Result<ExtendedKey> {
        match path {
            Some(path) => derive_path_with(&self.seed, path),
            None => derive_path_with(&self.seed, &DerivationPath::for_coin(coin)?),
        }
    }

    /// 默认路径上的地址
    pub fn get_address(&self, coin: CoinType) -> Result<String> {
        let key = self.get_key(coin, None)?;
        Ok(encode_address(&key.public_key(), coin.params()))
    }

    /// 默认路径上的私钥字节，供签名请求使用
    pub fn get_private_key(&self, coin: CoinType) -> Result<Zeroizing<Vec<u8>>> {
        let key = self.signing_key(coin)?;
        Ok(Zeroizing::new(key.to_bytes().to_vec()))
    }

    fn signing_key(&self, coin: CoinType) -> Result<PrivateKey> {
        self.get_key(coin, None)?
            .private_key()
            .ok_or_else(|| WalletError::DerivationFailed("derived key has no private part".into()))
    }

    /// 派生 `m/purpose'/coin'/account'/change/index` 上的账户信息
    pub fn derive_wallet_info(
        &self,
        coin: CoinType,
        account: u32,
        change: u32,
        index: u32,
    ) -> Result<WalletInfo> {
        let params = coin.params();
        let path: DerivationPath = params.derivation_path(account, change, index).parse()?;
        let key = self.get_key(coin, Some(&path))?;
        let public_key = key.public_key();

        tracing::debug!(coin = params.symbol, path = %path, "derived wallet info");
        Ok(WalletInfo {
            address: encode_address(&public_key, params),
            public_key: hex::encode(public_key.compressed()),
            derivation_path: path.to_string(),
        })
    }
}

impl std::fmt::Debug for HdWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdWallet").field("seed", &"[REDACTED]").finish()
    }
}
