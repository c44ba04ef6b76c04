//! BIP39 助记词 → 种子
//!
//! 种子是最敏感的材料：只存放在 `Zeroizing` 缓冲区中，drop 时自动清零，
//! `Debug` 输出永不包含字节内容。

use bip39::{Language, Mnemonic};
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};

/// BIP32 允许的种子长度范围 (128 ~ 512 bit)
const MIN_SEED_LEN: usize = 16;
const MAX_SEED_LEN: usize = 64;

/// HD 钱包种子
#[derive(Clone)]
pub struct Seed {
    bytes: Zeroizing<Vec<u8>>,
}

impl Seed {
    /// 从原始字节构造（用于 BIP32 测试向量或外部导入的种子）
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&bytes.len()) {
            return Err(WalletError::DerivationFailed(format!(
                "seed must be {}..={} bytes, got {}",
                MIN_SEED_LEN,
                MAX_SEED_LEN,
                bytes.len()
            )));
        }
        Ok(Self {
            bytes: Zeroizing::new(bytes.to_vec()),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seed")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// 助记词 + 可选口令 → 64 字节种子 (PBKDF2-HMAC-SHA512, 2048 轮)
///
/// 词数、单词表或校验和不合法时返回 `InvalidMnemonic`。
pub fn derive_seed(mnemonic: &str, passphrase: &str) -> Result<Seed> {
    // 规范化后的助记词 drop 时清零
    let normalized = Zeroizing::new(mnemonic.split_whitespace().collect::<Vec<_>>().join(" "));
    let mnemonic = Mnemonic::parse_in(Language::English, normalized.as_str())
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

    let seed = Zeroizing::new(mnemonic.to_seed(passphrase));
    Seed::from_bytes(&seed[..])
}
