//! BIP32 分层确定性派生
//!
//! 种子 → 主扩展密钥 → 按路径派生子密钥。硬化派生必须持有私钥；
//! 只有公钥的扩展密钥只能派生普通子节点。

use std::fmt;
use std::str::FromStr;

use coins_bip32::prelude::{
    Bip32Error, Hint, MainnetEncoder, Parent, XKeyEncoder, XKeyInfo, XPriv, XPub,
};
use k256::ecdsa::{SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::domain::chain_config::CoinType;
use crate::domain::keys::{PrivateKey, PublicKey};
use crate::domain::mnemonic::Seed;
use crate::error::{Result, WalletError};

const HARDENED_BIT: u32 = 1 << 31;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 派生路径
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 路径中的一段：(索引, 是否硬化)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildNumber {
    index: u32,
    hardened: bool,
}

impl ChildNumber {
    pub fn normal(index: u32) -> Result<Self> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> Result<Self> {
        Self::new(index, true)
    }

    pub fn new(index: u32, hardened: bool) -> Result<Self> {
        if index & HARDENED_BIT != 0 {
            return Err(WalletError::InvalidDerivationPath(format!(
                "index {} out of range",
                index
            )));
        }
        Ok(Self { index, hardened })
    }

    /// 从 BIP32 原始编号（高位表示硬化）构造
    pub fn from_raw(raw: u32) -> Self {
        Self {
            index: raw & !HARDENED_BIT,
            hardened: raw & HARDENED_BIT != 0,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// BIP32 原始编号
    pub fn to_raw(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_BIT
        } else {
            self.index
        }
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildNumber {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let (digits, hardened) = match s.strip_suffix(['\'', 'h', 'H']) {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let index = digits
            .parse::<u32>()
            .map_err(|_| WalletError::InvalidDerivationPath(format!("bad segment '{}'", s)))?;
        Self::new(index, hardened)
    }
}

/// 派生路径，例如 `m/44'/60'/0'/0/0`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    /// 根路径 `m`
    pub fn master() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[ChildNumber] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 追加一段，返回新路径
    pub fn child(&self, child: ChildNumber) -> Self {
        let mut segments = self.0.clone();
        segments.push(child);
        Self(segments)
    }

    /// 币种默认路径
    pub fn for_coin(coin: CoinType) -> Result<Self> {
        coin.params().default_derivation_path().parse()
    }
}

impl From<Vec<ChildNumber>> for DerivationPath {
    fn from(segments: Vec<ChildNumber>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split('/');
        match parts.next() {
            Some("m") | Some("M") => {}
            _ => {
                return Err(WalletError::InvalidDerivationPath(format!(
                    "path must start with 'm': {}",
                    s
                )))
            }
        }
        parts
            .map(ChildNumber::from_str)
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 扩展密钥
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone)]
enum KeyMaterial {
    Private(XPriv),
    Public(XPub),
}

/// BIP32 扩展密钥（主密钥或派生密钥）
///
/// 底层是 coins-bip32 的 `XPriv` / `XPub`，这里额外记录相对主密钥的路径。
/// 私钥标量在 drop 时清零。密钥只按需派生，内核不缓存。
#[derive(Clone)]
pub struct ExtendedKey {
    material: KeyMaterial,
    path: DerivationPath,
}

impl ExtendedKey {
    /// 由种子生成主扩展密钥（序列化为 xprv / xpub）
    pub fn master(seed: &Seed) -> Result<Self> {
        let xpriv = XPriv::root_from_seed(seed.as_bytes(), Some(Hint::Legacy))
            .map_err(|e| WalletError::DerivationFailed(format!("master key: {}", e)))?;
        Ok(Self {
            material: KeyMaterial::Private(xpriv),
            path: DerivationPath::master(),
        })
    }

    /// 派生单个子节点
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self> {
        if self.depth() == u8::MAX {
            return Err(WalletError::DerivationFailed("maximum depth reached".into()));
        }

        let material = match &self.material {
            KeyMaterial::Private(xpriv) => KeyMaterial::Private(
                xpriv
                    .derive_child(child.to_raw())
                    .map_err(|e| derivation_error(e, child))?,
            ),
            KeyMaterial::Public(xpub) => KeyMaterial::Public(
                xpub.derive_child(child.to_raw())
                    .map_err(|e| derivation_error(e, child))?,
            ),
        };

        // 无效 tweak 时底层按 BIP32 顺延到下一个索引，路径记录实际使用的编号
        let actual = ChildNumber::from_raw(info_of(&material).index);
        Ok(Self {
            material,
            path: self.path.child(actual),
        })
    }

    /// 从当前节点按路径逐段派生
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.segments()
            .iter()
            .try_fold(self.clone(), |key, child| key.derive_child(*child))
    }

    /// 去掉私钥，只保留公钥部分
    pub fn neuter(&self) -> Self {
        let material = match &self.material {
            KeyMaterial::Private(xpriv) => KeyMaterial::Public(xpriv.verify_key()),
            KeyMaterial::Public(xpub) => KeyMaterial::Public(xpub.clone()),
        };
        Self {
            material,
            path: self.path.clone(),
        }
    }

    pub fn has_private_key(&self) -> bool {
        matches!(self.material, KeyMaterial::Private(_))
    }

    /// 私钥部分；只有公钥时返回 None
    pub fn private_key(&self) -> Option<PrivateKey> {
        match &self.material {
            KeyMaterial::Private(xpriv) => {
                let signing_key: &SigningKey = xpriv.as_ref();
                Some(PrivateKey::from_signing_key(signing_key.clone()))
            }
            KeyMaterial::Public(_) => None,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match &self.material {
            KeyMaterial::Private(xpriv) => {
                let signing_key: &SigningKey = xpriv.as_ref();
                PublicKey::from_verifying_key(*signing_key.verifying_key())
            }
            KeyMaterial::Public(xpub) => {
                let verifying_key: &VerifyingKey = xpub.as_ref();
                PublicKey::from_verifying_key(*verifying_key)
            }
        }
    }

    fn info(&self) -> &XKeyInfo {
        info_of(&self.material)
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.info().chain_code.0
    }

    pub fn depth(&self) -> u8 {
        self.info().depth
    }

    pub fn child_number(&self) -> ChildNumber {
        ChildNumber::from_raw(self.info().index)
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.info().parent.0
    }

    /// 相对于主密钥的路径；从序列化字符串导入的密钥为空路径
    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    /// HASH160(公钥) 前 4 字节
    pub fn fingerprint(&self) -> [u8; 4] {
        match &self.material {
            KeyMaterial::Private(xpriv) => xpriv.fingerprint().0,
            KeyMaterial::Public(xpub) => xpub.fingerprint().0,
        }
    }

    /// 序列化为 xprv；只有公钥时返回 `InvalidExtendedKey`
    pub fn to_xprv(&self) -> Result<Zeroizing<String>> {
        match &self.material {
            KeyMaterial::Private(xpriv) => MainnetEncoder::xpriv_to_base58(xpriv)
                .map(Zeroizing::new)
                .map_err(invalid_extended_key),
            KeyMaterial::Public(_) => Err(WalletError::InvalidExtendedKey(
                "public-only key has no xprv encoding".into(),
            )),
        }
    }

    /// 序列化为 xpub
    pub fn to_xpub(&self) -> Result<String> {
        let encoded = match &self.material {
            KeyMaterial::Private(xpriv) => MainnetEncoder::xpub_to_base58(&xpriv.verify_key()),
            KeyMaterial::Public(xpub) => MainnetEncoder::xpub_to_base58(xpub),
        };
        encoded.map_err(invalid_extended_key)
    }

    /// 解析 xprv / xpub 字符串
    pub fn from_base58(encoded: &str) -> Result<Self> {
        let material = match MainnetEncoder::xpriv_from_base58(encoded) {
            Ok(xpriv) => KeyMaterial::Private(xpriv),
            Err(Bip32Error::BadXPrivVersionBytes(_)) => KeyMaterial::Public(
                MainnetEncoder::xpub_from_base58(encoded).map_err(invalid_extended_key)?,
            ),
            Err(e) => return Err(invalid_extended_key(e)),
        };
        Ok(Self {
            material,
            path: DerivationPath::master(),
        })
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("path", &self.path.to_string())
            .field("depth", &self.depth())
            .field("public_key", &self.public_key())
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

fn info_of(material: &KeyMaterial) -> &XKeyInfo {
    match material {
        KeyMaterial::Private(xpriv) => AsRef::<XKeyInfo>::as_ref(xpriv),
        KeyMaterial::Public(xpub) => AsRef::<XKeyInfo>::as_ref(xpub),
    }
}

fn derivation_error(err: Bip32Error, child: ChildNumber) -> WalletError {
    match err {
        Bip32Error::HardenedDerivationFailed => WalletError::HardenedDerivationRequiresPrivateKey,
        other => WalletError::DerivationFailed(format!("{} at {}", other, child)),
    }
}

fn invalid_extended_key(err: Bip32Error) -> WalletError {
    WalletError::InvalidExtendedKey(err.to_string())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 入口函数
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn derive_master(seed: &Seed) -> Result<ExtendedKey> {
    ExtendedKey::master(seed)
}

pub fn derive_child(parent: &ExtendedKey, child: ChildNumber) -> Result<ExtendedKey> {
    parent.derive_child(child)
}

/// 按币种默认路径派生，同一 (种子, 币种) 总是得到同一把密钥
pub fn derive_path(seed: &Seed, coin: CoinType) -> Result<ExtendedKey> {
    derive_path_with(seed, &DerivationPath::for_coin(coin)?)
}

/// 按自定义路径派生
pub fn derive_path_with(seed: &Seed, path: &DerivationPath) -> Result<ExtendedKey> {
    let key = derive_master(seed)?.derive_path(path)?;
    tracing::debug!(path = %path, "derived extended key");
    Ok(key)
}
