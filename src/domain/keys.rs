//! secp256k1 私钥 / 公钥封装
//!
//! `SigningKey` 内部的标量在 drop 时清零；这里的 `Debug` 也不会打印私钥。

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};
use crate::utils::hash::{hash160, keccak256};

/// 已校验的 secp256k1 私钥（非零且小于曲线阶 n）
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
}

impl PrivateKey {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(WalletError::InvalidPrivateKey);
        }
        let key = SigningKey::from_slice(bytes).map_err(|_| WalletError::InvalidPrivateKey)?;
        Ok(Self { key })
    }

    pub fn is_valid(bytes: &[u8]) -> bool {
        Self::from_bytes(bytes).is_ok()
    }

    pub(crate) fn from_signing_key(key: SigningKey) -> Self {
        Self { key }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// 导出私钥字节，调用方持有的缓冲区 drop 时清零
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.key.to_bytes().into())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            key: *self.key.verifying_key(),
        }
    }

    /// 对 32 字节摘要做 RFC6979 确定性签名，返回 r || s || recovery_id (低 s)
    pub fn sign(&self, digest: &[u8; 32]) -> Result<[u8; 65]> {
        let (signature, recovery_id) = self.sign_recoverable(digest)?;
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte();
        Ok(out)
    }

    /// DER 编码签名（比特币脚本使用）
    pub fn sign_der(&self, digest: &[u8; 32]) -> Result<Vec<u8>> {
        let (signature, _) = self.sign_recoverable(digest)?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    pub(crate) fn sign_recoverable(&self, digest: &[u8; 32]) -> Result<(Signature, RecoveryId)> {
        self.key
            .sign_prehash_recoverable(digest)
            .map_err(|e| WalletError::SigningFailed(e.to_string()))
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &hex::encode(self.public_key().compressed()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// secp256k1 公钥
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    key: VerifyingKey,
}

impl PublicKey {
    /// 从 SEC1 编码（压缩 33 字节或非压缩 65 字节）解析
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|_| WalletError::InvalidExtendedKey("invalid public key".into()))?;
        Ok(Self { key })
    }

    pub(crate) fn from_verifying_key(key: VerifyingKey) -> Self {
        Self { key }
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }

    pub fn compressed(&self) -> [u8; 33] {
        let point = self.key.to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(point.as_bytes());
        out
    }

    pub fn uncompressed(&self) -> [u8; 65] {
        let point = self.key.to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// 压缩公钥的 HASH160
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.compressed())
    }

    /// 以太坊地址字节：keccak256(X || Y) 的后 20 字节
    pub fn ethereum_address(&self) -> [u8; 20] {
        let uncompressed = self.uncompressed();
        let hash = keccak256(&uncompressed[1..]);
        let mut out = [0u8; 20];
        out.copy_from_slice(&hash[12..]);
        out
    }

    /// 校验 DER 签名
    pub fn verify_der(&self, digest: &[u8; 32], der: &[u8]) -> bool {
        match Signature::from_der(der) {
            Ok(signature) => self.key.verify_prehash(digest, &signature).is_ok(),
            Err(_) => false,
        }
    }

    /// 从 r || s || recovery_id 恢复公钥
    pub fn recover(digest: &[u8; 32], signature: &[u8; 65]) -> Result<Self> {
        let sig = Signature::from_slice(&signature[..64])
            .map_err(|e| WalletError::MalformedTransaction(format!("bad signature: {}", e)))?;
        let recovery_id = RecoveryId::from_byte(signature[64])
            .ok_or_else(|| WalletError::MalformedTransaction("bad recovery id".into()))?;
        let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
            .map_err(|e| WalletError::MalformedTransaction(format!("recovery failed: {}", e)))?;
        Ok(Self { key })
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.compressed()))
    }
}
