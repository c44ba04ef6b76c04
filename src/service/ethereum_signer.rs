//! 以太坊系（账户模型）交易签名
//!
//! Legacy 交易 + EIP-155 重放保护：
//! - 签名哈希：`keccak256(rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]))`
//! - `v = recovery_id + chainId * 2 + 35`；没有 chain id 时 `v = recovery_id + 27`
//! - 输出：`rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s])`
//!
//! 数值字段均为大端字节，编码前去掉前导零。

use rlp::{Rlp, RlpStream};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::domain::address::{parse_ethereum_address, to_checksum_address};
use crate::domain::keys::{PrivateKey, PublicKey};
use crate::error::{Result, WalletError};
use crate::utils::bytes::{be_bytes_to_u64, trim_leading_zeros, u128_to_be_trimmed, uint256_field};
use crate::utils::hash::keccak256;

const LEGACY_V_OFFSET: u128 = 27;
const EIP155_V_OFFSET: u128 = 35;

/// 以太坊签名请求
#[derive(Clone, Default)]
pub struct EthereumSigningInput {
    /// 大端字节；为空或为零时不启用 EIP-155
    pub chain_id: Vec<u8>,
    pub nonce: Vec<u8>,
    pub gas_price: Vec<u8>,
    pub gas_limit: Vec<u8>,
    /// 为空时表示合约创建
    pub to_address: String,
    pub amount: Vec<u8>,
    pub payload: Vec<u8>,
    pub private_key: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for EthereumSigningInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumSigningInput")
            .field("chain_id", &hex::encode(&self.chain_id))
            .field("nonce", &hex::encode(&self.nonce))
            .field("gas_price", &hex::encode(&self.gas_price))
            .field("gas_limit", &hex::encode(&self.gas_limit))
            .field("to_address", &self.to_address)
            .field("amount", &hex::encode(&self.amount))
            .field("payload_len", &self.payload.len())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// 签名结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EthereumSigningOutput {
    #[serde(with = "hex::serde")]
    pub encoded: Vec<u8>,
    /// 交易哈希 keccak256(encoded)
    #[serde(with = "hex::serde")]
    pub hash: [u8; 32],
    #[serde(with = "hex::serde")]
    pub v: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub r: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub s: Vec<u8>,
}

impl EthereumSigningOutput {
    /// `0x` 前缀的原始交易，可直接用于 eth_sendRawTransaction
    pub fn encoded_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.encoded))
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }
}

/// 从已签名交易恢复出的发送方
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredSender {
    /// EIP-55 地址
    pub address: String,
    pub chain_id: Option<u64>,
}

/// 未签名交易的六个字段（已校验、已去零）
struct UnsignedFields {
    nonce: Vec<u8>,
    gas_price: Vec<u8>,
    gas_limit: Vec<u8>,
    to: Vec<u8>,
    value: Vec<u8>,
    data: Vec<u8>,
}

impl UnsignedFields {
    fn from_input(input: &EthereumSigningInput) -> Result<Self> {
        let to = if input.to_address.is_empty() {
            Vec::new()
        } else {
            parse_ethereum_address(&input.to_address)?.to_vec()
        };

        Ok(Self {
            nonce: uint256_field("nonce", &input.nonce)?,
            gas_price: uint256_field("gas_price", &input.gas_price)?,
            gas_limit: uint256_field("gas_limit", &input.gas_limit)?,
            to,
            value: uint256_field("amount", &input.amount)?,
            data: input.payload.clone(),
        })
    }

    fn append_to(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        stream.append(&self.to);
        stream.append(&self.value);
        stream.append(&self.data);
    }

    fn signing_hash(&self, chain_id: Option<u64>) -> [u8; 32] {
        let mut stream = RlpStream::new();
        match chain_id {
            Some(chain_id) => {
                stream.begin_list(9);
                self.append_to(&mut stream);
                stream.append(&u128_to_be_trimmed(u128::from(chain_id)));
                stream.append(&Vec::<u8>::new());
                stream.append(&Vec::<u8>::new());
            }
            None => {
                stream.begin_list(6);
                self.append_to(&mut stream);
            }
        }
        keccak256(&stream.out())
    }
}

/// 解析 chain id：超过 8 字节报错，零视为未设置
fn parse_chain_id(bytes: &[u8]) -> Result<Option<u64>> {
    let chain_id = be_bytes_to_u64(bytes)
        .ok_or_else(|| WalletError::InvalidChainId(hex::encode(bytes)))?;
    Ok((chain_id != 0).then_some(chain_id))
}

fn v_value(recovery_id: u8, chain_id: Option<u64>) -> u128 {
    match chain_id {
        Some(chain_id) => u128::from(recovery_id) + u128::from(chain_id) * 2 + EIP155_V_OFFSET,
        None => u128::from(recovery_id) + LEGACY_V_OFFSET,
    }
}

pub struct EthereumSigner;

impl EthereumSigner {
    pub fn sign(input: &EthereumSigningInput) -> Result<EthereumSigningOutput> {
        let chain_id = parse_chain_id(&input.chain_id)?;
        let fields = UnsignedFields::from_input(input)?;
        let key = PrivateKey::from_bytes(&input.private_key)?;

        let digest = fields.signing_hash(chain_id);
        let (signature, recovery_id) = key.sign_recoverable(&digest)?;
        let (r, s) = signature.split_bytes();

        let v = u128_to_be_trimmed(v_value(recovery_id.to_byte(), chain_id));
        let r = trim_leading_zeros(&r).to_vec();
        let s = trim_leading_zeros(&s).to_vec();

        let mut stream = RlpStream::new_list(9);
        fields.append_to(&mut stream);
        stream.append(&v);
        stream.append(&r);
        stream.append(&s);
        let encoded = stream.out().to_vec();
        let hash = keccak256(&encoded);

        tracing::info!(
            chain_id = ?chain_id,
            tx_hash = %hex::encode(hash),
            "ethereum transaction signed"
        );

        Ok(EthereumSigningOutput {
            encoded,
            hash,
            v,
            r,
            s,
        })
    }

    /// 解码已签名交易并恢复发送方地址
    pub fn recover_sender(encoded: &[u8]) -> Result<RecoveredSender> {
        let malformed = |e: rlp::DecoderError| WalletError::MalformedTransaction(e.to_string());

        let rlp = Rlp::new(encoded);
        if !rlp.is_list() || rlp.item_count().map_err(malformed)? != 9 {
            return Err(WalletError::MalformedTransaction(
                "expected a 9-item RLP list".into(),
            ));
        }
        let item = |i: usize| -> Result<Vec<u8>> {
            Ok(rlp.at(i).map_err(malformed)?.data().map_err(malformed)?.to_vec())
        };

        let fields = UnsignedFields {
            nonce: item(0)?,
            gas_price: item(1)?,
            gas_limit: item(2)?,
            to: item(3)?,
            value: item(4)?,
            data: item(5)?,
        };
        let v = be_bytes_to_u64(&item(6)?)
            .map(u128::from)
            .ok_or_else(|| WalletError::MalformedTransaction("v out of range".into()))?;
        let (recovery_id, chain_id) = match v {
            27 | 28 => ((v - LEGACY_V_OFFSET) as u8, None),
            v if v >= EIP155_V_OFFSET => {
                let offset = v - EIP155_V_OFFSET;
                ((offset % 2) as u8, Some((offset / 2) as u64))
            }
            _ => {
                return Err(WalletError::MalformedTransaction(format!(
                    "invalid v value {}",
                    v
                )))
            }
        };

        let mut signature = [0u8; 65];
        for (slot, bytes) in [(0usize, item(7)?), (32usize, item(8)?)] {
            if bytes.len() > 32 {
                return Err(WalletError::MalformedTransaction(
                    "signature component exceeds 32 bytes".into(),
                ));
            }
            signature[slot + 32 - bytes.len()..slot + 32].copy_from_slice(&bytes);
        }
        signature[64] = recovery_id;

        let digest = fields.signing_hash(chain_id);
        let public_key = PublicKey::recover(&digest, &signature)?;
        Ok(RecoveredSender {
            address: to_checksum_address(&public_key.ethereum_address()),
            chain_id,
        })
    }
}
