//! IronCore Wallet - 多链 HD 钱包内核
//!
//! 离线模式：助记词 → 种子 → 各链密钥，UTXO 选币规划与多协议签名，
//! 不做网络广播，不持久化任何密钥材料。

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use error::{Result, WalletError};

// 统一模块导出
pub mod prelude {
    pub use crate::{
        domain::{
            lookup, CoinParams, CoinType, DerivationPath, ExtendedKey, HdWallet, PrivateKey,
            PublicKey, ScriptExt, ScriptTemplate, SigningProtocol,
        },
        error::{Result, WalletError},
        service::{
            bitcoin::{
                BitcoinSigningInput, BitcoinSigningOutput, EcdsaSighashType, OutPoint,
                TransactionPlan, Utxo,
            },
            EthereumSigningInput, EthereumSigningOutput, SigningEngine, SigningOutput,
            SigningRequest,
        },
    };
}
