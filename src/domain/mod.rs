//! Domain 模块
//!
//! 密钥派生、币种注册表、地址与脚本等与链无关的核心模型

pub mod address;
pub mod chain_config;
pub mod derivation;
pub mod keys;
pub mod mnemonic;
pub mod script;
pub mod wallet;

// 重新导出常用类型
pub use chain_config::{lookup, AddressFormat, CoinParams, CoinType, CurveType, SigningProtocol};
pub use derivation::{ChildNumber, DerivationPath, ExtendedKey};
pub use keys::{PrivateKey, PublicKey};
pub use mnemonic::Seed;
pub use script::{ScriptExt, ScriptTemplate};
pub use wallet::{HdWallet, WalletInfo};
