//! 比特币系（UTXO 模型）交易：体积估算、选币规划、sighash 与签名
//!
//! 交易结构与编码使用 `bitcoin` crate。

pub mod fee;
pub mod planner;
pub mod sighash;
pub mod signer;

pub use bitcoin::sighash::EcdsaSighashType;
pub use bitcoin::{OutPoint, Transaction, TxIn, TxOut, Txid};
pub use planner::{TransactionPlan, TransactionPlanner, Utxo, MAX_FEE_PASSES};
pub use signer::{BitcoinSigner, BitcoinSigningInput, BitcoinSigningOutput};
