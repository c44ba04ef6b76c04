//! 统一错误类型
//!
//! 所有派生、规划、签名操作都以 `WalletError` 同步返回失败；内核不做任何内部重试。

use thiserror::Error;

use crate::domain::chain_config::{CoinType, SigningProtocol};

/// 钱包内核错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    // 派生相关
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("hardened derivation requires a private key")]
    HardenedDerivationRequiresPrivateKey,

    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),

    // 币种注册表
    #[error("unsupported coin: {0}")]
    UnsupportedCoin(String),

    #[error("coin {coin:?} expects a {expected:?} request, got {actual:?}")]
    CoinProtocolMismatch {
        coin: CoinType,
        expected: SigningProtocol,
        actual: SigningProtocol,
    },

    #[error("planning is not supported for {0:?}")]
    PlanningNotSupported(CoinType),

    // 交易规划
    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("duplicate input {txid}:{index}")]
    DuplicateInput { txid: String, index: u32 },

    #[error("fee did not converge after {0} passes")]
    PlanDidNotConverge(usize),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("a transaction plan or amount is required")]
    PlanRequired,

    // 签名
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("invalid recipient address: {0}")]
    InvalidRecipientAddress(String),

    #[error("invalid change address: {0}")]
    InvalidChangeAddress(String),

    #[error("invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("missing private key for input {index}")]
    MissingPrivateKeyForInput { index: usize },

    #[error("unsupported script template: {0}")]
    UnsupportedScriptTemplate(String),

    #[error("unsupported sighash type: {0:#x}")]
    UnsupportedHashType(u32),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),
}

impl WalletError {
    /// 稳定的错误码，供上层做映射
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::InvalidMnemonic(_) => "invalid_mnemonic",
            WalletError::HardenedDerivationRequiresPrivateKey => {
                "hardened_derivation_requires_private_key"
            }
            WalletError::InvalidDerivationPath(_) => "invalid_derivation_path",
            WalletError::DerivationFailed(_) => "derivation_failed",
            WalletError::InvalidExtendedKey(_) => "invalid_extended_key",
            WalletError::UnsupportedCoin(_) => "unsupported_coin",
            WalletError::CoinProtocolMismatch { .. } => "coin_protocol_mismatch",
            WalletError::PlanningNotSupported(_) => "planning_not_supported",
            WalletError::InsufficientFunds { .. } => "insufficient_funds",
            WalletError::InvalidAmount(_) => "invalid_amount",
            WalletError::DuplicateInput { .. } => "duplicate_input",
            WalletError::PlanDidNotConverge(_) => "plan_did_not_converge",
            WalletError::InvalidPlan(_) => "invalid_plan",
            WalletError::PlanRequired => "plan_required",
            WalletError::InvalidPrivateKey => "invalid_private_key",
            WalletError::SigningFailed(_) => "signing_failed",
            WalletError::InvalidRecipientAddress(_) => "invalid_recipient_address",
            WalletError::InvalidChangeAddress(_) => "invalid_change_address",
            WalletError::InvalidChainId(_) => "invalid_chain_id",
            WalletError::MissingPrivateKeyForInput { .. } => "missing_private_key_for_input",
            WalletError::UnsupportedScriptTemplate(_) => "unsupported_script_template",
            WalletError::UnsupportedHashType(_) => "unsupported_hash_type",
            WalletError::MalformedTransaction(_) => "malformed_transaction",
        }
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
