//! 签名引擎：按币种的协议族把请求路由到对应的链签名器
//!
//! 引擎本身不做任何密码学运算，只负责：
//! 1. 通过注册表解析币种参数
//! 2. 校验请求类型与币种协议一致
//! 3. UTXO 请求未指定费率或 sighash 类型时按 `PlannerConfig` 补齐
//! 4. 调用签名器并原样返回结果

use std::borrow::Cow;

use serde::Serialize;

use crate::config::PlannerConfig;
use crate::domain::address;
use crate::domain::chain_config::{lookup, CoinParams, CoinType, SigningProtocol};
use crate::domain::keys::PublicKey;
use crate::error::{Result, WalletError};
use crate::service::bitcoin::{BitcoinSigner, BitcoinSigningInput, BitcoinSigningOutput, TransactionPlan};
use crate::service::ethereum_signer::{EthereumSigner, EthereumSigningInput, EthereumSigningOutput};
use crate::utils::bytes::trim_leading_zeros;

/// 协议族签名能力：{规划（可选）、签名、地址编码}
pub trait ChainSigner {
    type Input;
    type Output;

    const PROTOCOL: SigningProtocol;

    fn plan(params: &'static CoinParams, _input: &Self::Input) -> Result<TransactionPlan> {
        Err(WalletError::PlanningNotSupported(params.coin))
    }

    fn sign(params: &'static CoinParams, input: &Self::Input) -> Result<Self::Output>;

    fn encode_address(public_key: &PublicKey, params: &CoinParams) -> String {
        address::encode_address(public_key, params)
    }
}

impl ChainSigner for EthereumSigner {
    type Input = EthereumSigningInput;
    type Output = EthereumSigningOutput;

    const PROTOCOL: SigningProtocol = SigningProtocol::Ethereum;

    /// 请求未指定 chain id 时使用币种默认值
    fn sign(params: &'static CoinParams, input: &Self::Input) -> Result<Self::Output> {
        match params.chain_id {
            Some(chain_id) if trim_leading_zeros(&input.chain_id).is_empty() => {
                let mut input = input.clone();
                input.chain_id = chain_id.to_be_bytes().to_vec();
                EthereumSigner::sign(&input)
            }
            _ => EthereumSigner::sign(input),
        }
    }
}

impl ChainSigner for BitcoinSigner {
    type Input = BitcoinSigningInput;
    type Output = BitcoinSigningOutput;

    const PROTOCOL: SigningProtocol = SigningProtocol::Bitcoin;

    fn plan(params: &'static CoinParams, input: &Self::Input) -> Result<TransactionPlan> {
        BitcoinSigner::plan(params.coin, input)
    }

    fn sign(params: &'static CoinParams, input: &Self::Input) -> Result<Self::Output> {
        BitcoinSigner::sign(params.coin, input)
    }
}

/// 按协议族区分的签名请求
#[derive(Debug, Clone)]
pub enum SigningRequest {
    Ethereum(EthereumSigningInput),
    Bitcoin(BitcoinSigningInput),
}

impl SigningRequest {
    pub fn protocol(&self) -> SigningProtocol {
        match self {
            SigningRequest::Ethereum(_) => SigningProtocol::Ethereum,
            SigningRequest::Bitcoin(_) => SigningProtocol::Bitcoin,
        }
    }
}

impl From<EthereumSigningInput> for SigningRequest {
    fn from(input: EthereumSigningInput) -> Self {
        SigningRequest::Ethereum(input)
    }
}

impl From<BitcoinSigningInput> for SigningRequest {
    fn from(input: BitcoinSigningInput) -> Self {
        SigningRequest::Bitcoin(input)
    }
}

/// 签名结果，与请求的协议族一一对应
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum SigningOutput {
    Ethereum(EthereumSigningOutput),
    Bitcoin(BitcoinSigningOutput),
}

impl SigningOutput {
    pub fn protocol(&self) -> SigningProtocol {
        match self {
            SigningOutput::Ethereum(_) => SigningProtocol::Ethereum,
            SigningOutput::Bitcoin(_) => SigningProtocol::Bitcoin,
        }
    }

    /// 可广播的原始交易字节
    pub fn encoded(&self) -> &[u8] {
        match self {
            SigningOutput::Ethereum(output) => &output.encoded,
            SigningOutput::Bitcoin(output) => &output.encoded,
        }
    }

    pub fn as_ethereum(&self) -> Option<&EthereumSigningOutput> {
        match self {
            SigningOutput::Ethereum(output) => Some(output),
            SigningOutput::Bitcoin(_) => None,
        }
    }

    pub fn as_bitcoin(&self) -> Option<&BitcoinSigningOutput> {
        match self {
            SigningOutput::Bitcoin(output) => Some(output),
            SigningOutput::Ethereum(_) => None,
        }
    }
}

/// 签名引擎
#[derive(Debug, Clone, Default)]
pub struct SigningEngine {
    planner: PlannerConfig,
}

impl SigningEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(planner: PlannerConfig) -> Self {
        Self { planner }
    }

    pub fn planner_config(&self) -> &PlannerConfig {
        &self.planner
    }

    /// `byte_fee == 0` / `hash_type == 0` 视为未指定
    fn with_planner_defaults<'a>(
        &self,
        input: &'a BitcoinSigningInput,
    ) -> Cow<'a, BitcoinSigningInput> {
        if input.byte_fee != 0 && input.hash_type != 0 {
            return Cow::Borrowed(input);
        }

        let mut filled = input.clone();
        if filled.byte_fee == 0 {
            filled.byte_fee = self.planner.default_byte_fee;
        }
        if filled.hash_type == 0 {
            filled.hash_type = self.planner.default_hash_type;
        }
        tracing::debug!(
            byte_fee = filled.byte_fee,
            hash_type = filled.hash_type,
            "planner defaults applied"
        );
        Cow::Owned(filled)
    }

    /// UTXO 币种的选币与手续费规划
    pub fn plan(&self, request: &SigningRequest, coin: CoinType) -> Result<TransactionPlan> {
        let params = coin.params();
        check_protocol(params, request)?;

        tracing::debug!(coin = params.symbol, "planning transaction");
        match request {
            SigningRequest::Bitcoin(input) => {
                let input = self.with_planner_defaults(input);
                <BitcoinSigner as ChainSigner>::plan(params, &input)
            }
            SigningRequest::Ethereum(input) => <EthereumSigner as ChainSigner>::plan(params, input),
        }
    }

    pub fn plan_by_id(&self, request: &SigningRequest, coin_id: u32) -> Result<TransactionPlan> {
        self.plan(request, lookup(coin_id)?.coin)
    }

    /// 签名并返回协议对应的输出
    pub fn sign(&self, request: &SigningRequest, coin: CoinType) -> Result<SigningOutput> {
        let params = coin.params();
        check_protocol(params, request)?;

        tracing::info!(
            coin = params.symbol,
            protocol = ?params.signing_protocol,
            "dispatching signing request"
        );
        let output = match request {
            SigningRequest::Ethereum(input) => {
                SigningOutput::Ethereum(<EthereumSigner as ChainSigner>::sign(params, input)?)
            }
            SigningRequest::Bitcoin(input) => {
                let input = self.with_planner_defaults(input);
                SigningOutput::Bitcoin(<BitcoinSigner as ChainSigner>::sign(params, &input)?)
            }
        };
        Ok(output)
    }

    pub fn sign_by_id(&self, request: &SigningRequest, coin_id: u32) -> Result<SigningOutput> {
        self.sign(request, lookup(coin_id)?.coin)
    }

    /// 按币种默认格式编码地址
    pub fn encode_address(&self, public_key: &PublicKey, coin: CoinType) -> String {
        let params = coin.params();
        match params.signing_protocol {
            SigningProtocol::Ethereum => EthereumSigner::encode_address(public_key, params),
            SigningProtocol::Bitcoin => BitcoinSigner::encode_address(public_key, params),
        }
    }
}

fn check_protocol(params: &CoinParams, request: &SigningRequest) -> Result<()> {
    let actual = request.protocol();
    if params.signing_protocol != actual {
        tracing::warn!(
            coin = params.symbol,
            expected = ?params.signing_protocol,
            actual = ?actual,
            "signing request does not match coin protocol"
        );
        return Err(WalletError::CoinProtocolMismatch {
            coin: params.coin,
            expected: params.signing_protocol,
            actual,
        });
    }
    Ok(())
}
