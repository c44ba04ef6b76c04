//! UTXO 链签名器
//!
//! 按规划结果组装交易，再对每个输入按锁定脚本模板签名：
//! - P2PKH：legacy sighash，scriptSig = `<sig> <pubkey>`
//! - P2WPKH：BIP143 sighash，witness = `[sig, pubkey]`

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::sighash::EcdsaSighashType;
use bitcoin::transaction::Version;
use bitcoin::{Amount, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::domain::address::lock_script_for;
use crate::domain::chain_config::{CoinParams, CoinType};
use crate::domain::keys::PrivateKey;
use crate::domain::script::{ScriptExt, ScriptTemplate};
use crate::error::{Result, WalletError};
use crate::service::bitcoin::planner::{TransactionPlan, TransactionPlanner, Utxo};
use crate::service::bitcoin::sighash::{hash_type_from_u32, SighashCalculator};

/// UTXO 签名请求
///
/// `private_keys` 为 32 字节私钥，drop 时清零。
/// 币种由调用方单独给出（`BitcoinSigner::sign(coin, ..)`）。
#[derive(Clone)]
pub struct BitcoinSigningInput {
    /// 原始 sighash 类型，签名时校验；0 表示未指定，按 SIGHASH_ALL 签名
    pub hash_type: u32,
    pub amount: u64,
    /// 每 vbyte 费率
    pub byte_fee: u64,
    pub to_address: String,
    pub change_address: String,
    pub utxos: Vec<Utxo>,
    pub private_keys: Vec<Zeroizing<Vec<u8>>>,
    /// 预先计算好的规划；为空时签名前自动规划
    pub plan: Option<TransactionPlan>,
    /// 花掉全部 UTXO，不找零
    pub use_max_amount: bool,
    pub lock_time: u32,
}

impl BitcoinSigningInput {
    pub fn new() -> Self {
        Self {
            hash_type: 0,
            amount: 0,
            byte_fee: 0,
            to_address: String::new(),
            change_address: String::new(),
            utxos: Vec::new(),
            private_keys: Vec::new(),
            plan: None,
            use_max_amount: false,
            lock_time: 0,
        }
    }
}

impl Default for BitcoinSigningInput {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BitcoinSigningInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitcoinSigningInput")
            .field("hash_type", &format_args!("{:#x}", self.hash_type))
            .field("amount", &self.amount)
            .field("byte_fee", &self.byte_fee)
            .field("to_address", &self.to_address)
            .field("change_address", &self.change_address)
            .field("utxos", &self.utxos.len())
            .field("private_keys", &format_args!("[REDACTED; {}]", self.private_keys.len()))
            .field("plan", &self.plan)
            .field("use_max_amount", &self.use_max_amount)
            .field("lock_time", &self.lock_time)
            .finish()
    }
}

/// 签名结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitcoinSigningOutput {
    /// 线上编码（含见证数据时为 segwit 格式）
    #[serde(with = "hex::serde")]
    pub encoded: Vec<u8>,
    /// 浏览器显示顺序的 txid
    pub transaction_id: String,
    pub transaction: Transaction,
}

impl BitcoinSigningOutput {
    pub fn encoded_hex(&self) -> String {
        hex::encode(&self.encoded)
    }
}

/// 解析后的签名密钥，按 hash160(压缩公钥) 匹配输入
struct KeyRing {
    keys: Vec<([u8; 20], PrivateKey)>,
}

impl KeyRing {
    fn new(raw_keys: &[Zeroizing<Vec<u8>>]) -> Result<Self> {
        let keys = raw_keys
            .iter()
            .map(|raw| {
                let key = PrivateKey::from_bytes(raw)?;
                Ok((key.public_key().hash160(), key))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    fn find(&self, pubkey_hash: &[u8; 20]) -> Option<&PrivateKey> {
        self.keys
            .iter()
            .find(|(hash, _)| hash == pubkey_hash)
            .map(|(_, key)| key)
    }
}

/// 一个输入的解锁数据
enum Unlock {
    ScriptSig(ScriptBuf),
    Witness(Witness),
}

pub struct BitcoinSigner;

impl BitcoinSigner {
    /// 只做规划，不签名
    pub fn plan(coin: CoinType, input: &BitcoinSigningInput) -> Result<TransactionPlan> {
        let params = utxo_params(coin)?;
        let planner = TransactionPlanner::new(params);
        if input.use_max_amount {
            planner.plan_max(&input.utxos, input.byte_fee, &input.to_address)
        } else {
            planner.plan(
                &input.utxos,
                input.amount,
                input.byte_fee,
                &input.to_address,
                &input.change_address,
            )
        }
    }

    pub fn sign(coin: CoinType, input: &BitcoinSigningInput) -> Result<BitcoinSigningOutput> {
        let params = utxo_params(coin)?;
        let hash_type = resolve_hash_type(input.hash_type)?;

        let plan = match &input.plan {
            Some(plan) => {
                plan.validate(params.dust_threshold)?;
                plan.clone()
            }
            None if !input.use_max_amount && input.amount == 0 => {
                return Err(WalletError::PlanRequired)
            }
            None => Self::plan(coin, input)?,
        };

        let unsigned = build_transaction(input, params, &plan)?;
        let keys = KeyRing::new(&input.private_keys)?;

        let mut unlocks = Vec::with_capacity(plan.utxos.len());
        {
            let mut sighasher = SighashCalculator::new(&unsigned);
            for (index, utxo) in plan.utxos.iter().enumerate() {
                unlocks.push(sign_input(&mut sighasher, index, utxo, &keys, hash_type)?);
            }
        }

        let mut signed = unsigned;
        for (tx_in, unlock) in signed.input.iter_mut().zip(unlocks) {
            match unlock {
                Unlock::ScriptSig(script) => tx_in.script_sig = script,
                Unlock::Witness(witness) => tx_in.witness = witness,
            }
        }

        let encoded = serialize(&signed);
        let transaction_id = signed.compute_txid().to_string();
        tracing::info!(
            coin = params.symbol,
            txid = %transaction_id,
            inputs = signed.input.len(),
            outputs = signed.output.len(),
            fee = plan.fee,
            "utxo transaction signed"
        );

        Ok(BitcoinSigningOutput {
            encoded,
            transaction_id,
            transaction: signed,
        })
    }
}

fn resolve_hash_type(raw: u32) -> Result<EcdsaSighashType> {
    if raw == 0 {
        Ok(EcdsaSighashType::All)
    } else {
        hash_type_from_u32(raw)
    }
}

fn utxo_params(coin: CoinType) -> Result<&'static CoinParams> {
    let params = coin.params();
    if params.is_utxo() {
        Ok(params)
    } else {
        Err(WalletError::PlanningNotSupported(coin))
    }
}

/// 输入按规划顺序，输出为收款方 + 找零（找零为 0 时省略）
fn build_transaction(
    input: &BitcoinSigningInput,
    params: &CoinParams,
    plan: &TransactionPlan,
) -> Result<Transaction> {
    let mut output = vec![TxOut {
        value: Amount::from_sat(plan.amount),
        script_pubkey: lock_script_for(&input.to_address, params)?,
    }];
    if plan.change > 0 {
        let change_script = lock_script_for(&input.change_address, params)
            .map_err(|_| WalletError::InvalidChangeAddress(input.change_address.clone()))?;
        output.push(TxOut {
            value: Amount::from_sat(plan.change),
            script_pubkey: change_script,
        });
    }

    let input_list = plan
        .utxos
        .iter()
        .map(|utxo| TxIn {
            previous_output: utxo.out_point,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        })
        .collect();

    Ok(Transaction {
        version: Version::ONE,
        lock_time: LockTime::from_consensus(input.lock_time),
        input: input_list,
        output,
    })
}

fn sign_input(
    sighasher: &mut SighashCalculator<'_>,
    index: usize,
    utxo: &Utxo,
    keys: &KeyRing,
    hash_type: EcdsaSighashType,
) -> Result<Unlock> {
    match utxo.script.template() {
        ScriptTemplate::PayToPubkeyHash(hash) => {
            let key = keys
                .find(&hash)
                .ok_or(WalletError::MissingPrivateKeyForInput { index })?;
            let digest = sighasher.legacy(index, &utxo.script, hash_type)?;
            let signature = signature_with_hash_type(key, &digest, hash_type)?;

            let script_sig = Builder::new()
                .push_slice(push_bytes(signature)?)
                .push_slice(push_bytes(key.public_key().compressed().to_vec())?)
                .into_script();
            Ok(Unlock::ScriptSig(script_sig))
        }
        ScriptTemplate::PayToWitnessPubkeyHash(hash) => {
            let key = keys
                .find(&hash)
                .ok_or(WalletError::MissingPrivateKeyForInput { index })?;
            let digest = sighasher.segwit_v0(index, &utxo.script, utxo.amount, hash_type)?;
            let signature = signature_with_hash_type(key, &digest, hash_type)?;

            Ok(Unlock::Witness(Witness::from_slice(&[
                signature,
                key.public_key().compressed().to_vec(),
            ])))
        }
        _ => Err(WalletError::UnsupportedScriptTemplate(format!(
            "input {}: {}",
            index,
            hex::encode(utxo.script.as_bytes())
        ))),
    }
}

fn push_bytes(data: Vec<u8>) -> Result<PushBytesBuf> {
    PushBytesBuf::try_from(data)
        .map_err(|e| WalletError::MalformedTransaction(format!("script push: {}", e)))
}

/// DER 签名 + sighash 类型字节
fn signature_with_hash_type(
    key: &PrivateKey,
    digest: &[u8; 32],
    hash_type: EcdsaSighashType,
) -> Result<Vec<u8>> {
    let mut signature = key.sign_der(digest)?;
    signature.push(hash_type.to_u32() as u8);
    Ok(signature)
}
