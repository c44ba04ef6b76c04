//! 交易体积估算（vbytes）
//!
//! 按输入脚本构造一笔占位交易：签名和公钥用最大长度的零字节填充，
//! 由 `bitcoin::Transaction::weight` 计算权重，`vsize = ceil(weight / 4)`。
//! 签名长度取低 s 值 DER 的上限，实际交易不会超过估算值。

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};

const WITNESS_SCALE: u64 = 4;

/// DER 签名（低 s）最多 71 字节，加 1 字节 sighash 类型
pub const MAX_SIGNATURE_LEN: usize = 72;
pub const COMPRESSED_PUBKEY_LEN: usize = 33;
/// `<sig> <pubkey>`，两个单字节 push 前缀
pub const P2PKH_SCRIPT_SIG_LEN: usize = 1 + MAX_SIGNATURE_LEN + 1 + COMPRESSED_PUBKEY_LEN;

/// 占位输入；无法识别的脚本按 P2PKH 估算
fn placeholder_input(script: &Script) -> TxIn {
    let mut input = TxIn {
        previous_output: OutPoint::null(),
        script_sig: ScriptBuf::new(),
        sequence: Sequence::MAX,
        witness: Witness::new(),
    };

    if script.is_p2wpkh() {
        input.witness = Witness::from_slice(&[
            vec![0u8; MAX_SIGNATURE_LEN],
            vec![0u8; COMPRESSED_PUBKEY_LEN],
        ]);
    } else {
        // 只关心长度
        input.script_sig = ScriptBuf::from_bytes(vec![0u8; P2PKH_SCRIPT_SIG_LEN]);
    }
    input
}

fn placeholder_transaction<'a, I>(input_scripts: I, output_scripts: &[&Script]) -> Transaction
where
    I: IntoIterator<Item = &'a Script>,
{
    Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: input_scripts.into_iter().map(placeholder_input).collect(),
        output: output_scripts
            .iter()
            .map(|script| TxOut {
                value: Amount::ZERO,
                script_pubkey: (*script).to_owned(),
            })
            .collect(),
    }
}

/// 估算交易权重
pub fn estimate_weight<'a, I>(input_scripts: I, output_scripts: &[&Script]) -> u64
where
    I: IntoIterator<Item = &'a Script>,
{
    placeholder_transaction(input_scripts, output_scripts)
        .weight()
        .to_wu()
}

pub fn estimate_vsize<'a, I>(input_scripts: I, output_scripts: &[&Script]) -> u64
where
    I: IntoIterator<Item = &'a Script>,
{
    estimate_weight(input_scripts, output_scripts).div_ceil(WITNESS_SCALE)
}

/// 手续费 = vsize × 每字节费率（溢出时饱和）
pub fn estimate_fee<'a, I>(input_scripts: I, output_scripts: &[&Script], byte_fee: u64) -> u64
where
    I: IntoIterator<Item = &'a Script>,
{
    estimate_vsize(input_scripts, output_scripts).saturating_mul(byte_fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::{p2pkh, p2wpkh};

    #[test]
    fn test_single_p2wpkh_two_p2pkh_outputs() {
        let input = p2wpkh(&[1u8; 20]);
        let out = p2pkh(&[2u8; 20]);
        let out = out.as_script();
        // 10*4 + 2 + 41*4 + 108 + 2*34*4 = 586
        assert_eq!(
            estimate_weight([input.as_script()], &[out, out]),
            586
        );
        assert_eq!(estimate_vsize([input.as_script()], &[out, out]), 147);
        assert_eq!(estimate_fee([input.as_script()], &[out, out], 2), 294);
    }

    #[test]
    fn test_legacy_only_has_no_segwit_header() {
        let input = p2pkh(&[1u8; 20]);
        let out = p2pkh(&[2u8; 20]);
        let out = out.as_script();
        // 10 + 148 + 34
        assert_eq!(estimate_vsize([input.as_script()], &[out]), 192);
        assert_eq!(estimate_weight([input.as_script()], &[out]), 192 * 4);
    }

    #[test]
    fn test_unknown_script_estimated_as_p2pkh() {
        let unknown = ScriptBuf::from_bytes(vec![0x51]);
        let legacy = p2pkh(&[1u8; 20]);
        assert_eq!(
            estimate_weight([unknown.as_script()], &[]),
            estimate_weight([legacy.as_script()], &[])
        );
    }

    #[test]
    fn test_fee_saturates() {
        let input = p2pkh(&[1u8; 20]);
        assert_eq!(estimate_fee([input.as_script()], &[], u64::MAX), u64::MAX);
    }
}
