//! UTXO 选币与手续费规划
//!
//! 选币策略：按金额从大到小稳定排序，取能覆盖 `金额 + 无找零手续费` 的最短前缀。
//! 手续费分两轮计算：先按带找零输出估算；找零低于粉尘阈值时去掉找零输出，
//! 剩余部分全部计入手续费。

use std::collections::HashSet;

use bitcoin::{OutPoint, Script, ScriptBuf};
use serde::{Deserialize, Serialize};

use crate::domain::address::lock_script_for;
use crate::domain::chain_config::{CoinParams, CoinType};
use crate::error::{Result, WalletError};
use crate::service::bitcoin::fee::estimate_fee;

/// 手续费计算的最大轮数
pub const MAX_FEE_PASSES: usize = 2;

/// 可花费输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub out_point: OutPoint,
    pub amount: u64,
    /// 锁定脚本
    pub script: ScriptBuf,
}

impl Utxo {
    pub fn new(out_point: OutPoint, amount: u64, script: ScriptBuf) -> Self {
        Self {
            out_point,
            amount,
            script,
        }
    }
}

/// 规划结果
///
/// 不变量：`available_amount = Σ utxos.amount = amount + fee + change`，
/// `change` 为 0 或不低于粉尘阈值。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPlan {
    pub utxos: Vec<Utxo>,
    pub amount: u64,
    pub available_amount: u64,
    pub fee: u64,
    pub change: u64,
}

impl TransactionPlan {
    /// 检查外部传入的规划是否自洽
    pub fn validate(&self, dust_threshold: u64) -> Result<()> {
        if self.utxos.is_empty() {
            return Err(WalletError::InvalidPlan("plan selects no inputs".into()));
        }
        if self.amount == 0 {
            return Err(WalletError::InvalidPlan("plan amount is zero".into()));
        }
        ensure_unique(&self.utxos)?;

        let selected = sum_amounts(self.utxos.iter())
            .ok_or_else(|| WalletError::InvalidPlan("input total overflows".into()))?;
        if selected != self.available_amount {
            return Err(WalletError::InvalidPlan(format!(
                "available amount {} does not match selected inputs {}",
                self.available_amount, selected
            )));
        }

        let spent = self
            .amount
            .checked_add(self.fee)
            .and_then(|v| v.checked_add(self.change))
            .ok_or_else(|| WalletError::InvalidPlan("amount + fee + change overflows".into()))?;
        if spent != self.available_amount {
            return Err(WalletError::InvalidPlan(format!(
                "amount {} + fee {} + change {} != available {}",
                self.amount, self.fee, self.change, self.available_amount
            )));
        }

        if self.change != 0 && self.change < dust_threshold {
            return Err(WalletError::InvalidPlan(format!(
                "change {} is below dust threshold {}",
                self.change, dust_threshold
            )));
        }
        Ok(())
    }
}

/// 交易规划器
#[derive(Debug, Clone, Copy)]
pub struct TransactionPlanner {
    params: &'static CoinParams,
}

impl TransactionPlanner {
    pub fn new(params: &'static CoinParams) -> Self {
        Self { params }
    }

    pub fn for_coin(coin: CoinType) -> Self {
        Self::new(coin.params())
    }

    /// 为固定金额选币并计算手续费与找零
    pub fn plan(
        &self,
        utxos: &[Utxo],
        amount: u64,
        byte_fee: u64,
        to_address: &str,
        change_address: &str,
    ) -> Result<TransactionPlan> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount("amount must be positive".into()));
        }
        ensure_unique(utxos)?;

        let to_script = lock_script_for(to_address, self.params)?;
        let change_script = lock_script_for(change_address, self.params)
            .map_err(|_| WalletError::InvalidChangeAddress(change_address.to_string()))?;

        let mut candidates: Vec<&Utxo> = utxos.iter().collect();
        candidates.sort_by(|a, b| b.amount.cmp(&a.amount));

        let selected = select_prefix(&candidates, amount, byte_fee, &to_script)?;
        let total = sum_amounts(selected.iter().copied())
            .ok_or_else(|| WalletError::InvalidAmount("input total overflows".into()))?;
        // 选币保证 total ≥ amount
        let spendable = total - amount;

        let mut with_change = true;
        for pass in 0..MAX_FEE_PASSES {
            let outputs: Vec<&Script> = if with_change {
                vec![to_script.as_script(), change_script.as_script()]
            } else {
                vec![to_script.as_script()]
            };
            let fee = estimate_fee(
                selected.iter().map(|u| u.script.as_script()),
                &outputs,
                byte_fee,
            );

            match spendable.checked_sub(fee) {
                Some(change) if with_change && change >= self.params.dust_threshold => {
                    return Ok(self.finish(&selected, amount, total, fee, change));
                }
                Some(_) if with_change => {
                    tracing::debug!(
                        coin = self.params.symbol,
                        pass,
                        "change below dust threshold, folding into fee"
                    );
                    with_change = false;
                }
                Some(_) => {
                    return Ok(self.finish(&selected, amount, total, spendable, 0));
                }
                None if with_change => with_change = false,
                None => break,
            }
        }

        Err(WalletError::PlanDidNotConverge(MAX_FEE_PASSES))
    }

    /// 花掉全部 UTXO，扣除手续费后全部转给收款方，不产生找零
    pub fn plan_max(&self, utxos: &[Utxo], byte_fee: u64, to_address: &str) -> Result<TransactionPlan> {
        ensure_unique(utxos)?;
        let to_script = lock_script_for(to_address, self.params)?;

        let total = sum_amounts(utxos.iter())
            .ok_or_else(|| WalletError::InvalidAmount("input total overflows".into()))?;
        let fee = estimate_fee(
            utxos.iter().map(|u| u.script.as_script()),
            &[to_script.as_script()],
            byte_fee,
        );

        match total.checked_sub(fee) {
            Some(amount) if !utxos.is_empty() && amount >= self.params.dust_threshold => {
                let selected: Vec<&Utxo> = utxos.iter().collect();
                Ok(self.finish(&selected, amount, total, fee, 0))
            }
            _ => Err(WalletError::InsufficientFunds {
                available: total,
                required: fee.saturating_add(self.params.dust_threshold),
            }),
        }
    }

    fn finish(
        &self,
        selected: &[&Utxo],
        amount: u64,
        total: u64,
        fee: u64,
        change: u64,
    ) -> TransactionPlan {
        tracing::debug!(
            coin = self.params.symbol,
            inputs = selected.len(),
            amount,
            fee,
            change,
            "transaction planned"
        );
        TransactionPlan {
            utxos: selected.iter().map(|u| (*u).clone()).collect(),
            amount,
            available_amount: total,
            fee,
            change,
        }
    }
}

/// 取最短的、能覆盖 `amount + 无找零手续费` 的前缀
fn select_prefix<'a>(
    candidates: &[&'a Utxo],
    amount: u64,
    byte_fee: u64,
    to_script: &Script,
) -> Result<Vec<&'a Utxo>> {
    let mut total = 0u64;
    let mut required = amount;
    for (n, utxo) in candidates.iter().enumerate() {
        total = total
            .checked_add(utxo.amount)
            .ok_or_else(|| WalletError::InvalidAmount("input total overflows".into()))?;
        let prefix = &candidates[..=n];
        let fee = estimate_fee(
            prefix.iter().map(|u| u.script.as_script()),
            &[to_script],
            byte_fee,
        );
        required = amount
            .checked_add(fee)
            .ok_or_else(|| WalletError::InvalidAmount("amount + fee overflows".into()))?;
        if total >= required {
            return Ok(prefix.to_vec());
        }
    }

    Err(WalletError::InsufficientFunds {
        available: total,
        required,
    })
}

fn sum_amounts<'a>(mut utxos: impl Iterator<Item = &'a Utxo>) -> Option<u64> {
    utxos.try_fold(0u64, |acc, u| acc.checked_add(u.amount))
}

fn ensure_unique(utxos: &[Utxo]) -> Result<()> {
    let mut seen = HashSet::with_capacity(utxos.len());
    for utxo in utxos {
        if !seen.insert(utxo.out_point) {
            return Err(WalletError::DuplicateInput {
                txid: utxo.out_point.txid.to_string(),
                index: utxo.out_point.vout,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::p2wpkh;
    use bitcoin::hashes::Hash;
    use bitcoin::Txid;

    const TO: &str = "1Bp9U1ogV3A14FMvKbRJms7ctyso4Z4Tcx";
    const CHANGE: &str = "1FQc5LdgGHMHEN9nwkjmz6tWkxhPpxBvBU";

    fn utxo(tag: u8, amount: u64) -> Utxo {
        Utxo::new(
            OutPoint::new(Txid::from_byte_array([tag; 32]), 0),
            amount,
            p2wpkh(&[tag; 20]),
        )
    }

    fn planner() -> TransactionPlanner {
        TransactionPlanner::for_coin(CoinType::Bitcoin)
    }

    #[test]
    fn test_single_input_with_change() {
        let plan = planner()
            .plan(&[utxo(1, 5151)], 600, 2, TO, CHANGE)
            .unwrap();
        assert_eq!(plan.utxos.len(), 1);
        assert_eq!(plan.fee, 294);
        assert_eq!(plan.change, 4257);
        assert_eq!(plan.available_amount, 5151);
        plan.validate(546).unwrap();
    }

    #[test]
    fn test_selects_largest_first() {
        let utxos = [utxo(1, 1_000), utxo(2, 50_000), utxo(3, 20_000)];
        let plan = planner().plan(&utxos, 30_000, 1, TO, CHANGE).unwrap();
        assert_eq!(plan.utxos.len(), 1);
        assert_eq!(plan.utxos[0].amount, 50_000);

        let plan = planner().plan(&utxos, 60_000, 1, TO, CHANGE).unwrap();
        assert_eq!(
            plan.utxos.iter().map(|u| u.amount).collect::<Vec<_>>(),
            vec![50_000, 20_000]
        );
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let utxos = [utxo(1, 10_000), utxo(2, 10_000)];
        let plan = planner().plan(&utxos, 5_000, 1, TO, CHANGE).unwrap();
        assert_eq!(plan.utxos[0].out_point, utxos[0].out_point);
    }

    #[test]
    fn test_dust_change_folded_into_fee() {
        // 无找零手续费 226，带找零 294；剩余 300 < 546
        let plan = planner().plan(&[utxo(1, 900)], 600, 2, TO, CHANGE).unwrap();
        assert_eq!(plan.change, 0);
        assert_eq!(plan.fee, 300);
        plan.validate(546).unwrap();
    }

    #[test]
    fn test_insufficient_funds() {
        let err = planner()
            .plan(&[utxo(1, 700), utxo(2, 100)], 10_000, 2, TO, CHANGE)
            .unwrap_err();
        match err {
            WalletError::InsufficientFunds {
                available,
                required,
            } => {
                assert_eq!(available, 800);
                assert!(required > 10_000);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_utxos_insufficient() {
        assert!(matches!(
            planner().plan(&[], 1, 1, TO, CHANGE),
            Err(WalletError::InsufficientFunds { available: 0, .. })
        ));
    }

    #[test]
    fn test_amount_plus_fee_overflow_rejected() {
        assert!(matches!(
            planner().plan(&[utxo(1, u64::MAX), utxo(2, u64::MAX)], u64::MAX - 1, 2, TO, CHANGE),
            Err(WalletError::InvalidAmount(_))
        ));
        // 第一个输入不够，累加第二个时溢出
        let utxos = [utxo(1, u64::MAX - 1), utxo(2, 10)];
        assert!(matches!(
            planner().plan(&utxos, u64::MAX, 0, TO, CHANGE),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_zero_amount_rejected() {
        assert!(matches!(
            planner().plan(&[utxo(1, 5151)], 0, 2, TO, CHANGE),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_duplicate_outpoint_rejected() {
        let err = planner()
            .plan(&[utxo(1, 5151), utxo(1, 5151)], 600, 2, TO, CHANGE)
            .unwrap_err();
        assert!(matches!(err, WalletError::DuplicateInput { index: 0, .. }));
    }

    #[test]
    fn test_bad_addresses() {
        assert!(matches!(
            planner().plan(&[utxo(1, 5151)], 600, 2, "bogus", CHANGE),
            Err(WalletError::InvalidRecipientAddress(_))
        ));
        assert!(matches!(
            planner().plan(&[utxo(1, 5151)], 600, 2, TO, "bogus"),
            Err(WalletError::InvalidChangeAddress(_))
        ));
    }

    #[test]
    fn test_plan_max() {
        let utxos = [utxo(1, 3_000), utxo(2, 2_000)];
        let plan = planner().plan_max(&utxos, 1, TO).unwrap();
        assert_eq!(plan.utxos.len(), 2);
        assert_eq!(plan.change, 0);
        assert_eq!(plan.amount + plan.fee, 5_000);
        plan.validate(546).unwrap();

        assert!(matches!(
            planner().plan_max(&[utxo(1, 600)], 2, TO),
            Err(WalletError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inconsistent_plan() {
        let mut plan = planner()
            .plan(&[utxo(1, 5151)], 600, 2, TO, CHANGE)
            .unwrap();
        plan.fee += 1;
        assert!(matches!(plan.validate(546), Err(WalletError::InvalidPlan(_))));

        let mut plan = TransactionPlan {
            utxos: vec![utxo(1, 1_000)],
            amount: 500,
            available_amount: 1_000,
            fee: 400,
            change: 100,
        };
        assert!(plan.validate(546).is_err());
        plan.change = 0;
        plan.fee = 500;
        plan.validate(546).unwrap();
    }
}
