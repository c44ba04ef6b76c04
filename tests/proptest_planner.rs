mod common;

use bitcoin::hashes::Hash;
use bitcoin::{OutPoint, Txid};
use proptest::prelude::*;

use common::{BTC_CHANGE, BTC_RECIPIENT};
use ironcore_wallet::domain::derivation::derive_master;
use ironcore_wallet::domain::script::{p2pkh, p2wpkh};
use ironcore_wallet::domain::{ChildNumber, CoinType, ExtendedKey, Seed};
use ironcore_wallet::error::WalletError;
use ironcore_wallet::service::bitcoin::{TransactionPlanner, Utxo};

fn make_utxos(amounts: &[u64], segwit: bool) -> Vec<Utxo> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            let mut hash = [0u8; 32];
            hash[..8].copy_from_slice(&(i as u64).to_le_bytes());
            let script = if segwit {
                p2wpkh(&[i as u8; 20])
            } else {
                p2pkh(&[i as u8; 20])
            };
            Utxo::new(OutPoint::new(Txid::from_byte_array(hash), i as u32), *amount, script)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn plan_balances_and_respects_dust(
        amounts in prop::collection::vec(1_000u64..5_000_000, 1..12),
        amount in 1u64..10_000_000,
        byte_fee in 1u64..200,
        segwit in any::<bool>(),
    ) {
        let utxos = make_utxos(&amounts, segwit);
        let planner = TransactionPlanner::for_coin(CoinType::Bitcoin);
        let total: u64 = amounts.iter().sum();

        match planner.plan(&utxos, amount, byte_fee, BTC_RECIPIENT, BTC_CHANGE) {
            Ok(plan) => {
                prop_assert_eq!(plan.amount, amount);
                prop_assert_eq!(plan.available_amount, plan.amount + plan.fee + plan.change);
                prop_assert!(plan.change == 0 || plan.change >= 546);
                prop_assert!(plan.available_amount <= total);
                prop_assert!(plan.validate(546).is_ok());

                // 选中的是按金额降序的最短前缀
                let mut sorted = amounts.clone();
                sorted.sort_unstable_by(|a, b| b.cmp(a));
                let chosen: Vec<u64> = plan.utxos.iter().map(|u| u.amount).collect();
                prop_assert_eq!(&chosen[..], &sorted[..chosen.len()]);
            }
            Err(WalletError::InsufficientFunds { available, required }) => {
                prop_assert_eq!(available, total);
                prop_assert!(required > available);
            }
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }

    #[test]
    fn plan_max_spends_every_input(
        amounts in prop::collection::vec(100_000u64..1_000_000, 1..8),
        byte_fee in 1u64..50,
    ) {
        let utxos = make_utxos(&amounts, true);
        let plan = TransactionPlanner::for_coin(CoinType::Bitcoin)
            .plan_max(&utxos, byte_fee, BTC_RECIPIENT)
            .unwrap();

        prop_assert_eq!(plan.utxos.len(), amounts.len());
        prop_assert_eq!(plan.change, 0);
        prop_assert_eq!(plan.amount + plan.fee, amounts.iter().sum::<u64>());
    }

    #[test]
    fn public_derivation_matches_private(
        seed in prop::collection::vec(any::<u8>(), 16..=64),
        index in 0u32..(1 << 31),
    ) {
        let master = derive_master(&Seed::from_bytes(&seed).unwrap()).unwrap();
        let account = master.derive_child(ChildNumber::hardened(0).unwrap()).unwrap();
        let child = ChildNumber::normal(index).unwrap();

        let from_private = account.derive_child(child).unwrap();
        let from_public = account.neuter().derive_child(child).unwrap();

        prop_assert_eq!(from_private.public_key(), from_public.public_key());
        prop_assert_eq!(from_private.to_xpub().unwrap(), from_public.to_xpub().unwrap());
    }

    #[test]
    fn xpub_round_trips_through_base58(
        seed in prop::collection::vec(any::<u8>(), 16..=64),
    ) {
        let master = derive_master(&Seed::from_bytes(&seed).unwrap()).unwrap();
        let xpub = master.to_xpub().unwrap();
        let parsed = ExtendedKey::from_base58(&xpub).unwrap();
        prop_assert_eq!(parsed.public_key(), master.public_key());
        prop_assert!(parsed.private_key().is_none());
    }
}
