//! 与 coins-bip32 交叉验证派生结果

mod common;

use coins_bip32::path::DerivationPath as Bip32Path;
use coins_bip32::prelude::*;
use k256::ecdsa::SigningKey;

use common::{ABANDON_MNEMONIC, RIPPLE_MNEMONIC};
use ironcore_wallet::domain::{CoinType, HdWallet};

fn reference_private_key(wallet: &HdWallet, path: &str) -> [u8; 32] {
    let path = path.parse::<Bip32Path>().unwrap();
    let master = XPriv::root_from_seed(wallet.seed().as_bytes(), None).unwrap();
    let derived = master.derive_path(&path).unwrap();
    let signing_key: &SigningKey = derived.as_ref();
    signing_key.to_bytes().into()
}

#[test]
fn test_default_paths_match_coins_bip32() {
    for mnemonic in [ABANDON_MNEMONIC, RIPPLE_MNEMONIC] {
        let wallet = HdWallet::new(mnemonic, "").unwrap();
        for coin in CoinType::ALL {
            let path = coin.params().default_derivation_path();
            let ours = wallet.get_private_key(coin).unwrap();
            assert_eq!(
                &ours[..],
                &reference_private_key(&wallet, &path)[..],
                "{} at {}",
                coin,
                path
            );
        }
    }
}

#[test]
fn test_deep_and_mixed_paths_match_coins_bip32() {
    let wallet = HdWallet::new(ABANDON_MNEMONIC, "TREZOR").unwrap();
    for path in [
        "m/0",
        "m/0'/1/2'/2/1000000000",
        "m/44'/60'/3'/1/77",
        "m/84'/0'/0'/1/2147483647",
    ] {
        let parsed = path.parse().unwrap();
        let ours = wallet.get_key(CoinType::Ethereum, Some(&parsed)).unwrap();
        assert_eq!(
            &ours.private_key().unwrap().to_bytes()[..],
            &reference_private_key(&wallet, path)[..],
            "{}",
            path
        );
    }
}
