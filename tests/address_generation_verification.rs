//! 地址生成算法验证测试
//!
//! 使用 BIP39 标准助记词，验证各币种默认路径上的地址与主流钱包一致

mod common;

use common::ABANDON_MNEMONIC;
use ironcore_wallet::domain::address::{encode_legacy_address, lock_script_for};
use ironcore_wallet::domain::{CoinType, DerivationPath, HdWallet, ScriptExt, ScriptTemplate};
use ironcore_wallet::utils::AddressValidator;

fn wallet() -> HdWallet {
    HdWallet::new(ABANDON_MNEMONIC, "").unwrap()
}

/// 测试用例：使用BIP39标准测试向量验证Ethereum地址生成
#[test]
fn test_ethereum_address_generation_bip39_vector() {
    let info = wallet()
        .derive_wallet_info(CoinType::Ethereum, 0, 0, 0)
        .unwrap();

    assert_eq!(info.address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    assert_eq!(info.derivation_path, "m/44'/60'/0'/0/0");
    assert!(AddressValidator::validate("eth", &info.address).unwrap());
}

/// 测试用例：验证EVM侧链地址（与Ethereum相同，因为使用相同的曲线和派生路径）
#[test]
fn test_evm_sidechains_share_ethereum_address() {
    let wallet = wallet();
    let eth = wallet.get_address(CoinType::Ethereum).unwrap();
    assert_eq!(wallet.get_address(CoinType::SmartChain).unwrap(), eth);
    assert_eq!(wallet.get_address(CoinType::Polygon).unwrap(), eth);

    // ETC 使用独立的 coin type 61
    let etc = wallet.get_address(CoinType::EthereumClassic).unwrap();
    assert_ne!(etc, eth);
    assert!(AddressValidator::validate_for(CoinType::EthereumClassic, &etc));
}

#[test]
fn test_bitcoin_native_segwit_address() {
    let info = wallet()
        .derive_wallet_info(CoinType::Bitcoin, 0, 0, 0)
        .unwrap();
    assert_eq!(info.address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
    assert_eq!(info.derivation_path, "m/84'/0'/0'/0/0");

    let script = lock_script_for(&info.address, CoinType::Bitcoin.params()).unwrap();
    assert!(matches!(
        script.template(),
        ScriptTemplate::PayToWitnessPubkeyHash(_)
    ));
}

#[test]
fn test_bitcoin_legacy_address_bip44() {
    let path: DerivationPath = "m/44'/0'/0'/0/0".parse().unwrap();
    let key = wallet().get_key(CoinType::Bitcoin, Some(&path)).unwrap();
    assert_eq!(
        encode_legacy_address(&key.public_key(), CoinType::Bitcoin.params()),
        "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"
    );
}

#[test]
fn test_litecoin_and_dogecoin_addresses() {
    let wallet = wallet();
    assert_eq!(
        wallet.get_address(CoinType::Litecoin).unwrap(),
        "ltc1qjmxnz78nmc8nq77wuxh25n2es7rzm5c2rkk4wh"
    );
    assert_eq!(
        wallet.get_address(CoinType::Dogecoin).unwrap(),
        "DBus3bamQjgJULBJtYXpEzDWQRwF5iwxgC"
    );
}

/// 每个币种生成的地址都能被自身的校验器接受，且不会被其它 UTXO 币种接受
#[test]
fn test_addresses_validate_only_for_their_coin() {
    let wallet = wallet();
    let utxo_coins = [CoinType::Bitcoin, CoinType::Litecoin, CoinType::Dogecoin];

    for coin in CoinType::ALL {
        let address = wallet.get_address(coin).unwrap();
        assert!(
            AddressValidator::validate_for(coin, &address),
            "{} address {} rejected",
            coin,
            address
        );
    }

    for coin in utxo_coins {
        let address = wallet.get_address(coin).unwrap();
        for other in utxo_coins.iter().filter(|c| **c != coin) {
            assert!(!AddressValidator::validate_for(*other, &address));
        }
    }
}

#[test]
fn test_address_derivation_is_deterministic() {
    for coin in CoinType::ALL {
        assert_eq!(
            wallet().get_address(coin).unwrap(),
            wallet().get_address(coin).unwrap()
        );
    }
}
