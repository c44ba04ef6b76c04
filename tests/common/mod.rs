//! 测试辅助模块
//! 提供测试向量与请求构造函数

#![allow(dead_code)]

use std::str::FromStr;

use bitcoin::{OutPoint, Txid};
use ironcore_wallet::domain::script::p2wpkh;
use ironcore_wallet::domain::{CoinType, HdWallet};
use ironcore_wallet::service::bitcoin::{BitcoinSigningInput, Utxo};
use ironcore_wallet::service::EthereumSigningInput;
use ironcore_wallet::utils::bytes::u128_to_be_trimmed;

/// BIP39 标准测试助记词
pub const ABANDON_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// 签名场景使用的助记词
pub const RIPPLE_MNEMONIC: &str =
    "ripple scissors kick mammal hire column oak again sun offer wealth tomorrow wagon turn fatal";

pub const ETH_RECIPIENT: &str = "0xC37054b3b48C3317082E7ba872d7753D13da4986";

pub const BTC_RECIPIENT: &str = "1Bp9U1ogV3A14FMvKbRJms7ctyso4Z4Tcx";
pub const BTC_CHANGE: &str = "1FQc5LdgGHMHEN9nwkjmz6tWkxhPpxBvBU";
pub const BTC_UTXO_TXID: &str = "e28c2b955293159898e34c6840d99bf4d390e2ee1c6f606939f18ee1e2000d05";

pub fn ripple_wallet() -> HdWallet {
    HdWallet::new(RIPPLE_MNEMONIC, "").expect("valid test mnemonic")
}

/// Scenario A：以太坊主网转账
pub fn ethereum_transfer(wallet: &HdWallet) -> EthereumSigningInput {
    EthereumSigningInput {
        chain_id: vec![1],
        nonce: Vec::new(),
        gas_price: u128_to_be_trimmed(3_600_000_000),
        gas_limit: u128_to_be_trimmed(21_000),
        to_address: ETH_RECIPIENT.to_string(),
        amount: u128_to_be_trimmed(924_400_000_000_000),
        payload: Vec::new(),
        private_key: wallet
            .get_private_key(CoinType::Ethereum)
            .expect("ethereum key"),
    }
}

/// Scenario B：单个 P2WPKH UTXO，转出 600 sat，费率 2 sat/vB
pub fn bitcoin_transfer(wallet: &HdWallet) -> BitcoinSigningInput {
    let key = wallet.get_key(CoinType::Bitcoin, None).expect("bitcoin key");
    let mut input = BitcoinSigningInput::new();
    input.amount = 600;
    input.byte_fee = 2;
    input.to_address = BTC_RECIPIENT.to_string();
    input.change_address = BTC_CHANGE.to_string();
    input.utxos = vec![Utxo::new(
        OutPoint::new(Txid::from_str(BTC_UTXO_TXID).expect("txid"), 2),
        5151,
        p2wpkh(&key.public_key().hash160()),
    )];
    input.private_keys = vec![wallet
        .get_private_key(CoinType::Bitcoin)
        .expect("bitcoin key bytes")];
    input
}
