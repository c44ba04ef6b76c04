//! IronCore Wallet 命令行入口
//!
//! 用法：
//!   ironcore-wallet addresses          打印各币种默认路径上的地址
//!   ironcore-wallet address <coin>     打印指定币种地址（名称 / 符号 / SLIP-44 编号）
//!
//! 助记词从 `WALLET_MNEMONIC` 读取，可选口令从 `WALLET_PASSPHRASE` 读取。

use anyhow::{Context, Result};
use ironcore_wallet::{
    config::Config,
    domain::{lookup, CoinType, HdWallet},
    infrastructure::logging,
    service::SigningEngine,
};

fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 指向的 TOML 文件优先）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate().context("Invalid configuration")?;

    // 3. 初始化日志
    logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let mnemonic = std::env::var("WALLET_MNEMONIC").context("WALLET_MNEMONIC must be set")?;
    let passphrase = std::env::var("WALLET_PASSPHRASE").unwrap_or_default();
    let wallet = HdWallet::new(&mnemonic, &passphrase).context("Failed to open wallet")?;

    let engine = SigningEngine::with_config(config.planner.clone());
    tracing::debug!(
        default_byte_fee = engine.planner_config().default_byte_fee,
        default_hash_type = engine.planner_config().default_hash_type,
        "signing engine ready"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("addresses") => {
            for coin in CoinType::ALL {
                print_address(&engine, &wallet, coin)?;
            }
        }
        Some("address") => {
            let name = args.get(1).context("usage: ironcore-wallet address <coin>")?;
            let coin = match name.parse::<u32>() {
                Ok(id) => lookup(id)?.coin,
                Err(_) => name.parse::<CoinType>()?,
            };
            print_address(&engine, &wallet, coin)?;
        }
        Some(other) => anyhow::bail!("unknown command: {}", other),
    }

    Ok(())
}

fn print_address(engine: &SigningEngine, wallet: &HdWallet, coin: CoinType) -> Result<()> {
    let params = coin.params();
    let key = wallet
        .get_key(coin, None)
        .with_context(|| format!("Failed to derive {} key", params.symbol))?;
    let address = engine.encode_address(&key.public_key(), coin);
    println!(
        "{:<6} {:<24} {}",
        params.symbol,
        params.default_derivation_path(),
        address
    );
    Ok(())
}
