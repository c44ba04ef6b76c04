//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::service::bitcoin::sighash::{hash_type_from_u32, SIGHASH_ALL};

/// 费率上限（sat/vB），超过视为配置错误
const MAX_SANE_BYTE_FEE: u64 = 10_000;

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// UTXO 规划默认值（请求未指定时使用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// 每 vbyte 费率
    pub default_byte_fee: u64,
    /// 默认 sighash 类型
    pub default_hash_type: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_byte_fee: std::env::var("WALLET_DEFAULT_BYTE_FEE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            default_hash_type: std::env::var("WALLET_DEFAULT_HASH_TYPE")
                .ok()
                .and_then(|s| parse_hash_type(&s))
                .unwrap_or(SIGHASH_ALL),
        }
    }
}

/// 支持十进制或 `0x` 前缀十六进制
fn parse_hash_type(value: &str) -> Option<u32> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex_digits) => u32::from_str_radix(hex_digits, 16).ok(),
        None => value.parse().ok(),
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            logging: LoggingConfig::default(),
            planner: PlannerConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if self.planner.default_byte_fee == 0 {
            anyhow::bail!("WALLET_DEFAULT_BYTE_FEE must be positive");
        }
        if self.planner.default_byte_fee > MAX_SANE_BYTE_FEE {
            anyhow::bail!(
                "WALLET_DEFAULT_BYTE_FEE must not exceed {} sat/vB",
                MAX_SANE_BYTE_FEE
            );
        }

        hash_type_from_u32(self.planner.default_hash_type)
            .context("WALLET_DEFAULT_HASH_TYPE is not a supported sighash type")?;

        Ok(())
    }
}
