//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub swap: SwapConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telegram Bot配置（命令入口 + 回复出口）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base_url: String,
    /// getUpdates长轮询超时（秒）
    pub poll_timeout_secs: u64,
}

/// 数据库配置（SQLite单文件，托管钱包唯一存储）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Tron链访问配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// TronGrid风格HTTP API基址
    pub api_base_url: String,
    pub api_key: Option<String>,
    /// 区块浏览器交易页基址
    pub explorer_tx_url: String,
    /// 转账备注
    pub transfer_memo: String,
    /// 固定的费用上限（sun），不做费用优化
    pub fee_limit_sun: u64,
    /// 确认等待上限（秒）
    pub confirm_timeout_secs: u64,
    /// 确认轮询间隔（毫秒）
    pub confirm_poll_interval_ms: u64,
    /// 转账前置带宽检查的最小值
    pub min_bandwidth: u64,
    pub http_timeout_secs: u64,
}

/// 兑换聚合路由配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Smart Router聚合查询端点
    pub router_api_url: String,
    /// 查询的流动性来源类型列表
    pub type_list: String,
    /// swapExactInput路由合约地址
    pub router_contract: String,
    /// 固定最小输出下限
    pub min_amount_out: String,
    /// 交易截止时间（unix秒）
    pub deadline_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            api_base_url: std::env::var("TELEGRAM_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".into()),
            poll_timeout_secs: std::env::var("TELEGRAM_POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://wallet.db?mode=rwc".into()),
            max_connections: std::env::var("DB_MAX_CONNS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8),
            acquire_timeout_secs: std::env::var("DB_ACQ_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            api_base_url: std::env::var("TRON_API_BASE_URL")
                .unwrap_or_else(|_| "https://nile.trongrid.io".into()),
            api_key: std::env::var("TRON_GRID_API_KEY").ok(),
            explorer_tx_url: std::env::var("EXPLORER_TX_URL")
                .unwrap_or_else(|_| "https://nile.tronscan.org/#/transaction".into()),
            transfer_memo: std::env::var("TRANSFER_MEMO")
                .unwrap_or_else(|_| "sent via tronvault".into()),
            fee_limit_sun: std::env::var("FEE_LIMIT_SUN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100_000_000),
            confirm_timeout_secs: std::env::var("CONFIRM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            confirm_poll_interval_ms: std::env::var("CONFIRM_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            min_bandwidth: std::env::var("MIN_BANDWIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            http_timeout_secs: std::env::var("TRON_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            router_api_url: std::env::var("SWAP_ROUTER_API_URL")
                .unwrap_or_else(|_| "https://rot.endjgfsv.link/swap/router".into()),
            type_list: std::env::var("SWAP_TYPE_LIST").unwrap_or_else(|_| {
                "PSM,CURVE,CURVE_COMBINATION,WTRX,SUNSWAP_V1,SUNSWAP_V2,SUNSWAP_V3".into()
            }),
            router_contract: std::env::var("SWAP_ROUTER_CONTRACT")
                .unwrap_or_else(|_| "TFVisXFaijZfeyeSjCEVkHfex7HGdTxzF9".into()),
            min_amount_out: std::env::var("SWAP_MIN_AMOUNT_OUT").unwrap_or_else(|_| "1".into()),
            deadline_secs: std::env::var("SWAP_DEADLINE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(600),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            database: DatabaseConfig::default(),
            chain: ChainConfig::default(),
            swap: SwapConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self::default())
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
        if self.telegram.bot_token.is_empty() {
            anyhow::bail!("TELEGRAM_BOT_TOKEN must be set");
        }

        if !self.database.url.starts_with("sqlite:") {
            anyhow::bail!("DATABASE_URL must start with sqlite:");
        }

        if self.chain.confirm_timeout_secs == 0 {
            anyhow::bail!("CONFIRM_TIMEOUT_SECS must be positive");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let config = Config::default();
        assert_eq!(config.chain.fee_limit_sun, 100_000_000);
        assert!(config.database.url.starts_with("sqlite:"));
        assert!(config.swap.type_list.contains("SUNSWAP_V2"));
    }

    #[test]
    fn test_validate_rejects_missing_token() {
        let mut config = Config::default();
        config.telegram.bot_token = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let toml_src = r#"
            [telegram]
            bot_token = "123:abc"
            api_base_url = "https://api.telegram.org"
            poll_timeout_secs = 10

            [chain]
            api_base_url = "https://api.trongrid.io"
            explorer_tx_url = "https://tronscan.org/#/transaction"
            transfer_memo = "hi"
            fee_limit_sun = 50000000
            confirm_timeout_secs = 30
            confirm_poll_interval_ms = 1000
            min_bandwidth = 3
            http_timeout_secs = 10
        "#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml_src).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.chain.fee_limit_sun, 50_000_000);
        // 未提供的段落回落到默认值
        assert!(config.database.url.starts_with("sqlite:"));
    }
}
