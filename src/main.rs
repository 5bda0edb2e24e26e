//! TronVault 主入口
//! Tron托管钱包Bot后端

use std::sync::Arc;

use anyhow::Result;
use tronvault::app_state::AppState;
use tronvault::config::Config;
use tronvault::infrastructure::{db, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // ✅ 1. 加载环境变量与配置
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Arc::new(Config::from_env_and_file(config_path.as_deref())?);
    config.validate()?;

    // ✅ 2. 初始化日志
    logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("logging init failed: {}", e))?;

    tracing::info!("🚀 Starting TronVault custodial wallet backend");

    // ✅ 3. 连接数据库并迁移
    let pool = db::init_pool(&config.database).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("✅ Database connected and migrated");

    // ✅ 4. 组装应用状态（网关显式注入）
    let state = Arc::new(AppState::new(pool, config));

    // ✅ 5. 进入命令长轮询循环
    tronvault::bot::run(state).await
}
