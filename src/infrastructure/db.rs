//! SQLx SQLite 连接池初始化与健康检查
//!
//! 托管钱包的唯一持久化存储：单文件SQLite数据库
//! 写入全部经由repository层，SQLite自身对写做串行化
//!
//! 用法：
//! let pool = init_pool(&config.database).await?;
//! health_check(&pool).await?;

use std::time::Duration;

use crate::config::DatabaseConfig;

pub type DbPool = sqlx::Pool<sqlx::Sqlite>;

/// 初始化SQLite连接池
///
/// - mode=rwc：数据库文件不存在时自动创建
/// - 连接数与获取超时可通过环境变量调节
pub async fn init_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool_opts = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));

    let pool = pool_opts.connect(&config.url).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to connect to SQLite database");
        e
    })?;

    // 验证连接
    health_check(&pool).await?;

    Ok(pool)
}

/// 数据库健康检查
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
