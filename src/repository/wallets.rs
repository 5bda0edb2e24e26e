//! 托管钱包存储
//!
//! 一个用户至多一条记录，user_id唯一键
//! 记录一经写入不再变更、不删除（无销户流程）

use serde::Serialize;
use sqlx::FromRow;

use crate::infrastructure::db::DbPool;

/// 托管钱包记录
///
/// private_key只在KeyStore内部和"wallet"命令的单次回复中流转，
/// 序列化时跳过，防止意外进入日志或对外响应
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Wallet {
    pub user_id: i64,
    pub address: String,
    #[serde(skip_serializing)]
    pub private_key: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct CreateWalletInput {
    pub user_id: i64,
    pub address: String,
    pub private_key: String,
}

/// 写入新钱包，first-write-wins
///
/// user_id冲突时不覆盖已有记录（ON CONFLICT DO NOTHING），
/// 返回库中实际生效的那条记录
pub async fn insert(pool: &DbPool, input: CreateWalletInput) -> Result<Wallet, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wallets (user_id, address, private_key, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(input.user_id)
    .bind(&input.address)
    .bind(&input.private_key)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    // 无论本次INSERT是否生效，都以库内记录为准
    find_by_user_id(pool, input.user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// 按用户查询钱包
pub async fn find_by_user_id(pool: &DbPool, user_id: i64) -> Result<Option<Wallet>, sqlx::Error> {
    sqlx::query_as::<_, Wallet>(
        r#"
        SELECT user_id, address, private_key, created_at
        FROM wallets
        WHERE user_id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        pool
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = test_pool().await;
        let wallet = insert(
            &pool,
            CreateWalletInput {
                user_id: 42,
                address: "TAddr".into(),
                private_key: "deadbeef".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(wallet.user_id, 42);

        let found = find_by_user_id(&pool, 42).await.unwrap().unwrap();
        assert_eq!(found.address, "TAddr");
        assert!(find_by_user_id(&pool, 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_write_wins() {
        let pool = test_pool().await;
        for key in ["first", "second"] {
            insert(
                &pool,
                CreateWalletInput {
                    user_id: 1,
                    address: format!("T{}", key),
                    private_key: key.into(),
                },
            )
            .await
            .unwrap();
        }

        let wallet = find_by_user_id(&pool, 1).await.unwrap().unwrap();
        // 第二次写入不得覆盖
        assert_eq!(wallet.private_key, "first");
        assert_eq!(wallet.address, "Tfirst");
    }
}
