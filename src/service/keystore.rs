//! 托管密钥服务
//!
//! 钱包身份的唯一来源：生成密钥对、派生地址、原子化入库
//!
//! 并发约束：同一user_id的创建必须互斥（按用户加锁），锁只覆盖
//! 生成+落库这一步，期间没有任何网络调用；不同用户互不阻塞

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::keypair::TronKeypair;
use crate::error::AppError;
use crate::infrastructure::db::DbPool;
use crate::infrastructure::log_redact::redact_address;
use crate::repository::wallets::{self, CreateWalletInput, Wallet};

pub struct KeyStore {
    pool: DbPool,
    // 按用户的创建锁；锁表本身的全局锁只在取/建条目时短暂持有
    creation_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl KeyStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            creation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 查询钱包；不存在返回None
    ///
    /// 存储层不可用报StorageUnavailable，绝不降级为临时密钥
    pub async fn get_wallet(&self, user_id: i64) -> Result<Option<Wallet>, AppError> {
        let wallet = wallets::find_by_user_id(&self.pool, user_id)
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "Wallet lookup failed");
                AppError::storage_unavailable(e.to_string())
            })?;
        Ok(wallet)
    }

    /// 取回已有钱包，或生成新密钥对并原子化持久化
    ///
    /// 同一用户并发调用也只会创建一个钱包：
    /// 锁内二次检查 + 数据库层ON CONFLICT first-write-wins双重保障
    pub async fn get_or_create_wallet(&self, user_id: i64) -> Result<Wallet, AppError> {
        if let Some(existing) = self.get_wallet(user_id).await? {
            return Ok(existing);
        }

        let lock = self.creation_lock_for(user_id).await;
        let result = self.create_locked(user_id, &lock).await;
        self.release_creation_lock(user_id, &lock).await;
        result
    }

    async fn create_locked(
        &self,
        user_id: i64,
        lock: &Arc<Mutex<()>>,
    ) -> Result<Wallet, AppError> {
        let _guard = lock.lock().await;

        // 拿到锁后重查，竞争者可能已经创建
        if let Some(existing) = self.get_wallet(user_id).await? {
            return Ok(existing);
        }

        let keypair = TronKeypair::generate();
        let wallet = wallets::insert(
            &self.pool,
            CreateWalletInput {
                user_id,
                address: keypair.address().to_string(),
                private_key: keypair.private_key_hex(),
            },
        )
        .await
        .map_err(|e| {
            tracing::error!(user_id, error = %e, "Wallet persistence failed");
            AppError::storage_unavailable(e.to_string())
        })?;

        tracing::info!(
            user_id,
            address = %redact_address(&wallet.address),
            "New custodial wallet created"
        );

        Ok(wallet)
    }

    async fn creation_lock_for(&self, user_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.creation_locks.lock().await;
        locks.entry(user_id).or_default().clone()
    }

    /// 创建结束后回收锁表条目，锁表大小与活跃创建数同阶而非历史用户数
    ///
    /// 只在没有竞争者仍持有该锁时移除：表内引用 + 当前调用者共2个强引用；
    /// 取锁和回收都在外层表锁内进行，计数检查无竞争窗口
    async fn release_creation_lock(&self, user_id: i64, lock: &Arc<Mutex<()>>) {
        let mut locks = self.creation_locks.lock().await;
        if let Some(entry) = locks.get(&user_id) {
            if Arc::ptr_eq(entry, lock) && Arc::strong_count(entry) <= 2 {
                locks.remove(&user_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_keystore() -> Arc<KeyStore> {
        // 内存库按连接隔离，必须单连接共享
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        Arc::new(KeyStore::new(pool))
    }

    #[tokio::test]
    async fn test_create_then_read_back() {
        let keystore = test_keystore().await;

        assert!(keystore.get_wallet(1).await.unwrap().is_none());

        let created = keystore.get_or_create_wallet(1).await.unwrap();
        let fetched = keystore.get_wallet(1).await.unwrap().unwrap();
        assert_eq!(created.address, fetched.address);
        assert_eq!(created.private_key, fetched.private_key);
    }

    #[tokio::test]
    async fn test_second_call_returns_same_wallet() {
        let keystore = test_keystore().await;
        let first = keystore.get_or_create_wallet(5).await.unwrap();
        let second = keystore.get_or_create_wallet(5).await.unwrap();
        assert_eq!(first.address, second.address);
    }

    #[tokio::test]
    async fn test_concurrent_creation_yields_single_wallet() {
        let keystore = test_keystore().await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ks = keystore.clone();
            handles.push(tokio::spawn(async move {
                ks.get_or_create_wallet(99).await.unwrap()
            }));
        }

        let mut addresses = Vec::new();
        for handle in handles {
            addresses.push(handle.await.unwrap().address);
        }
        addresses.dedup();
        assert_eq!(addresses.len(), 1, "exactly one wallet must be created");
    }

    #[tokio::test]
    async fn test_creation_lock_entry_released_after_create() {
        let keystore = test_keystore().await;

        keystore.get_or_create_wallet(7).await.unwrap();
        // 锁表不随历史用户增长
        assert!(keystore.creation_locks.lock().await.is_empty());

        // 并发创建结束后同样回收
        let mut handles = Vec::new();
        for _ in 0..4 {
            let ks = keystore.clone();
            handles.push(tokio::spawn(async move {
                ks.get_or_create_wallet(8).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(keystore.creation_locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_different_users_get_different_wallets() {
        let keystore = test_keystore().await;
        let a = keystore.get_or_create_wallet(1).await.unwrap();
        let b = keystore.get_or_create_wallet(2).await.unwrap();
        assert_ne!(a.address, b.address);
        assert_ne!(a.private_key, b.private_key);
    }
}
