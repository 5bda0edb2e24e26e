//! 测试辅助模块
//! 内存SQLite + 可配置的链网关替身

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tronvault::app_state::AppState;
use tronvault::config::Config;
use tronvault::service::chain_gateway::{
    AssetBalanceEntry, AssetMetadata, ChainError, ChainGateway, TxHandle, TxReceipt,
    UnsignedTransaction,
};
use tronvault::utils::address_validator::is_valid_tron_address;

/// 确认阶段行为
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    Confirm,
    Timeout,
}

/// 可配置的链网关替身；记录远端调用次数
pub struct MockGateway {
    pub native_balance: u64,
    /// (asset_id, balance)，保序
    pub assets: Vec<(String, u64)>,
    /// asset_id -> (name, symbol)
    pub metadata: HashMap<String, (String, String)>,
    pub bandwidth: u64,
    pub confirm_mode: ConfirmMode,
    remote_calls: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            native_balance: 0,
            assets: Vec::new(),
            metadata: HashMap::new(),
            bandwidth: 1_000,
            confirm_mode: ConfirmMode::Confirm,
            remote_calls: AtomicUsize::new(0),
        }
    }
}

impl MockGateway {
    pub fn remote_call_count(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub const MOCK_TX_ID: &str =
    "00000000000000000000000000000000000000000000000000000000feedbeef";

#[async_trait]
impl ChainGateway for MockGateway {
    fn is_valid_address(&self, address: &str) -> bool {
        is_valid_tron_address(address)
    }

    async fn get_native_balance(&self, _address: &str) -> Result<u64, ChainError> {
        self.bump();
        Ok(self.native_balance)
    }

    async fn get_asset_balances(
        &self,
        _address: &str,
    ) -> Result<Vec<AssetBalanceEntry>, ChainError> {
        self.bump();
        Ok(self
            .assets
            .iter()
            .map(|(asset_id, balance)| AssetBalanceEntry {
                asset_id: asset_id.clone(),
                balance: *balance,
            })
            .collect())
    }

    async fn get_asset_metadata(&self, asset_id: &str) -> Result<AssetMetadata, ChainError> {
        self.bump();
        match self.metadata.get(asset_id) {
            Some((name, symbol)) => Ok(AssetMetadata {
                name: name.clone(),
                symbol: symbol.clone(),
            }),
            None => Err(ChainError::Rpc(format!("unknown asset id {}", asset_id))),
        }
    }

    async fn get_available_bandwidth(&self, _address: &str) -> Result<u64, ChainError> {
        self.bump();
        Ok(self.bandwidth)
    }

    async fn build_transfer(
        &self,
        _sender: &str,
        _receiver: &str,
        _amount_sun: u64,
        _memo: &str,
        _fee_limit_sun: u64,
    ) -> Result<UnsignedTransaction, ChainError> {
        self.bump();
        Ok(UnsignedTransaction {
            tx_id: MOCK_TX_ID.to_string(),
            raw_data: serde_json::json!({}),
            raw_data_hex: "0a".into(),
        })
    }

    async fn sign_and_broadcast(
        &self,
        txn: &UnsignedTransaction,
        _private_key_hex: &str,
    ) -> Result<TxHandle, ChainError> {
        self.bump();
        Ok(TxHandle {
            tx_id: txn.tx_id.clone(),
        })
    }

    async fn await_confirmation(
        &self,
        handle: &TxHandle,
        _timeout: Duration,
    ) -> Result<TxReceipt, ChainError> {
        self.bump();
        match self.confirm_mode {
            ConfirmMode::Confirm => Ok(TxReceipt {
                tx_id: handle.tx_id.clone(),
                block_number: 123,
                success: true,
            }),
            ConfirmMode::Timeout => Err(ChainError::ConfirmationTimeout {
                tx_id: handle.tx_id.clone(),
            }),
        }
    }
}

/// 组装测试应用状态（内存库 + 替身网关）
pub async fn test_state(mock: MockGateway) -> (Arc<AppState>, Arc<MockGateway>) {
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

    let mut config = Config::default();
    config.telegram.bot_token = "test-token".into();

    let gateway = Arc::new(mock);
    let state = Arc::new(AppState::with_gateway(
        pool,
        Arc::new(config),
        gateway.clone(),
    ));
    (state, gateway)
}

/// 生成一个通过校验的收款地址
pub fn fresh_address() -> String {
    tronvault::domain::keypair::TronKeypair::generate()
        .address()
        .to_string()
}
