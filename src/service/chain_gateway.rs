//! Tron链网关
//!
//! 对远端链服务（TronGrid风格HTTP API）的统一抽象：
//! 地址验证、余额/资产查询、带宽查询、交易构建、本地签名、广播、确认轮询
//!
//! 网关以显式构造的实例注入各服务，不使用全局单例，便于测试替身

use std::time::Duration;

use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ChainConfig;
use crate::error::{AppError, AppErrorCode};
use crate::infrastructure::log_redact::redact_hex_string;
use crate::utils::address_validator::is_valid_tron_address;

/// 链访问错误（网关内部分类，服务边界映射到AppError）
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("network error: {0}")]
    Network(String),

    #[error("chain rpc error: {0}")]
    Rpc(String),

    #[error("confirmation timed out for tx {tx_id}")]
    ConfirmationTimeout { tx_id: String },

    #[error("unexpected upstream response: {0}")]
    InvalidResponse(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        ChainError::Network(e.to_string())
    }
}

impl From<ChainError> for AppError {
    fn from(e: ChainError) -> Self {
        let code = match &e {
            ChainError::Network(_) => AppErrorCode::Network,
            ChainError::ConfirmationTimeout { .. } => AppErrorCode::ConfirmationTimeout,
            ChainError::Rpc(_) | ChainError::InvalidResponse(_) | ChainError::Signing(_) => {
                AppErrorCode::ChainRpc
            }
        };
        AppError::new(code, e.to_string())
    }
}

/// TRC10资产元数据
#[derive(Debug, Clone)]
pub struct AssetMetadata {
    pub name: String,
    pub symbol: String,
}

/// 资产余额条目（保留上游返回顺序，匹配按先见优先）
#[derive(Debug, Clone)]
pub struct AssetBalanceEntry {
    pub asset_id: String,
    pub balance: u64,
}

/// 已构建、未签名的转账交易
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    /// 交易ID：sha256(raw_data)的十六进制
    pub tx_id: String,
    pub raw_data: serde_json::Value,
    pub raw_data_hex: String,
}

/// 已广播交易的句柄
#[derive(Debug, Clone)]
pub struct TxHandle {
    pub tx_id: String,
}

/// 链上确认回执
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_id: String,
    pub block_number: u64,
    pub success: bool,
}

/// 链网关调用契约
///
/// 所有远端操作可能以Network/Rpc失败并携带上游消息；
/// is_valid_address是纯本地验证，不发网络请求
#[async_trait]
pub trait ChainGateway: Send + Sync {
    fn is_valid_address(&self, address: &str) -> bool;

    async fn get_native_balance(&self, address: &str) -> Result<u64, ChainError>;

    async fn get_asset_balances(&self, address: &str)
        -> Result<Vec<AssetBalanceEntry>, ChainError>;

    async fn get_asset_metadata(&self, asset_id: &str) -> Result<AssetMetadata, ChainError>;

    /// 账户当前可用带宽（免费额度 + 质押额度的剩余量）
    async fn get_available_bandwidth(&self, address: &str) -> Result<u64, ChainError>;

    async fn build_transfer(
        &self,
        sender: &str,
        receiver: &str,
        amount_sun: u64,
        memo: &str,
        fee_limit_sun: u64,
    ) -> Result<UnsignedTransaction, ChainError>;

    /// 本地对txID做可恢复secp256k1签名后广播
    async fn sign_and_broadcast(
        &self,
        txn: &UnsignedTransaction,
        private_key_hex: &str,
    ) -> Result<TxHandle, ChainError>;

    /// 轮询交易最终性，超时返回ConfirmationTimeout
    ///
    /// 超时是"结果未知"，不代表交易失败或回滚
    async fn await_confirmation(
        &self,
        handle: &TxHandle,
        timeout: Duration,
    ) -> Result<TxReceipt, ChainError>;
}

// ---------- TronGrid HTTP 实现 ----------

/// 基于reqwest的TronGrid HTTP网关实现
pub struct TronHttpGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    confirm_poll_interval: Duration,
}

// 上游响应的显式结构：字段全部可缺省，缺省值确定（不做动态字段访问）

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    balance: u64,
    #[serde(default, rename = "assetV2")]
    asset_v2: Vec<AssetV2Entry>,
}

#[derive(Debug, Deserialize)]
struct AssetV2Entry {
    key: String,
    #[serde(default)]
    value: u64,
}

#[derive(Debug, Deserialize)]
struct AccountNetResponse {
    #[serde(default, rename = "freeNetLimit")]
    free_net_limit: u64,
    #[serde(default, rename = "freeNetUsed")]
    free_net_used: u64,
    #[serde(default, rename = "NetLimit")]
    net_limit: u64,
    #[serde(default, rename = "NetUsed")]
    net_used: u64,
}

#[derive(Debug, Deserialize)]
struct AssetIssueResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    abbr: String,
}

#[derive(Debug, Deserialize)]
struct CreateTransactionResponse {
    #[serde(default, rename = "txID")]
    tx_id: String,
    #[serde(default)]
    raw_data: serde_json::Value,
    #[serde(default)]
    raw_data_hex: String,
    #[serde(default, rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct BroadcastRequest<'a> {
    #[serde(rename = "txID")]
    tx_id: &'a str,
    raw_data: &'a serde_json::Value,
    raw_data_hex: &'a str,
    signature: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BroadcastResponse {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionInfoResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "blockNumber")]
    block_number: Option<u64>,
    #[serde(default)]
    receipt: Option<TransactionReceiptField>,
}

#[derive(Debug, Deserialize)]
struct TransactionReceiptField {
    #[serde(default)]
    result: Option<String>,
}

impl TronHttpGateway {
    pub fn new(config: &ChainConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            confirm_poll_interval: Duration::from_millis(config.confirm_poll_interval_ms),
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ChainError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("TRON-PRO-API-KEY", key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ChainError::Rpc(format!(
                "{} returned {}: {}",
                path, status, text
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| ChainError::InvalidResponse(format!("{}: {}", path, e)))
    }
}

/// TronGrid把部分文本字段十六进制编码返回，尽力解码，失败保留原文
fn decode_maybe_hex(s: &str) -> String {
    if s.is_empty() || s.len() % 2 != 0 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return s.to_string();
    }
    match hex::decode(s).map(|b| String::from_utf8(b)) {
        Ok(Ok(decoded)) if decoded.chars().all(|c| !c.is_control()) => decoded,
        _ => s.to_string(),
    }
}

#[async_trait]
impl ChainGateway for TronHttpGateway {
    fn is_valid_address(&self, address: &str) -> bool {
        is_valid_tron_address(address)
    }

    async fn get_native_balance(&self, address: &str) -> Result<u64, ChainError> {
        let account: AccountResponse = self
            .post_json(
                "/wallet/getaccount",
                serde_json::json!({ "address": address, "visible": true }),
            )
            .await?;
        Ok(account.balance)
    }

    async fn get_asset_balances(
        &self,
        address: &str,
    ) -> Result<Vec<AssetBalanceEntry>, ChainError> {
        let account: AccountResponse = self
            .post_json(
                "/wallet/getaccount",
                serde_json::json!({ "address": address, "visible": true }),
            )
            .await?;

        Ok(account
            .asset_v2
            .into_iter()
            .map(|entry| AssetBalanceEntry {
                asset_id: entry.key,
                balance: entry.value,
            })
            .collect())
    }

    async fn get_asset_metadata(&self, asset_id: &str) -> Result<AssetMetadata, ChainError> {
        let asset: AssetIssueResponse = self
            .post_json(
                "/wallet/getassetissuebyid",
                serde_json::json!({ "value": asset_id, "visible": true }),
            )
            .await?;

        if asset.name.is_empty() && asset.abbr.is_empty() {
            return Err(ChainError::Rpc(format!("unknown asset id {}", asset_id)));
        }

        Ok(AssetMetadata {
            name: decode_maybe_hex(&asset.name),
            symbol: decode_maybe_hex(&asset.abbr),
        })
    }

    async fn get_available_bandwidth(&self, address: &str) -> Result<u64, ChainError> {
        let net: AccountNetResponse = self
            .post_json(
                "/wallet/getaccountnet",
                serde_json::json!({ "address": address, "visible": true }),
            )
            .await?;

        let free = net.free_net_limit.saturating_sub(net.free_net_used);
        let staked = net.net_limit.saturating_sub(net.net_used);
        Ok(free + staked)
    }

    async fn build_transfer(
        &self,
        sender: &str,
        receiver: &str,
        amount_sun: u64,
        memo: &str,
        fee_limit_sun: u64,
    ) -> Result<UnsignedTransaction, ChainError> {
        let body = serde_json::json!({
            "owner_address": sender,
            "to_address": receiver,
            "amount": amount_sun,
            "visible": true,
            "extra_data": hex::encode(memo.as_bytes()),
            "fee_limit": fee_limit_sun,
        });

        let created: CreateTransactionResponse =
            self.post_json("/wallet/createtransaction", body).await?;

        if let Some(error) = created.error {
            return Err(ChainError::Rpc(decode_maybe_hex(&error)));
        }
        if created.tx_id.is_empty() || created.raw_data_hex.is_empty() {
            return Err(ChainError::InvalidResponse(
                "createtransaction returned no transaction".into(),
            ));
        }

        tracing::debug!(
            tx_id = %redact_hex_string(&created.tx_id, 8),
            amount_sun,
            "Transfer transaction built"
        );

        Ok(UnsignedTransaction {
            tx_id: created.tx_id,
            raw_data: created.raw_data,
            raw_data_hex: created.raw_data_hex,
        })
    }

    async fn sign_and_broadcast(
        &self,
        txn: &UnsignedTransaction,
        private_key_hex: &str,
    ) -> Result<TxHandle, ChainError> {
        let signature = sign_tx_id(&txn.tx_id, private_key_hex)?;

        let body = BroadcastRequest {
            tx_id: &txn.tx_id,
            raw_data: &txn.raw_data,
            raw_data_hex: &txn.raw_data_hex,
            signature: vec![signature],
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;

        let resp: BroadcastResponse = self.post_json("/wallet/broadcasttransaction", body).await?;

        if !resp.result {
            let detail = resp
                .message
                .as_deref()
                .map(decode_maybe_hex)
                .unwrap_or_else(|| resp.code.unwrap_or_else(|| "broadcast rejected".into()));
            return Err(ChainError::Rpc(detail));
        }

        tracing::info!(
            tx_id = %redact_hex_string(&txn.tx_id, 8),
            "Transaction broadcast accepted"
        );

        Ok(TxHandle {
            tx_id: txn.tx_id.clone(),
        })
    }

    async fn await_confirmation(
        &self,
        handle: &TxHandle,
        timeout: Duration,
    ) -> Result<TxReceipt, ChainError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let info: TransactionInfoResponse = self
                .post_json(
                    "/wallet/gettransactioninfobyid",
                    serde_json::json!({ "value": handle.tx_id }),
                )
                .await?;

            // 交易上块前该接口返回空对象
            if let (Some(_), Some(block_number)) = (info.id.as_ref(), info.block_number) {
                let success = info
                    .receipt
                    .and_then(|r| r.result)
                    .map(|r| r != "FAILED" && r != "REVERT")
                    .unwrap_or(true);

                return Ok(TxReceipt {
                    tx_id: handle.tx_id.clone(),
                    block_number,
                    success,
                });
            }

            if tokio::time::Instant::now() + self.confirm_poll_interval > deadline {
                return Err(ChainError::ConfirmationTimeout {
                    tx_id: handle.tx_id.clone(),
                });
            }
            tokio::time::sleep(self.confirm_poll_interval).await;
        }
    }
}

/// 对txID（sha256摘要）做可恢复ECDSA签名，返回65字节r||s||v的十六进制
fn sign_tx_id(tx_id: &str, private_key_hex: &str) -> Result<String, ChainError> {
    let key_bytes =
        hex::decode(private_key_hex).map_err(|e| ChainError::Signing(e.to_string()))?;
    let signing_key =
        SigningKey::from_slice(&key_bytes).map_err(|e| ChainError::Signing(e.to_string()))?;

    let digest = hex::decode(tx_id).map_err(|e| ChainError::Signing(e.to_string()))?;
    if digest.len() != 32 {
        return Err(ChainError::Signing(format!(
            "tx id must be a 32-byte digest, got {} bytes",
            digest.len()
        )));
    }

    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| ChainError::Signing(e.to_string()))?;

    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte());
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keypair::TronKeypair;

    #[test]
    fn test_sign_tx_id_produces_65_byte_signature() {
        let kp = TronKeypair::generate();
        let tx_id = "a".repeat(64); // 32字节摘要
        let sig = sign_tx_id(&tx_id, &kp.private_key_hex()).unwrap();
        assert_eq!(sig.len(), 130);
    }

    #[test]
    fn test_sign_rejects_bad_inputs() {
        let kp = TronKeypair::generate();
        assert!(sign_tx_id("zz", &kp.private_key_hex()).is_err());
        assert!(sign_tx_id(&"a".repeat(64), "not-hex").is_err());
        // 摘要长度不对
        assert!(sign_tx_id(&"a".repeat(32), &kp.private_key_hex()).is_err());
    }

    #[test]
    fn test_decode_maybe_hex() {
        assert_eq!(decode_maybe_hex(&hex::encode("BitTorrent")), "BitTorrent");
        assert_eq!(decode_maybe_hex("BitTorrent"), "BitTorrent");
        assert_eq!(decode_maybe_hex(""), "");
    }

    #[test]
    fn test_chain_error_maps_to_taxonomy() {
        use crate::error::AppErrorCode;

        let e: AppError = ChainError::Network("dns failure".into()).into();
        assert_eq!(e.code, AppErrorCode::Network);

        let e: AppError = ChainError::ConfirmationTimeout { tx_id: "ab".into() }.into();
        assert_eq!(e.code, AppErrorCode::ConfirmationTimeout);

        let e: AppError = ChainError::Rpc("CONTRACT_VALIDATE_ERROR".into()).into();
        assert_eq!(e.code, AppErrorCode::ChainRpc);
    }
}
