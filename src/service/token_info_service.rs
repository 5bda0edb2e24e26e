//! TRC20代币信息查询（外部行情/元数据源）
//!
//! 只读的第三方scan API消费端，核心流程之外的薄查询层
//! 响应按显式可选字段解析，缺失字段有确定的缺省值

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppErrorCode};
use crate::service::chain_gateway::ChainGateway;

/// scan API返回的单个TRC20代币条目（字段可缺省）
#[derive(Debug, Clone, Deserialize)]
pub struct Trc20TokenInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub total_supply: Option<String>,
    #[serde(default)]
    pub holders_count: Option<u64>,
    #[serde(default, rename = "transfer24h")]
    pub transfer_24h: Option<u64>,
    #[serde(default, rename = "volume24h")]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub issue_time: Option<String>,
    #[serde(default)]
    pub token_desc: Option<String>,
    #[serde(default)]
    pub home_page: Option<String>,
    #[serde(default)]
    pub market_info: Option<MarketInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketInfo {
    #[serde(default, rename = "priceInTrx")]
    pub price_in_trx: Option<f64>,
    #[serde(default, rename = "priceInUsd")]
    pub price_in_usd: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<f64>,
    #[serde(default)]
    pub gain: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Trc20ListResponse {
    #[serde(default)]
    trc20_tokens: Vec<Trc20TokenInfo>,
}

pub struct TokenInfoService {
    gateway: Arc<dyn ChainGateway>,
    client: reqwest::Client,
    api_base_url: String,
}

impl TokenInfoService {
    pub fn new(gateway: Arc<dyn ChainGateway>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let api_base_url = std::env::var("TRONSCAN_API_BASE_URL")
            .unwrap_or_else(|_| "https://apilist.tronscanapi.com".into());

        Self {
            gateway,
            client,
            api_base_url,
        }
    }

    /// 按合约地址查询TRC20代币信息
    pub async fn lookup(&self, contract_address: &str) -> Result<Vec<Trc20TokenInfo>, AppError> {
        if !self.gateway.is_valid_address(contract_address) {
            return Err(AppError::invalid_address(format!(
                "invalid contract address: {}",
                contract_address
            )));
        }

        let url = format!("{}/api/token_trc20", self.api_base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("contract", contract_address), ("showAll", "1")])
            .send()
            .await
            .map_err(|e| AppError::new(AppErrorCode::Network, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::new(
                AppErrorCode::ChainRpc,
                format!("token info api returned {}", status),
            ));
        }

        let body: Trc20ListResponse = resp
            .json()
            .await
            .map_err(|e| AppError::new(AppErrorCode::ChainRpc, e.to_string()))?;

        Ok(body.trc20_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parses_with_missing_fields() {
        // 上游字段高度不稳定，缺失字段必须有确定缺省
        let raw = r#"{
            "trc20_tokens": [
                {"name": "PepeTron", "symbol": "PEPET", "holders_count": 12},
                {"symbol": "X"}
            ]
        }"#;
        let parsed: Trc20ListResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.trc20_tokens.len(), 2);
        assert_eq!(parsed.trc20_tokens[0].name, "PepeTron");
        assert_eq!(parsed.trc20_tokens[0].holders_count, Some(12));
        assert!(parsed.trc20_tokens[1].name.is_empty());
        assert!(parsed.trc20_tokens[1].market_info.is_none());
    }

    #[test]
    fn test_empty_response() {
        let parsed: Trc20ListResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.trc20_tokens.is_empty());
    }
}
