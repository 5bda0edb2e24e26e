//! 兑换最优路由服务
//!
//! 每次请求向聚合路由源查询一次候选路由集合（不做任何缓存），
//! 取amountOut最大的候选（相等时先见者胜），再把选中路由翻译成
//! 一笔swapExactInput风格的合约调用描述。
//!
//! 按既定决策（见DESIGN.md）：本服务只做报价选择与调用构建，
//! 不执行签名/广播——上游实现在该步骤即为存根。

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::SwapConfig;
use crate::domain::amount::SUN_PER_TRX;
use crate::error::{AppError, AppErrorCode};
use crate::service::chain_gateway::ChainGateway;
use crate::service::keystore::KeyStore;

/// 聚合源返回的单个候选路由
///
/// 字段全部显式命名、可缺省、缺省值确定——不做动态字段访问
#[derive(Debug, Clone, Deserialize)]
pub struct RouteCandidate {
    #[serde(default, rename = "amountIn")]
    pub amount_in: String,
    #[serde(default, rename = "amountOut")]
    pub amount_out: String,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default, rename = "poolVersions")]
    pub pool_versions: Vec<String>,
    #[serde(default, rename = "poolFees")]
    pub pool_fees: Vec<String>,
    #[serde(default)]
    pub impact: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouterApiResponse {
    #[serde(default)]
    data: Vec<RouteCandidate>,
    #[serde(default)]
    message: Option<String>,
}

/// 选中的兑换报价
#[derive(Debug, Clone)]
pub struct SwapQuote {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub amount_out: String,
    pub tokens: Vec<String>,
    pub pool_versions: Vec<String>,
    pub pool_fees: Vec<String>,
}

/// swapExactInput风格的合约调用描述
#[derive(Debug, Clone)]
pub struct SwapCall {
    pub router_contract: String,
    pub tokens: Vec<String>,
    pub pool_versions: Vec<String>,
    /// 跳数索引：len(poolVersions) - 1
    pub hop_index: usize,
    pub pool_fees: Vec<String>,
    pub amount_in: String,
    pub min_amount_out: String,
    pub recipient: String,
    /// unix秒
    pub deadline: u64,
}

/// 一次兑换请求的完整结果：选中报价 + 构建好的调用
#[derive(Debug, Clone)]
pub struct SwapPlan {
    pub quote: SwapQuote,
    pub call: SwapCall,
}

pub struct SwapRouterService {
    keystore: Arc<KeyStore>,
    gateway: Arc<dyn ChainGateway>,
    config: SwapConfig,
    client: reqwest::Client,
}

impl SwapRouterService {
    pub fn new(
        keystore: Arc<KeyStore>,
        gateway: Arc<dyn ChainGateway>,
        config: SwapConfig,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            keystore,
            gateway,
            config,
            client,
        }
    }

    /// 执行一次swap命令，args为命令后的原始参数
    pub async fn execute(&self, user_id: i64, args: &[String]) -> Result<SwapPlan, AppError> {
        // ---- 路由前校验 ----
        if args.len() != 3 {
            return Err(AppError::usage(
                "Usage: /swap <token_in> <token_out> <amount>",
            ));
        }
        let token_in = args[0].as_str();
        let token_out = args[1].as_str();

        if !self.gateway.is_valid_address(token_in) || !self.gateway.is_valid_address(token_out) {
            return Err(AppError::invalid_address("invalid token address"));
        }
        if token_in == token_out {
            return Err(AppError::new(
                AppErrorCode::SelfTransfer,
                "cannot swap a token for itself",
            ));
        }

        // 金额必须是正整数字符串（显示单位），内部放大到6位小数单位
        let amount_display: u64 = args[2]
            .parse()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                AppError::new(
                    AppErrorCode::InvalidAmount,
                    format!("invalid swap amount: {}", args[2]),
                )
            })?;
        let amount_in_sun = amount_display.checked_mul(SUN_PER_TRX).ok_or_else(|| {
            AppError::new(AppErrorCode::InvalidAmount, "swap amount overflow")
        })?;

        let wallet = self
            .keystore
            .get_wallet(user_id)
            .await?
            .ok_or_else(AppError::wallet_not_found)?;

        // ---- 查询 + 选路 ----
        let quote = self
            .find_best_route(token_in, token_out, amount_in_sun)
            .await?;

        tracing::info!(
            user_id,
            amount_out = %quote.amount_out,
            hops = quote.pool_versions.len(),
            "Best swap route selected"
        );

        // ---- 构建调用（不签名、不广播） ----
        let call = self.build_swap_call(&quote, &wallet.address);

        Ok(SwapPlan { quote, call })
    }

    /// 查询聚合源并返回amountOut最大的候选路由
    pub async fn find_best_route(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in_sun: u64,
    ) -> Result<SwapQuote, AppError> {
        let resp = self
            .client
            .get(&self.config.router_api_url)
            .query(&[
                ("fromToken", token_in),
                ("toToken", token_out),
                ("amountIn", &amount_in_sun.to_string()),
                ("typeList", &self.config.type_list),
            ])
            .send()
            .await
            .map_err(|e| AppError::new(AppErrorCode::Network, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::new(
                AppErrorCode::ChainRpc,
                format!("swap router returned {}", status),
            ));
        }

        let body: RouterApiResponse = resp
            .json()
            .await
            .map_err(|e| AppError::new(AppErrorCode::ChainRpc, e.to_string()))?;

        if let Some(message) = &body.message {
            tracing::debug!(message = %message, "Swap router message");
        }

        let best = select_best_route(&body.data).ok_or_else(|| {
            AppError::no_route_found(format!(
                "no viable route from {} to {}",
                token_in, token_out
            ))
        })?;

        Ok(SwapQuote {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount_in: best.amount_in.clone(),
            amount_out: best.amount_out.clone(),
            tokens: best.tokens.clone(),
            pool_versions: best.pool_versions.clone(),
            pool_fees: best.pool_fees.clone(),
        })
    }

    /// 把选中报价翻译成合约调用描述，附固定最小输出下限和截止时间
    pub fn build_swap_call(&self, quote: &SwapQuote, recipient: &str) -> SwapCall {
        let deadline = chrono::Utc::now().timestamp().max(0) as u64 + self.config.deadline_secs;

        SwapCall {
            router_contract: self.config.router_contract.clone(),
            tokens: quote.tokens.clone(),
            pool_versions: quote.pool_versions.clone(),
            hop_index: quote.pool_versions.len().saturating_sub(1),
            pool_fees: quote.pool_fees.clone(),
            amount_in: quote.amount_in.clone(),
            min_amount_out: self.config.min_amount_out.clone(),
            recipient: recipient.to_string(),
            deadline,
        }
    }
}

/// 候选集合中amountOut最大者；相等时保留先见的候选
///
/// amountOut无法解析的候选跳过；空集合返回None
pub fn select_best_route(candidates: &[RouteCandidate]) -> Option<&RouteCandidate> {
    let mut best: Option<(&RouteCandidate, Decimal)> = None;

    for candidate in candidates {
        let amount_out = match candidate.amount_out.parse::<Decimal>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    amount_out = %candidate.amount_out,
                    "Skipping route candidate with unparseable amountOut"
                );
                continue;
            }
        };

        match &best {
            Some((_, current_max)) if amount_out <= *current_max => {}
            _ => best = Some((candidate, amount_out)),
        }
    }

    best.map(|(candidate, _)| candidate)
}
