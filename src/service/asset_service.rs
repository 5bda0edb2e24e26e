//! TRC10资产余额服务
//!
//! 把用户输入的代币符号/名称解析为链上资产并返回持仓：
//! 大小写不敏感的精确匹配（name或symbol），按上游返回顺序先见优先，
//! 不做模糊匹配

use std::sync::Arc;

use crate::error::AppError;
use crate::service::chain_gateway::ChainGateway;

/// 解析出的代币持仓
#[derive(Debug, Clone)]
pub struct TokenHolding {
    pub asset_id: String,
    pub name: String,
    pub symbol: String,
    pub balance: u64,
}

pub struct AssetService {
    gateway: Arc<dyn ChainGateway>,
}

impl AssetService {
    pub fn new(gateway: Arc<dyn ChainGateway>) -> Self {
        Self { gateway }
    }

    /// 查询地址持有的、符号或名称匹配query的第一个资产
    ///
    /// 没有匹配返回Ok(None)（钱包无此代币持仓，属正常情况而非错误）
    pub async fn find_holding(
        &self,
        address: &str,
        query: &str,
    ) -> Result<Option<TokenHolding>, AppError> {
        let query_lower = query.to_lowercase();
        let balances = self.gateway.get_asset_balances(address).await?;

        for entry in balances {
            let meta = match self.gateway.get_asset_metadata(&entry.asset_id).await {
                Ok(meta) => meta,
                Err(e) => {
                    // 个别资产的元数据拉取失败不应让整个查询失败
                    tracing::warn!(
                        asset_id = %entry.asset_id,
                        error = %e,
                        "Asset metadata lookup failed, skipping"
                    );
                    continue;
                }
            };

            if meta.name.to_lowercase() == query_lower
                || meta.symbol.to_lowercase() == query_lower
            {
                return Ok(Some(TokenHolding {
                    asset_id: entry.asset_id,
                    name: meta.name,
                    symbol: meta.symbol,
                    balance: entry.balance,
                }));
            }
        }

        Ok(None)
    }
}
