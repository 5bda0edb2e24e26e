//! 应用状态
//! 包含所有共享资源；链网关显式构造注入，不使用全局单例

use std::sync::Arc;

use crate::config::Config;
use crate::infrastructure::db::DbPool;
use crate::service::asset_service::AssetService;
use crate::service::chain_gateway::{ChainGateway, TronHttpGateway};
use crate::service::keystore::KeyStore;
use crate::service::swap_router::SwapRouterService;
use crate::service::token_info_service::TokenInfoService;
use crate::service::transfer_service::TransferService;

pub struct AppState {
    pub config: Arc<Config>,
    pub pool: DbPool,
    pub gateway: Arc<dyn ChainGateway>,
    pub keystore: Arc<KeyStore>,
    pub assets: AssetService,
    pub transfers: TransferService,
    pub swaps: SwapRouterService,
    pub token_info: TokenInfoService,
}

impl AppState {
    /// 用默认的TronGrid HTTP网关组装全部服务
    pub fn new(pool: DbPool, config: Arc<Config>) -> Self {
        let gateway: Arc<dyn ChainGateway> = Arc::new(TronHttpGateway::new(&config.chain));
        Self::with_gateway(pool, config, gateway)
    }

    /// 注入自定义网关（测试替身入口）
    pub fn with_gateway(pool: DbPool, config: Arc<Config>, gateway: Arc<dyn ChainGateway>) -> Self {
        let keystore = Arc::new(KeyStore::new(pool.clone()));

        let assets = AssetService::new(gateway.clone());
        let transfers = TransferService::new(
            keystore.clone(),
            gateway.clone(),
            config.chain.clone(),
        );
        let swaps = SwapRouterService::new(
            keystore.clone(),
            gateway.clone(),
            config.swap.clone(),
        );
        let token_info = TokenInfoService::new(gateway.clone());

        Self {
            config,
            pool,
            gateway,
            keystore,
            assets,
            transfers,
            swaps,
            token_info,
        }
    }
}
