//! 原生TRX转账执行器
//!
//! 每次请求走固定的状态机：
//! Validating → Building → Signing → Broadcasting → Confirming
//! → {Succeeded, Failed, TimedOut}
//!
//! 校验按文档顺序快速失败；构建/签名/广播阶段的异常对用户折叠为
//! 单一的TransferFailed（带补救提示），细节只进诊断日志；
//! 广播成功之后（确认阶段）的超时和查询失败都是"结果未知"，
//! 与失败严格区分（资金可能已转移，不能提示用户重试）

use std::sync::Arc;
use std::time::Duration;

use crate::config::ChainConfig;
use crate::domain::amount::{format_sun_as_trx, parse_trx_to_sun};
use crate::error::{AppError, AppErrorCode};
use crate::infrastructure::log_redact::redact_address;
use crate::service::chain_gateway::{ChainError, ChainGateway};
use crate::service::keystore::KeyStore;

/// 状态机阶段（用于诊断日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Validating,
    Building,
    Signing,
    Broadcasting,
    Confirming,
}

impl TransferStage {
    fn as_str(&self) -> &'static str {
        match self {
            TransferStage::Validating => "validating",
            TransferStage::Building => "building",
            TransferStage::Signing => "signing",
            TransferStage::Broadcasting => "broadcasting",
            TransferStage::Confirming => "confirming",
        }
    }
}

/// 转账终态报告
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    Succeeded {
        sender: String,
        receiver: String,
        amount_trx: String,
        tx_id: String,
        explorer_url: String,
        block_number: u64,
    },
    /// 确认超时：结果未知，不等于失败；tx_id必须带回给用户
    TimedOut {
        sender: String,
        receiver: String,
        amount_trx: String,
        tx_id: String,
        explorer_url: String,
    },
}

/// 转账失败时给用户的补救提示
pub const TRANSFER_REMEDIATION: &str = "Check the address and amount, make sure your wallet \
has sufficient balance, then try again";

pub struct TransferService {
    keystore: Arc<KeyStore>,
    gateway: Arc<dyn ChainGateway>,
    chain: ChainConfig,
}

impl TransferService {
    pub fn new(keystore: Arc<KeyStore>, gateway: Arc<dyn ChainGateway>, chain: ChainConfig) -> Self {
        Self {
            keystore,
            gateway,
            chain,
        }
    }

    /// 执行一次转账命令，args为命令后的原始参数
    pub async fn execute(
        &self,
        user_id: i64,
        args: &[String],
    ) -> Result<TransferOutcome, AppError> {
        // ---- Validating：固定顺序，首个失败即返回，期间不发起交易 ----

        // 1. 参数个数
        if args.len() != 2 {
            return Err(AppError::usage("Usage: /transfer <address> <amount>"));
        }
        let receiver = args[0].as_str();

        // 2. 收款地址格式+校验和
        if !self.gateway.is_valid_address(receiver) {
            return Err(AppError::invalid_address(format!(
                "invalid receiver address: {}",
                receiver
            )));
        }

        // 3. 金额：显示单位TRX，内部转sun，超6位小数截断
        let amount_sun = parse_trx_to_sun(&args[1])?;

        // 4. 发送方钱包必须已存在
        let wallet = self
            .keystore
            .get_wallet(user_id)
            .await?
            .ok_or_else(AppError::wallet_not_found)?;

        // 5. 禁止自转
        if wallet.address == receiver {
            return Err(AppError::self_transfer());
        }

        // 6. 带宽前置检查：额度不足是硬性拒绝，但检查本身失败只记日志
        match self.gateway.get_available_bandwidth(&wallet.address).await {
            Ok(bandwidth) if bandwidth < self.chain.min_bandwidth => {
                return Err(AppError::new(
                    AppErrorCode::InsufficientResources,
                    format!(
                        "available bandwidth {} below required {}",
                        bandwidth, self.chain.min_bandwidth
                    ),
                ));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    user_id,
                    error = %e,
                    "Bandwidth pre-flight check failed, proceeding anyway"
                );
            }
        }

        let amount_trx = format_sun_as_trx(amount_sun);
        tracing::info!(
            user_id,
            sender = %redact_address(&wallet.address),
            receiver = %redact_address(receiver),
            amount_sun,
            "Transfer validated"
        );

        // ---- Building ----
        let unsigned = self
            .gateway
            .build_transfer(
                &wallet.address,
                receiver,
                amount_sun,
                &self.chain.transfer_memo,
                self.chain.fee_limit_sun,
            )
            .await
            .map_err(|e| self.fail(user_id, TransferStage::Building, e))?;

        // ---- Signing + Broadcasting ----
        let handle = self
            .gateway
            .sign_and_broadcast(&unsigned, &wallet.private_key)
            .await
            .map_err(|e| self.fail(user_id, TransferStage::Broadcasting, e))?;

        let explorer_url = format!("{}/{}", self.chain.explorer_tx_url, handle.tx_id);

        // ---- Confirming ----
        let timeout = Duration::from_secs(self.chain.confirm_timeout_secs);
        match self.gateway.await_confirmation(&handle, timeout).await {
            Ok(receipt) if receipt.success => {
                tracing::info!(
                    user_id,
                    tx_id = %receipt.tx_id,
                    block_number = receipt.block_number,
                    "Transfer confirmed"
                );
                Ok(TransferOutcome::Succeeded {
                    sender: wallet.address,
                    receiver: receiver.to_string(),
                    amount_trx,
                    tx_id: receipt.tx_id,
                    explorer_url,
                    block_number: receipt.block_number,
                })
            }
            Ok(receipt) => {
                // 上链但执行失败
                tracing::error!(user_id, tx_id = %receipt.tx_id, "Transfer reverted on chain");
                Err(AppError::transfer_failed(TRANSFER_REMEDIATION))
            }
            Err(ChainError::ConfirmationTimeout { tx_id }) => {
                tracing::warn!(
                    user_id,
                    tx_id = %tx_id,
                    timeout_secs = self.chain.confirm_timeout_secs,
                    "Transfer confirmation timed out, outcome unknown"
                );
                Ok(TransferOutcome::TimedOut {
                    sender: wallet.address,
                    receiver: receiver.to_string(),
                    amount_trx,
                    tx_id,
                    explorer_url,
                })
            }
            Err(e) => {
                // 广播已被接受，此后的查询失败同样是"结果未知"，
                // 不得按失败提示用户重试
                tracing::error!(
                    user_id,
                    stage = TransferStage::Confirming.as_str(),
                    tx_id = %handle.tx_id,
                    error = %e,
                    "Confirmation polling failed, outcome unknown"
                );
                Ok(TransferOutcome::TimedOut {
                    sender: wallet.address,
                    receiver: receiver.to_string(),
                    amount_trx,
                    tx_id: handle.tx_id.clone(),
                    explorer_url,
                })
            }
        }
    }

    /// 构建/签名/广播/确认阶段的异常：细节进日志，用户只看到通用失败
    fn fail(&self, user_id: i64, stage: TransferStage, e: ChainError) -> AppError {
        tracing::error!(
            user_id,
            stage = stage.as_str(),
            error = %e,
            "Transfer pipeline failed"
        );
        AppError::transfer_failed(TRANSFER_REMEDIATION)
    }
}
