//! 统一错误分类
//!
//! 设计原则：
//! - 用户可纠正的错误（参数、地址、金额）原样提示，带具体指引
//! - 基础设施/链上错误只向用户返回通用消息，细节保留在诊断日志
//! - 确认超时是"结果未知"，必须与失败区分开（资金可能已经转移）
//! - 本核心不做任何自动重试，每个失败对该次请求都是终态

use std::fmt;

/// 错误分类码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    // 用户可纠正
    Usage,
    InvalidAddress,
    InvalidAmount,
    SelfTransfer,
    WalletNotFound,
    InsufficientResources,
    NoRouteFound,

    // 基础设施/链上
    StorageUnavailable,
    Network,
    ChainRpc,
    TransferFailed,
    ConfirmationTimeout,
    Internal,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
}

impl AppError {
    pub fn new(code: AppErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        match self.code {
            AppErrorCode::Usage => "usage",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::InvalidAmount => "invalid_amount",
            AppErrorCode::SelfTransfer => "self_transfer",
            AppErrorCode::WalletNotFound => "wallet_not_found",
            AppErrorCode::InsufficientResources => "insufficient_resources",
            AppErrorCode::NoRouteFound => "no_route_found",
            AppErrorCode::StorageUnavailable => "storage_unavailable",
            AppErrorCode::Network => "network",
            AppErrorCode::ChainRpc => "chain_rpc",
            AppErrorCode::TransferFailed => "transfer_failed",
            AppErrorCode::ConfirmationTimeout => "confirmation_timeout",
            AppErrorCode::Internal => "internal",
        }
    }

    /// 该错误是否可以把内部消息原样展示给用户
    ///
    /// 基础设施类错误的message可能携带上游细节，不外泄
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self.code,
            AppErrorCode::Usage
                | AppErrorCode::InvalidAddress
                | AppErrorCode::InvalidAmount
                | AppErrorCode::SelfTransfer
                | AppErrorCode::WalletNotFound
                | AppErrorCode::InsufficientResources
                | AppErrorCode::NoRouteFound
        )
    }

    // 业务错误辅助函数

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Usage, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidAddress, msg)
    }

    pub fn wallet_not_found() -> Self {
        Self::new(
            AppErrorCode::WalletNotFound,
            "wallet does not exist for this user",
        )
    }

    pub fn self_transfer() -> Self {
        Self::new(AppErrorCode::SelfTransfer, "sender equals receiver")
    }

    pub fn storage_unavailable(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::StorageUnavailable, msg)
    }

    pub fn no_route_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NoRouteFound, msg)
    }

    pub fn transfer_failed(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::TransferFailed, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Internal, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::storage_unavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infra_errors_are_not_user_correctable() {
        let e = AppError::storage_unavailable("connection refused to /data/wallet.db");
        assert!(!e.is_user_correctable());
        let e = AppError::new(AppErrorCode::ChainRpc, "CONTRACT_VALIDATE_ERROR");
        assert!(!e.is_user_correctable());
    }

    #[test]
    fn test_validation_errors_are_user_correctable() {
        assert!(AppError::self_transfer().is_user_correctable());
        assert!(AppError::wallet_not_found().is_user_correctable());
        assert!(AppError::usage("Usage: /transfer <address> <amount>").is_user_correctable());
    }
}
