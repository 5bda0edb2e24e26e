//! TronVault - Tron托管钱包与交易执行核心
//!
//! 聊天命令驱动：按用户生成并持久化密钥对、查询余额、
//! 校验并提交TRX转账、为代币兑换选择最优执行路由

pub mod app_state;
pub mod bot;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod repository;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};
