//! 命令分发器
//!
//! 入站命令到各服务的薄映射层：解析、调用、渲染，不含业务逻辑

use std::sync::Arc;

use crate::app_state::AppState;
use crate::bot::replies;
use crate::error::AppError;

/// 解析后的入站命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Wallet,
    Balance,
    TokenBalance(Vec<String>),
    Transfer(Vec<String>),
    Swap(Vec<String>),
    MemeCoinInfo(Vec<String>),
    Unknown(String),
}

/// 解析一条消息文本；非命令（不以'/'开头）返回None
///
/// 兼容群聊形式的"/cmd@botname"
pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    let name = head
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let args: Vec<String> = parts.map(str::to_string).collect();

    Some(match name.as_str() {
        "start" | "help" => Command::Start,
        "wallet" => Command::Wallet,
        "balance" => Command::Balance,
        "tokenbalance" => Command::TokenBalance(args),
        "transfer" => Command::Transfer(args),
        "swap" => Command::Swap(args),
        "getmemecoininfo" => Command::MemeCoinInfo(args),
        _ => Command::Unknown(name),
    })
}

/// 执行一条命令并渲染回复文本
pub async fn dispatch(state: &Arc<AppState>, user_id: i64, command: Command) -> String {
    let result = match command {
        Command::Start => Ok(replies::help()),
        Command::Wallet => handle_wallet(state, user_id).await,
        Command::Balance => handle_balance(state, user_id).await,
        Command::TokenBalance(args) => handle_token_balance(state, user_id, &args).await,
        Command::Transfer(args) => handle_transfer(state, user_id, &args).await,
        Command::Swap(args) => handle_swap(state, user_id, &args).await,
        Command::MemeCoinInfo(args) => handle_meme_coin_info(state, &args).await,
        Command::Unknown(name) => Ok(replies::unknown_command(&name)),
    };

    result.unwrap_or_else(|e| replies::error(&e))
}

async fn handle_wallet(state: &Arc<AppState>, user_id: i64) -> Result<String, AppError> {
    let wallet = state.keystore.get_or_create_wallet(user_id).await?;
    // 唯一一处私钥出现在对外回复里
    Ok(replies::wallet_info(&wallet.address, &wallet.private_key))
}

async fn handle_balance(state: &Arc<AppState>, user_id: i64) -> Result<String, AppError> {
    // 钱包不存在时直接返回，不触发任何链上查询
    let wallet = state
        .keystore
        .get_wallet(user_id)
        .await?
        .ok_or_else(AppError::wallet_not_found)?;

    let balance_sun = state.gateway.get_native_balance(&wallet.address).await?;
    Ok(replies::native_balance(&wallet.address, balance_sun))
}

async fn handle_token_balance(
    state: &Arc<AppState>,
    user_id: i64,
    args: &[String],
) -> Result<String, AppError> {
    if args.len() != 1 {
        return Err(AppError::usage("Usage: /tokenbalance <symbol>"));
    }

    let wallet = state
        .keystore
        .get_wallet(user_id)
        .await?
        .ok_or_else(AppError::wallet_not_found)?;

    match state.assets.find_holding(&wallet.address, &args[0]).await? {
        Some(holding) => Ok(replies::token_holding(&wallet.address, &holding)),
        None => Ok(replies::no_token_holding(&wallet.address, &args[0])),
    }
}

async fn handle_transfer(
    state: &Arc<AppState>,
    user_id: i64,
    args: &[String],
) -> Result<String, AppError> {
    let outcome = state.transfers.execute(user_id, args).await?;
    Ok(replies::transfer_outcome(&outcome))
}

async fn handle_swap(
    state: &Arc<AppState>,
    user_id: i64,
    args: &[String],
) -> Result<String, AppError> {
    let plan = state.swaps.execute(user_id, args).await?;
    Ok(replies::swap_plan(&plan))
}

async fn handle_meme_coin_info(
    state: &Arc<AppState>,
    args: &[String],
) -> Result<String, AppError> {
    if args.len() != 1 {
        return Err(AppError::usage("Usage: /getmemecoininfo <address>"));
    }

    let tokens = state.token_info.lookup(&args[0]).await?;
    Ok(replies::meme_coin_info(&args[0], &tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_command("/wallet"), Some(Command::Wallet));
        assert_eq!(parse_command("/balance"), Some(Command::Balance));
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/help"), Some(Command::Start));
    }

    #[test]
    fn test_parse_with_args() {
        assert_eq!(
            parse_command("/transfer Taddr 1.5"),
            Some(Command::Transfer(vec!["Taddr".into(), "1.5".into()]))
        );
        assert_eq!(
            parse_command("/swap Ta Tb 10"),
            Some(Command::Swap(vec!["Ta".into(), "Tb".into(), "10".into()]))
        );
    }

    #[test]
    fn test_parse_group_chat_suffix() {
        assert_eq!(parse_command("/wallet@tronvault_bot"), Some(Command::Wallet));
    }

    #[test]
    fn test_non_commands_ignored() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_command("/copytrade Taddr"),
            Some(Command::Unknown("copytrade".into()))
        );
    }
}
