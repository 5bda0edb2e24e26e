//! 回复文本渲染
//!
//! 所有对用户可见的文案集中在此；基础设施类错误只渲染通用消息，
//! 具体细节永远不进回复

use crate::domain::amount::format_sun_as_trx;
use crate::error::{AppError, AppErrorCode};
use crate::service::asset_service::TokenHolding;
use crate::service::swap_router::SwapPlan;
use crate::service::token_info_service::Trc20TokenInfo;
use crate::service::transfer_service::{TransferOutcome, TRANSFER_REMEDIATION};

pub fn help() -> String {
    concat!(
        "- Use /wallet to get your wallet address and private key.\n",
        "- Use /balance to check your total balance in TRX.\n",
        "- Use /tokenbalance <token_symbol> to check your balance of tokens.\n",
        "- Use /transfer <receiver_address> <amount> to transfer TRX to another address.\n",
        "- Use /swap <token_in> <token_out> <amount> to quote a token swap.\n",
        "- Use /getmemecoininfo <address> to get info about a TRC20 token.\n",
    )
    .to_string()
}

pub fn unknown_command(name: &str) -> String {
    format!("Unknown command /{}. Use /help to see what I can do.", name)
}

pub fn wallet_info(address: &str, private_key: &str) -> String {
    format!(
        "🔐 <strong>Wallet Info</strong> 🔐\n\n\
         📍 <strong>Address:</strong>\n{}\n\n\
         🔑 <strong>Private Key:</strong>\n{}\n\n\
         ⚠️ <strong>Disclaimer:</strong>\nPlease store your private key securely. \
         Anyone with access to it can control your funds. Do not share it with anyone.",
        address, private_key
    )
}

pub fn native_balance(address: &str, balance_sun: u64) -> String {
    format!(
        "🔐 <strong>Wallet Info</strong> 🔐\n\n\
         📍 <strong>Address:</strong>\n{}\n\n\
         💸 <strong>Total Account Balance:</strong>\n{} TRX",
        address,
        format_sun_as_trx(balance_sun)
    )
}

pub fn token_holding(address: &str, holding: &TokenHolding) -> String {
    format!(
        "🔐 <strong>Wallet Token Holdings</strong> 🔐\n\n\
         📍 <strong>Wallet Address:</strong>\n{}\n\n\
         📍 <strong>Token:</strong>\n{} ({})\n\n\
         💸 <strong>Token Balance:</strong>\n{} ({})",
        address,
        holding.name,
        holding.symbol,
        format_sun_as_trx(holding.balance),
        holding.symbol
    )
}

pub fn no_token_holding(address: &str, query: &str) -> String {
    format!(
        "🔐 <strong>Wallet Info</strong> 🔐\n\n\
         📍 <strong>Address:</strong>\n{}\n\n\
         🔒 <strong>Wallet has no {} holdings.</strong>\n\
         Please check the token symbol and try again.",
        address,
        query.to_uppercase()
    )
}

pub fn transfer_outcome(outcome: &TransferOutcome) -> String {
    match outcome {
        TransferOutcome::Succeeded {
            sender,
            receiver,
            amount_trx,
            explorer_url,
            ..
        } => format!(
            "🔐 <strong>Transfer Info</strong> 🔐\n\n\
             📍 <strong>Sender Address:</strong>\n{}\n\n\
             📍 <strong>Receiver Address:</strong>\n{}\n\n\
             💸 <strong>Amount:</strong>\n{} TRX\n\n\
             📝 <strong>Transaction:</strong>\n{}",
            sender, receiver, amount_trx, explorer_url
        ),
        // 超时≠失败：资金可能已经转移，必须带回交易ID让用户自查
        TransferOutcome::TimedOut {
            amount_trx,
            tx_id,
            explorer_url,
            ..
        } => format!(
            "⏳ <strong>Transfer Pending</strong> ⏳\n\n\
             The network did not confirm your transfer of {} TRX in time. \
             It may still complete — do <strong>not</strong> retry immediately.\n\n\
             📝 <strong>Transaction ID:</strong>\n{}\n\n\
             Check its status here:\n{}",
            amount_trx, tx_id, explorer_url
        ),
    }
}

pub fn swap_plan(plan: &SwapPlan) -> String {
    format!(
        "🔐 <strong>Swap Quote</strong> 🔐\n\n\
         📍 <strong>From Token:</strong>\n{}\n\n\
         📍 <strong>To Token:</strong>\n{}\n\n\
         💸 <strong>Amount In:</strong>\n{}\n\n\
         💰 <strong>Best Amount Out:</strong>\n{}\n\n\
         🛣 <strong>Route:</strong> {} hop(s) via {}\n\n\
         The call is prepared for router {} — submission is not performed.",
        plan.quote.token_in,
        plan.quote.token_out,
        plan.quote.amount_in,
        plan.quote.amount_out,
        plan.call.pool_versions.len(),
        plan.call.pool_versions.join(" → "),
        plan.call.router_contract
    )
}

pub fn meme_coin_info(address: &str, tokens: &[Trc20TokenInfo]) -> String {
    if tokens.is_empty() {
        return format!(
            "🔐 <strong>Meme Coin Info</strong> 🔐\n\n\
             No TRC20 token found at address:\n{}",
            address
        );
    }

    let mut out = format!(
        "🔐 <strong>Meme Coin Info</strong> 🔐\n\n\
         📍 <strong>Address:</strong>\n{}\n",
        address
    );
    for token in tokens {
        out.push_str(&format!(
            "\n💰 <strong>Token Name:</strong> {}\n\
             🔖 <strong>Symbol:</strong> {}\n",
            token.name,
            token.symbol.to_uppercase()
        ));
        if let Some(supply) = &token.total_supply {
            out.push_str(&format!("📈 <strong>Total Supply:</strong> {}\n", supply));
        }
        if let Some(holders) = token.holders_count {
            out.push_str(&format!("👥 <strong>Holders:</strong> {}\n", holders));
        }
        if let Some(market) = &token.market_info {
            if let Some(trx) = market.price_in_trx {
                out.push_str(&format!("💲 <strong>Price (TRX):</strong> {}\n", trx));
            }
            if let Some(usd) = market.price_in_usd {
                out.push_str(&format!("💲 <strong>Price (USD):</strong> {}\n", usd));
            }
            if let Some(liquidity) = market.liquidity {
                out.push_str(&format!("💧 <strong>Liquidity:</strong> {}\n", liquidity));
            }
        }
    }
    out
}

pub fn error(err: &AppError) -> String {
    if err.is_user_correctable() {
        return match err.code {
            AppErrorCode::Usage => err.message.clone(),
            AppErrorCode::InvalidAddress => "⚠️ <strong>Invalid address.</strong> \
                Double-check it and try again."
                .into(),
            AppErrorCode::InvalidAmount => "⚠️ <strong>Invalid amount.</strong> \
                Enter a positive number, e.g. 1.5."
                .into(),
            AppErrorCode::SelfTransfer => {
                "⚠️ <strong>Sender and receiver must differ.</strong>".into()
            }
            AppErrorCode::WalletNotFound => "⚠️ <strong>Wallet doesn't exist.</strong> \
                Please create one with the /wallet command first."
                .into(),
            AppErrorCode::InsufficientResources => "⚠️ <strong>Not enough bandwidth</strong> \
                to submit this transaction. Wait for your quota to refresh or stake TRX."
                .into(),
            AppErrorCode::NoRouteFound => "⚠️ <strong>No swap route found</strong> \
                for this token pair. Try a different pair or amount."
                .into(),
            _ => err.message.clone(),
        };
    }

    // 基础设施/链上错误：通用消息，不泄漏内部细节
    match err.code {
        AppErrorCode::TransferFailed => format!(
            "🔐 <strong>Something went wrong!</strong> 🔐\n\n{}.",
            TRANSFER_REMEDIATION
        ),
        AppErrorCode::ConfirmationTimeout => "⏳ <strong>The network did not confirm \
            the transaction in time.</strong> The outcome is unknown — check the explorer \
            before retrying."
            .into(),
        _ => "🔐 <strong>Something went wrong!</strong> 🔐\n\n\
            The service is temporarily unavailable. Please try again later."
            .into(),
    }
}
