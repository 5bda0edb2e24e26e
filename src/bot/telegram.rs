//! Telegram Bot API 薄客户端
//!
//! 命令入口 + 回复出口，长轮询getUpdates，不依赖webhook

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::TelegramConfig;

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            // 必须比长轮询超时更宽松
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_base_url.trim_end_matches('/'),
                config.bot_token
            ),
            poll_timeout_secs: config.poll_timeout_secs,
        }
    }

    /// 长轮询拉取更新
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let url = format!("{}/getUpdates", self.base_url);
        let resp: ApiResponse<Vec<Update>> = self
            .client
            .get(&url)
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", self.poll_timeout_secs.to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ])
            .send()
            .await
            .context("getUpdates request failed")?
            .json()
            .await
            .context("getUpdates returned malformed body")?;

        if !resp.ok {
            anyhow::bail!(
                "getUpdates rejected: {}",
                resp.description.unwrap_or_default()
            );
        }
        Ok(resp.result.unwrap_or_default())
    }

    /// 发送HTML格式回复
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = format!("{}/sendMessage", self.base_url);
        let resp: ApiResponse<serde_json::Value> = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .context("sendMessage request failed")?
            .json()
            .await
            .context("sendMessage returned malformed body")?;

        if !resp.ok {
            anyhow::bail!(
                "sendMessage rejected: {}",
                resp.description.unwrap_or_default()
            );
        }
        Ok(())
    }
}
