//! 聊天命令入口
//!
//! 外部协作方：入站命令源 + 回复出口。核心业务全部在service层，
//! 这里只做轮询、解析、分发、渲染。
//!
//! 调度模型：每条入站命令spawn一个任务，不同用户的操作天然并发，
//! 慢的链上调用不会阻塞其他用户

pub mod dispatcher;
pub mod replies;
pub mod telegram;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::app_state::AppState;
use telegram::TelegramClient;

/// 长轮询主循环；正常情况下不返回
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let client = Arc::new(TelegramClient::new(&state.config.telegram));
    let mut offset: i64 = 0;

    tracing::info!("Telegram command loop started");

    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed, backing off");
                tokio::time::sleep(Duration::from_secs(3)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let (Some(user), Some(text)) = (message.from, message.text) else {
                continue;
            };
            let Some(command) = dispatcher::parse_command(&text) else {
                continue;
            };

            let state = state.clone();
            let client = client.clone();
            let chat_id = message.chat.id;
            tokio::spawn(async move {
                let reply = dispatcher::dispatch(&state, user.id, command).await;
                if let Err(e) = client.send_message(chat_id, &reply).await {
                    tracing::warn!(chat_id, error = %e, "Failed to send reply");
                }
            });
        }
    }
}
