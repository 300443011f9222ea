//! Long-poll loop: one task per update.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bot::command::{Callback, Command};
use crate::bot::handler::{Dispatcher, Operator};
use crate::bot::telegram::{ChatApi, TelegramClient, Update};
use crate::bot::view::{self, Reply};

const RETRY_DELAY: Duration = Duration::from_secs(3);

pub struct Poller {
    client: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
}

impl Poller {
    pub fn new(client: Arc<TelegramClient>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { client, dispatcher }
    }

    /// Polls until `shutdown` is cancelled, then waits for in-flight updates.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut offset = 0;
        let mut tasks = tokio::task::JoinSet::new();

        info!(component = "poller", event = "started", "polling for updates");
        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.client.get_updates(offset) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let api: Arc<dyn ChatApi> = self.client.clone();
                        let dispatcher = self.dispatcher.clone();
                        tasks.spawn(async move { process_update(&dispatcher, api.as_ref(), update).await });
                    }
                }
                Err(e) => {
                    warn!(component = "poller", event = "poll_failed", error = %e, "failed to fetch updates");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }

            // Reap finished tasks.
            while tasks.try_join_next().is_some() {}
        }

        while tasks.join_next().await.is_some() {}
        info!(component = "poller", event = "stopped", "polling stopped");
    }
}

/// Handles one update end to end. Chat API failures are logged and dropped.
pub async fn process_update(dispatcher: &Dispatcher, api: &dyn ChatApi, update: Update) {
    if let Some(query) = update.callback_query {
        let operator = Operator {
            id: query.from.id,
            first_name: query.from.first_name,
        };
        if let Err(e) = api.answer_callback(&query.id).await {
            debug!(component = "poller", event = "answer_failed", error = %e, "failed to answer callback");
        }
        let Some(message) = query.message else {
            return;
        };
        let chat_id = message.chat.id;

        let reply = match query.data.as_deref().map(str::parse::<Callback>) {
            Some(Ok(callback)) => {
                // Progress notice only for operations the operator may run.
                if let Some(notice) = view::progress(&callback).filter(|_| dispatcher.is_allowed(operator.id)) {
                    edit(api, chat_id, message.message_id, &Reply::text(notice)).await;
                }
                dispatcher.handle_callback(&operator, callback).await
            }
            Some(Err(e)) => {
                debug!(component = "poller", event = "unknown_callback", error = %e, "ignored callback");
                view::unknown_action()
            }
            None => return,
        };
        edit(api, chat_id, message.message_id, &reply).await;
        return;
    }

    if let Some(message) = update.message {
        let (Some(text), Some(from)) = (message.text.as_deref(), message.from.as_ref()) else {
            return;
        };
        let Some(command) = Command::parse(text) else {
            return;
        };
        let operator = Operator {
            id: from.id,
            first_name: from.first_name.clone(),
        };
        let reply = dispatcher.handle_command(&operator, command).await;
        if let Err(e) = api.send_message(message.chat.id, &reply).await {
            warn!(component = "poller", event = "send_failed", chat_id = message.chat.id, error = %e, "failed to send reply");
        }
    }
}

async fn edit(api: &dyn ChatApi, chat_id: i64, message_id: i64, reply: &Reply) {
    if let Err(e) = api.edit_message(chat_id, message_id, reply).await {
        warn!(component = "poller", event = "edit_failed", chat_id = chat_id, error = %e, "failed to edit message");
    }
}
