#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    use crate::access::Access;
    use crate::batch::BatchExecutor;
    use crate::bot::handler::Dispatcher;
    use crate::bot::poller::process_update;
    use crate::bot::telegram::{ChatApi, TelegramError, Update};
    use crate::bot::view::Reply;
    use crate::model::ServiceStatus;
    use crate::support::{FakeRemote, RecordingRegistry};

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Message(i64, String),
        Edit(i64, i64, String),
        Answer(String),
    }

    #[derive(Default)]
    struct RecordingChat {
        sent: Mutex<Vec<Sent>>,
    }

    #[async_trait::async_trait]
    impl ChatApi for RecordingChat {
        async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
            self.sent.lock().push(Sent::Message(chat_id, reply.text.clone()));
            Ok(())
        }

        async fn edit_message(&self, chat_id: i64, message_id: i64, reply: &Reply) -> Result<(), TelegramError> {
            self.sent
                .lock()
                .push(Sent::Edit(chat_id, message_id, reply.text.clone()));
            Ok(())
        }

        async fn answer_callback(&self, callback_id: &str) -> Result<(), TelegramError> {
            self.sent.lock().push(Sent::Answer(callback_id.to_string()));
            Ok(())
        }
    }

    async fn dispatcher(access: Access) -> (Arc<RecordingRegistry>, Arc<FakeRemote>, Dispatcher) {
        let registry = RecordingRegistry::new().await;
        let remote = FakeRemote::new();
        let executor = BatchExecutor::new(registry.clone(), remote.clone(), 1);
        let dispatcher = Dispatcher::new(registry.clone(), remote.clone(), executor, access);
        (registry, remote, dispatcher)
    }

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    fn callback_update(user_id: i64, data: &str) -> Update {
        update(json!({
            "update_id": 10,
            "callback_query": {
                "id": "cb-1",
                "from": {"id": user_id, "first_name": "Dana"},
                "message": {"message_id": 55, "chat": {"id": 9}},
                "data": data
            }
        }))
    }

    #[tokio::test]
    async fn test_command_message_gets_reply() {
        let (_registry, _remote, dispatcher) = dispatcher(Access::Open).await;
        let chat = RecordingChat::default();

        let msg = update(json!({
            "update_id": 1,
            "message": {
                "message_id": 3,
                "from": {"id": 5, "first_name": "Dana"},
                "chat": {"id": 9},
                "text": "/start"
            }
        }));
        process_update(&dispatcher, &chat, msg).await;

        let sent = chat.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Sent::Message(9, text) if text.contains("Hello Dana")));
    }

    #[tokio::test]
    async fn test_plain_text_is_ignored() {
        let (_registry, _remote, dispatcher) = dispatcher(Access::Open).await;
        let chat = RecordingChat::default();

        let msg = update(json!({
            "update_id": 1,
            "message": {"message_id": 3, "from": {"id": 5}, "chat": {"id": 9}, "text": "hi"}
        }));
        process_update(&dispatcher, &chat, msg).await;

        assert!(chat.sent.lock().is_empty());
    }

    /// Operations edit the message to a progress notice, then to the result.
    #[tokio::test]
    async fn test_callback_shows_progress_then_result() {
        let (registry, remote, dispatcher) = dispatcher(Access::Open).await;
        registry.seed("srv-a", "api", 5, ServiceStatus::Active).await;
        remote.with_status("srv-a", ServiceStatus::Active);
        let chat = RecordingChat::default();

        process_update(&dispatcher, &chat, callback_update(5, "suspend_all")).await;

        let sent = chat.sent.lock().clone();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], Sent::Answer("cb-1".into()));
        assert!(matches!(&sent[1], Sent::Edit(9, 55, text) if text.contains("Suspending all")));
        assert!(matches!(&sent[2], Sent::Edit(9, 55, text) if text.contains("Attempted: 1")));
    }

    /// Updates are processed on spawned tasks, as the poll loop does.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_batch_update_runs_on_spawned_task() {
        let registry = RecordingRegistry::new().await;
        let remote = FakeRemote::new();
        let executor = BatchExecutor::new(registry.clone(), remote.clone(), 4);
        let dispatcher = Arc::new(Dispatcher::new(registry.clone(), remote.clone(), executor, Access::Open));
        for id in ["srv-a", "srv-b", "srv-c"] {
            registry.seed(id, id, 5, ServiceStatus::Active).await;
            remote.with_status(id, ServiceStatus::Active);
        }
        let chat = Arc::new(RecordingChat::default());

        let task = {
            let dispatcher = dispatcher.clone();
            let chat = chat.clone();
            tokio::spawn(async move {
                process_update(&dispatcher, chat.as_ref(), callback_update(5, "suspend_all")).await
            })
        };
        task.await.unwrap();

        let sent = chat.sent.lock().clone();
        assert_eq!(sent.len(), 3);
        assert!(matches!(&sent[2], Sent::Edit(9, 55, text) if text.contains("Succeeded: 3")));
        assert_eq!(remote.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unauthorized_callback_skips_progress() {
        let (_registry, _remote, dispatcher) = dispatcher(Access::from_admins(&[1])).await;
        let chat = RecordingChat::default();

        process_update(&dispatcher, &chat, callback_update(5, "suspend_all")).await;

        let sent = chat.sent.lock().clone();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[1], Sent::Edit(9, 55, text) if text.contains("not allowed")));
    }

    #[tokio::test]
    async fn test_unknown_callback_data() {
        let (_registry, _remote, dispatcher) = dispatcher(Access::Open).await;
        let chat = RecordingChat::default();

        process_update(&dispatcher, &chat, callback_update(5, "explode_srv-a")).await;

        let sent = chat.sent.lock().clone();
        assert!(matches!(&sent[1], Sent::Edit(_, _, text) if text.contains("Unknown action")));
    }
}
