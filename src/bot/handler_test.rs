#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::access::Access;
    use crate::batch::BatchExecutor;
    use crate::bot::command::{Callback, Command};
    use crate::bot::handler::{Dispatcher, Operator};
    use crate::model::{Action, ServiceStatus};
    use crate::registry::Registry;
    use crate::support::{FakeRemote, RecordingRegistry};
    use serde_json::json;

    const OWNER: i64 = 100;

    struct Fixture {
        registry: Arc<RecordingRegistry>,
        remote: Arc<FakeRemote>,
        dispatcher: Dispatcher,
    }

    async fn setup(access: Access) -> Fixture {
        let registry = RecordingRegistry::new().await;
        let remote = FakeRemote::new();
        let executor = BatchExecutor::new(registry.clone(), remote.clone(), 1);
        let dispatcher = Dispatcher::new(registry.clone(), remote.clone(), executor, access);
        Fixture {
            registry,
            remote,
            dispatcher,
        }
    }

    fn operator(id: i64) -> Operator {
        Operator {
            id,
            first_name: "Dana".to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_is_open_to_everyone() {
        let f = setup(Access::from_admins(&[1])).await;
        let reply = f.dispatcher.handle_command(&operator(999), Command::Start).await;
        assert!(reply.text.contains("Hello Dana"));
    }

    #[tokio::test]
    async fn test_unauthorized_user_touches_nothing() {
        let f = setup(Access::from_admins(&[1])).await;
        f.registry.seed("srv-a", "api", 999, ServiceStatus::Active).await;
        f.remote.with_status("srv-a", ServiceStatus::Active);

        let reply = f.dispatcher.handle_command(&operator(999), Command::Manage).await;
        assert!(reply.text.contains("not allowed"));
        let reply = f.dispatcher.handle_callback(&operator(999), Callback::SuspendAll).await;
        assert!(reply.text.contains("not allowed"));

        assert_eq!(f.remote.fetch_count(), 0);
        assert!(f.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_service_uses_remote_name_by_default() {
        let f = setup(Access::Open).await;
        f.remote
            .set_payload("srv-a", json!({"service": {"name": "billing", "suspended": "not_suspended"}}));

        let reply = f
            .dispatcher
            .handle_command(
                &operator(OWNER),
                Command::AddService {
                    service_id: Some("srv-a".into()),
                    name: None,
                },
            )
            .await;
        assert!(reply.text.contains("billing"));

        let stored = f.registry.get("srv-a").await.unwrap().unwrap();
        assert_eq!(stored.name, "billing");
        assert_eq!(stored.status, ServiceStatus::Active);
        assert!(stored.is_owned_by(OWNER));
    }

    #[tokio::test]
    async fn test_add_service_refuses_unknown_id() {
        let f = setup(Access::Open).await;
        let reply = f
            .dispatcher
            .handle_command(
                &operator(OWNER),
                Command::AddService {
                    service_id: Some("srv-nope".into()),
                    name: Some("x".into()),
                },
            )
            .await;
        assert!(reply.text.contains("No service"));
        assert!(f.registry.get("srv-nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_service_keeps_given_name_and_remote_status() {
        let f = setup(Access::Open).await;
        f.remote
            .set_payload("srv-b", json!({"name": "worker", "suspended": true}));

        let reply = f
            .dispatcher
            .handle_command(
                &operator(OWNER),
                Command::AddService {
                    service_id: Some("srv-b".into()),
                    name: Some("nightly".into()),
                },
            )
            .await;
        assert!(reply.text.contains("nightly"));

        let stored = f.registry.get("srv-b").await.unwrap().unwrap();
        assert_eq!(stored.name, "nightly");
        assert_eq!(stored.status, ServiceStatus::Suspended);
    }

    #[tokio::test]
    async fn test_add_service_refuses_empty_lookup() {
        let f = setup(Access::Open).await;
        f.remote.set_payload("srv-empty", json!({}));

        let reply = f
            .dispatcher
            .handle_command(
                &operator(OWNER),
                Command::AddService {
                    service_id: Some("srv-empty".into()),
                    name: None,
                },
            )
            .await;
        assert!(reply.text.contains("No service"));
        assert!(f.registry.get("srv-empty").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_service_without_id_shows_usage() {
        let f = setup(Access::Open).await;
        let reply = f
            .dispatcher
            .handle_command(
                &operator(OWNER),
                Command::AddService {
                    service_id: None,
                    name: None,
                },
            )
            .await;
        assert!(reply.text.contains("Usage"));
    }

    #[tokio::test]
    async fn test_manage_reconciles_before_rendering() {
        let f = setup(Access::Open).await;
        f.registry.seed("srv-a", "api", OWNER, ServiceStatus::Suspended).await;
        f.remote.with_status("srv-a", ServiceStatus::Active);

        let reply = f.dispatcher.handle_command(&operator(OWNER), Command::Manage).await;
        let rows = reply.keyboard.unwrap();
        assert_eq!(rows[0][0].text, "🟢 api");
        assert_eq!(rows[1][0].callback_data, "suspend_all");
    }

    #[tokio::test]
    async fn test_refresh_reports_count() {
        let f = setup(Access::Open).await;
        f.registry.seed("srv-a", "api", OWNER, ServiceStatus::Unknown).await;
        f.registry.seed("srv-b", "web", OWNER, ServiceStatus::Unknown).await;

        let reply = f.dispatcher.handle_command(&operator(OWNER), Command::Refresh).await;
        assert!(reply.text.contains("2 services refreshed"));

        let reply = f.dispatcher.handle_command(&operator(7), Command::Refresh).await;
        assert!(reply.text.contains("No services registered"));
    }

    #[tokio::test]
    async fn test_batch_callback_renders_summary() {
        let f = setup(Access::Open).await;
        f.registry.seed("srv-a", "api", OWNER, ServiceStatus::Unknown).await;
        f.registry.seed("srv-b", "web", OWNER, ServiceStatus::Unknown).await;
        f.remote.with_status("srv-a", ServiceStatus::Active);
        f.remote.with_status("srv-b", ServiceStatus::Suspended);

        let reply = f.dispatcher.handle_callback(&operator(OWNER), Callback::SuspendAll).await;
        assert!(reply
            .text
            .contains("Attempted: 1 | Succeeded: 1 | Failed: 0 | Skipped: 1"));
        let rows = reply.keyboard.unwrap();
        assert_eq!(rows[0][0].text, "🔴 api");
    }

    #[tokio::test]
    async fn test_view_shows_last_action() {
        let f = setup(Access::Open).await;
        f.registry.seed("srv-a", "api", OWNER, ServiceStatus::Unknown).await;
        f.remote.with_status("srv-a", ServiceStatus::Active);

        f.dispatcher
            .handle_callback(&operator(OWNER), Callback::Restart("srv-a".into()))
            .await;
        let reply = f
            .dispatcher
            .handle_callback(&operator(OWNER), Callback::View("srv-a".into()))
            .await;
        assert!(reply.text.contains("Active"));
        assert!(reply.text.contains("Last action: restart (ok)"));

        let logs = f.registry.logs_for("srv-a", 10).await.unwrap();
        assert_eq!(logs[0].action, Action::Restart);
    }

    #[tokio::test]
    async fn test_operations_on_unknown_service() {
        let f = setup(Access::Open).await;
        for callback in [
            Callback::View("srv-x".into()),
            Callback::Suspend("srv-x".into()),
            Callback::Resume("srv-x".into()),
        ] {
            let reply = f.dispatcher.handle_callback(&operator(OWNER), callback).await;
            assert!(reply.text.contains("not found"), "{}", reply.text);
        }
    }

    #[tokio::test]
    async fn test_remove_service_requires_ownership() {
        let f = setup(Access::Open).await;
        f.registry.seed("srv-a", "api", OWNER, ServiceStatus::Active).await;

        let remove = || Command::RemoveService {
            service_id: Some("srv-a".into()),
        };
        let reply = f.dispatcher.handle_command(&operator(7), remove()).await;
        assert!(reply.text.contains("not found"));
        assert!(f.registry.get("srv-a").await.unwrap().is_some());

        let reply = f.dispatcher.handle_command(&operator(OWNER), remove()).await;
        assert!(reply.text.contains("removed"));
        assert!(f.registry.get("srv-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persistence_failure_becomes_generic_notice() {
        let f = setup(Access::Open).await;
        f.registry.seed("srv-a", "api", OWNER, ServiceStatus::Active).await;
        f.remote.with_status("srv-a", ServiceStatus::Active);
        f.registry.fail_writes();

        let reply = f.dispatcher.handle_command(&operator(OWNER), Command::Manage).await;
        assert!(reply.text.contains("Something went wrong"));
    }
}
