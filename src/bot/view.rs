//! Reply rendering. Text uses Telegram HTML parse mode.

use serde::Serialize;

use crate::batch::OpOutcome;
use crate::bot::command::Callback;
use crate::model::{Action, AuditLogEntry, BatchAction, BatchTally, ServiceRecord, ServiceStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

impl Button {
    fn new(text: impl Into<String>, callback: Callback) -> Self {
        Self {
            text: text.into(),
            callback_data: callback.to_string(),
        }
    }
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<Button>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }
}

/// Escapes user supplied text for HTML parse mode.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

pub fn welcome(first_name: &str) -> Reply {
    Reply::text(format!(
        "👋 Hello {}!\n\n\
         I manage Render services: suspend, resume and restart them with one tap.\n\n\
         <b>Commands:</b>\n\
         /manage - list your services\n\
         /add_service - register a service\n\
         /remove_service - unregister a service\n\
         /refresh - refresh statuses",
        escape(first_name)
    ))
}

pub fn unauthorized() -> Reply {
    Reply::text("⛔ You are not allowed to use this bot.")
}

pub fn empty_registry() -> Reply {
    Reply::text("📭 No services registered.\nUse /add_service to add one.")
}

pub fn add_service_usage() -> Reply {
    Reply::text(
        "📝 Usage:\n<code>/add_service &lt;service_id&gt; [name]</code>\n\n\
         Example:\n<code>/add_service srv-abc123xyz MyBot</code>",
    )
}

pub fn remove_service_usage() -> Reply {
    Reply::text("📝 Usage:\n<code>/remove_service &lt;service_id&gt;</code>")
}

pub fn unknown_command(name: &str) -> Reply {
    Reply::text(format!("🤷 Unknown command /{}. Try /start.", escape(name)))
}

pub fn not_found(service_id: &str) -> Reply {
    Reply::text(format!("❌ Service <code>{}</code> not found.", escape(service_id)))
}

pub fn remote_not_found(service_id: &str) -> Reply {
    Reply::text(format!(
        "❌ No service with id <code>{}</code>.\nCheck the id and the API key permissions.",
        escape(service_id)
    ))
}

pub fn service_added(service_id: &str, name: &str) -> Reply {
    Reply::text(format!(
        "✅ Service <b>{}</b> added.\n🆔 <code>{}</code>",
        escape(name),
        escape(service_id)
    ))
}

pub fn service_removed(service_id: &str) -> Reply {
    Reply::text(format!("🗑 Service <code>{}</code> removed.", escape(service_id)))
}

pub fn refreshed(count: usize) -> Reply {
    Reply::text(format!("✅ {} services refreshed.", count))
}

pub fn internal_error() -> Reply {
    Reply::text("⚠️ Something went wrong, please try again later.")
}

pub fn unknown_action() -> Reply {
    Reply::text("🤷 Unknown action.")
}

/// Notice shown while a callback operation is running.
pub fn progress(callback: &Callback) -> Option<&'static str> {
    let text = match callback {
        Callback::SuspendAll => "⏳ Suspending all services...",
        Callback::ResumeAll => "⏳ Resuming all services...",
        Callback::Suspend(_) => "⏳ Suspending service...",
        Callback::Resume(_) => "⏳ Resuming service...",
        Callback::Restart(_) => "⏳ Restarting service...",
        Callback::Refresh | Callback::Back | Callback::View(_) => return None,
    };
    Some(text)
}

/// Service list with bulk action buttons. Expects reconciled records.
pub fn manage(services: &[ServiceRecord]) -> Reply {
    if services.is_empty() {
        return empty_registry();
    }

    let mut keyboard: Keyboard = services
        .iter()
        .map(|s| {
            vec![Button::new(
                format!("{} {}", s.status.emoji(), s.name),
                Callback::View(s.service_id.clone()),
            )]
        })
        .collect();

    if services.iter().any(|s| s.status == ServiceStatus::Active) {
        keyboard.push(vec![Button::new("⏸ Suspend all", Callback::SuspendAll)]);
    }
    if services.iter().any(|s| s.status == ServiceStatus::Suspended) {
        keyboard.push(vec![Button::new("▶️ Resume all", Callback::ResumeAll)]);
    }
    keyboard.push(vec![Button::new("🔄 Refresh", Callback::Refresh)]);

    Reply {
        text: "🎛 <b>Pick a service:</b>".to_string(),
        keyboard: Some(keyboard),
    }
}

pub fn service(service: &ServiceRecord, last: Option<&AuditLogEntry>) -> Reply {
    let mut text = format!(
        "🤖 <b>{}</b>\n🆔 <code>{}</code>\n📊 Status: {} {}\n",
        escape(&service.name),
        escape(&service.service_id),
        service.status.emoji(),
        service.status.label()
    );
    if let Some(entry) = last {
        let outcome = if entry.succeeded { "ok" } else { "failed" };
        text.push_str(&format!(
            "🕓 Last action: {} ({}) at {}\n",
            entry.action,
            outcome,
            entry.timestamp.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    text.push_str("\nPick an action:");

    let id = service.service_id.clone();
    let toggle = if service.status == ServiceStatus::Suspended {
        Button::new("▶️ Resume", Callback::Resume(id.clone()))
    } else {
        Button::new("⏸ Suspend", Callback::Suspend(id.clone()))
    };

    Reply {
        text,
        keyboard: Some(vec![
            vec![toggle],
            vec![Button::new("🔄 Restart", Callback::Restart(id))],
            vec![Button::new("◀️ Back", Callback::Back)],
        ]),
    }
}

/// Summary line above a fresh manage view.
pub fn batch_result(action: BatchAction, tally: &BatchTally, services: &[ServiceRecord]) -> Reply {
    let verb = match action {
        BatchAction::SuspendAll => "Suspend all",
        BatchAction::ResumeAll => "Resume all",
    };
    let summary = format!(
        "✅ {} done.\nAttempted: {} | Succeeded: {} | Failed: {} | Skipped: {}\n\n",
        verb, tally.attempted, tally.succeeded, tally.failed, tally.skipped
    );

    let mut reply = manage(services);
    reply.text = summary + &reply.text;
    reply
}

pub fn op_result(outcome: &OpOutcome) -> Reply {
    let name = escape(&outcome.service.name);
    let text = match (outcome.action, outcome.succeeded) {
        (Action::Suspend, true) => format!("✅ Service <b>{}</b> suspended.", name),
        (Action::Resume, true) => format!("✅ Service <b>{}</b> is running again.", name),
        (Action::Restart, true) => format!("✅ Service <b>{}</b> restarted.", name),
        (Action::Suspend, false) => format!("❌ Failed to suspend <b>{}</b>.", name),
        (Action::Resume, false) => format!("❌ Failed to resume <b>{}</b>.", name),
        (Action::Restart, false) => format!("❌ Failed to restart <b>{}</b>.", name),
    };

    Reply {
        text,
        keyboard: Some(vec![vec![Button::new(
            "◀️ Back",
            Callback::View(outcome.service.service_id.clone()),
        )]]),
    }
}
