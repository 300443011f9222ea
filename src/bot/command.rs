//! Chat commands and inline keyboard callbacks.

use std::fmt;
use std::str::FromStr;

/// A text command sent by an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Manage,
    /// `/add_service <id> [name]`; a missing id renders the usage hint.
    AddService {
        service_id: Option<String>,
        name: Option<String>,
    },
    Refresh,
    RemoveService {
        service_id: Option<String>,
    },
    Unknown(String),
}

impl Command {
    /// Parses a message text. `None` when the text is not a command.
    ///
    /// Accepts the `/cmd@botname` form used in group chats.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;

        let mut parts = rest.split_whitespace();
        let head = parts.next()?;
        let name = head.split('@').next().unwrap_or(head);
        let args: Vec<&str> = parts.collect();

        let command = match name {
            "start" => Command::Start,
            "manage" => Command::Manage,
            "refresh" => Command::Refresh,
            "add_service" => Command::AddService {
                service_id: args.first().map(|id| id.to_string()),
                name: (args.len() > 1).then(|| args[1..].join(" ")),
            },
            "remove_service" => Command::RemoveService {
                service_id: args.first().map(|id| id.to_string()),
            },
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Inline keyboard callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Refresh,
    Back,
    SuspendAll,
    ResumeAll,
    View(String),
    Suspend(String),
    Resume(String),
    Restart(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unrecognized callback data {0:?}")]
pub struct UnknownCallback(pub String);

impl FromStr for Callback {
    type Err = UnknownCallback;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        // Exact matches first: "suspend_all" would otherwise read as service "all".
        match data {
            "refresh" => return Ok(Callback::Refresh),
            "back" => return Ok(Callback::Back),
            "suspend_all" => return Ok(Callback::SuspendAll),
            "resume_all" => return Ok(Callback::ResumeAll),
            _ => {}
        }

        let (kind, service_id) = data
            .split_once('_')
            .filter(|(_, id)| !id.is_empty())
            .ok_or_else(|| UnknownCallback(data.to_string()))?;
        let service_id = service_id.to_string();

        match kind {
            "view" => Ok(Callback::View(service_id)),
            "suspend" => Ok(Callback::Suspend(service_id)),
            "resume" => Ok(Callback::Resume(service_id)),
            "restart" => Ok(Callback::Restart(service_id)),
            _ => Err(UnknownCallback(data.to_string())),
        }
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Refresh => f.write_str("refresh"),
            Callback::Back => f.write_str("back"),
            Callback::SuspendAll => f.write_str("suspend_all"),
            Callback::ResumeAll => f.write_str("resume_all"),
            Callback::View(id) => write!(f, "view_{}", id),
            Callback::Suspend(id) => write!(f, "suspend_{}", id),
            Callback::Resume(id) => write!(f, "resume_{}", id),
            Callback::Restart(id) => write!(f, "restart_{}", id),
        }
    }
}
