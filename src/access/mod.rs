//! Operator allow-list.

use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Everyone may operate the bot.
    Open,
    /// Only the listed operator ids may.
    Restricted(HashSet<i64>),
}

impl Access {
    /// Builds the policy from configured admin ids. An empty list opens access.
    pub fn from_admins(admins: &[i64]) -> Self {
        if admins.is_empty() {
            warn!(
                component = "access",
                event = "open",
                "no admin ids configured, every user may operate the bot"
            );
            return Access::Open;
        }
        Access::Restricted(admins.iter().copied().collect())
    }

    pub fn is_allowed(&self, user_id: i64) -> bool {
        match self {
            Access::Open => true,
            Access::Restricted(ids) => ids.contains(&user_id),
        }
    }
}
