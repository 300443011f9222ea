//! Bulk actions and their aggregate outcome.

use super::{Action, ServiceStatus};

/// Bulk action requested for every service of an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchAction {
    SuspendAll,
    ResumeAll,
}

impl BatchAction {
    /// Only services in a known precondition state are eligible.
    pub fn is_eligible(self, status: ServiceStatus) -> bool {
        match self {
            BatchAction::SuspendAll => status == ServiceStatus::Active,
            BatchAction::ResumeAll => status == ServiceStatus::Suspended,
        }
    }

    /// Per-service operation performed for eligible services.
    pub fn action(self) -> Action {
        match self {
            BatchAction::SuspendAll => Action::Suspend,
            BatchAction::ResumeAll => Action::Resume,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BatchAction::SuspendAll => "suspend_all",
            BatchAction::ResumeAll => "resume_all",
        }
    }
}

/// Outcome counters of one batch run.
///
/// Updated through [`BatchTally::skip`] and [`BatchTally::record`] so that
/// `attempted == succeeded + failed` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchTally {
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn record(&mut self, succeeded: bool) {
        self.attempted += 1;
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Number of services considered by the run.
    pub fn total(&self) -> usize {
        self.attempted + self.skipped
    }
}
