use std::sync::Arc;

/// What happened to the appointment ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerChange {
    Booked,
    Cancelled,
}

impl LedgerChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerChange::Booked => "booked",
            LedgerChange::Cancelled => "cancelled",
        }
    }
}

/// Notified after a booking or cancellation commits.
///
/// Implementations must return quickly and must not fail the caller; any
/// slow follow-up work belongs on a background task.
pub trait LedgerObserver: Send + Sync {
    fn ledger_changed(&self, change: LedgerChange);
}

pub type SharedObserver = Arc<dyn LedgerObserver>;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LedgerObserver for NoopObserver {
    fn ledger_changed(&self, _change: LedgerChange) {}
}
