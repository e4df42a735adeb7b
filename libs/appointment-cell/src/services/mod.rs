pub mod booking;
pub mod events;
pub mod lifecycle;
pub mod validation;

pub use booking::AppointmentBookingService;
pub use events::{LedgerChange, LedgerObserver, NoopObserver, SharedObserver};
pub use lifecycle::AppointmentLifecycleService;
