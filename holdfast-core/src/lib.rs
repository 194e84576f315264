pub mod clock;
pub mod notify;
pub mod payment;

pub use clock::{Clock, ManualClock, SystemClock};
pub use notify::{BroadcastNotifier, NoopNotifier, Notifier, OrderEvent, OrderEventKind};
pub use payment::PaymentOutcome;
