//! Event subscribers: the extension point for observability.
//!
//! Implement [`Subscribe`] to react to control-layer [`Event`](crate::events::Event)s
//! (logging, metrics, alerting). Subscribers are driven by dedicated workers
//! fed from bounded queues, so a slow subscriber never blocks a publisher or
//! its peers — it only drops its own events on overflow.
//!
//! [`LogWriter`] is a built-in subscriber that renders events as
//! human-readable lines.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
