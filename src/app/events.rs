//! Outbound application events.
//!
//! The [`DialService`](super::service::DialService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them — log to serial, forward to a
//! syslog server, etc.

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service has started.
    Started,

    /// A broker session was established (after subscribe + bulk resync).
    BrokerConnected,

    /// The broker session dropped; reconnection is rate-limited.
    BrokerLost,

    /// A command was published on behalf of the user.
    CommandPublished { topic: &'static str },

    /// An inbound status message mutated the registry at this index.
    StatusApplied { index: usize },
}
