//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production).  A future syslog adapter
//! would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | service up");
            }
            AppEvent::BrokerConnected => {
                info!("MQTT  | connected, mirror resync requested");
            }
            AppEvent::BrokerLost => {
                warn!("MQTT  | session lost, rate-limited reconnect");
            }
            AppEvent::CommandPublished { topic } => {
                info!("CMD   | published on {topic}");
            }
            AppEvent::StatusApplied { index } => {
                info!("STATUS| applied for device {index}");
            }
        }
    }
}
