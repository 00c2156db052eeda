//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DialService (domain)
//! ```
//!
//! Driven adapters (broker session, display panel, encoder, storage)
//! implement these traits.  The [`DialService`](super::service::DialService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::ui::render::Screen;

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: domain ↔ MQTT session)
// ───────────────────────────────────────────────────────────────

/// MQTT session boundary.
///
/// The adapter owns the TCP/TLS session and its inbound queue; the domain
/// decides *when* to connect (rate-limited), what to subscribe to, and
/// what to publish.
pub trait BrokerPort {
    /// Whether a broker session is currently established.
    fn is_connected(&self) -> bool;

    /// Attempt to establish a session.  Called no more often than the
    /// configured minimum retry interval.
    fn connect(&mut self) -> Result<(), CommsError>;

    /// Subscribe to a topic on the established session.
    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    /// Publish one payload.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError>;

    /// Hand every queued inbound `(topic, payload)` to the handler, FIFO.
    fn drain_inbound(&mut self, handler: &mut dyn FnMut(&str, &str));
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → panel)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the OLED panel.  Rendering pixels, fonts, and the
/// alert highlight bar are the adapter's business.
pub trait DisplayPort {
    /// Paint three lines, waking the panel if it was off.  `screen.alert`
    /// highlights the bottom row.
    fn show(&mut self, screen: &Screen);

    /// Turn the panel off (blanked mode, alert flash gap).
    fn screen_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Rotary port (domain → encoder driver)
// ───────────────────────────────────────────────────────────────

/// The UI machine pushes each mode's rotation bounds down to the encoder
/// so positions arrive pre-clamped, the way the hardware knob behaves.
pub trait RotaryPort {
    /// Valid positions become `0..=max`.
    fn set_limits(&mut self, max: i32);

    /// Move the driver's notion of the current position.
    fn set_position(&mut self, position: i32);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for config blobs and credentials.
///
/// Keys are namespaced to prevent collisions between subsystems; write
/// operations MUST be atomic — no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Update port (driven adapter: domain → OTA / remote options)
// ───────────────────────────────────────────────────────────────

/// Firmware refresh and remote options download for the configuration
/// menu.  The transfer transport is out of scope; the menu only needs
/// success/failure to decide between restarting and showing an error.
pub trait UpdatePort {
    /// Download and stage a new firmware image.  `true` when a restart
    /// will boot the new image.
    fn fetch_firmware(&mut self) -> bool;

    /// Download the remote options document into persistent storage.
    fn fetch_options(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// syslog, ...).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
