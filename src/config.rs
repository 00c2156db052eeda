//! System configuration parameters
//!
//! All tunable parameters for the dial. Values can be overridden via NVS
//! or the remote options document fetched from the configuration menu.

use serde::{Deserialize, Serialize};

/// Sentinel for "no default device configured".
pub const NO_DEFAULT_DEVICE: u16 = u16::MAX;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// Hostname used for the Wi-Fi and broker connections.
    pub hostname: heapless::String<32>,

    // --- MQTT broker ---
    pub mqtt_host: heapless::String<64>,
    pub mqtt_port: u16,
    pub mqtt_user: heapless::String<32>,
    pub mqtt_pswd: heapless::String<64>,
    /// Inbound message buffer size in bytes.
    pub mqtt_buffer_size: u16,
    /// Minimum interval between broker connection attempts (milliseconds).
    pub mqtt_retry_ms: u32,

    // --- Update server ---
    /// Base URL for firmware and options downloads.
    pub ota_url: heapless::String<96>,

    // --- Display / interaction ---
    /// Inactivity before the display blanks (milliseconds).
    pub display_timeout_ms: u32,
    /// Alert flash half-period while blanked (milliseconds).
    pub alert_period_ms: u32,
    /// Dwell time for info screens (milliseconds).
    pub info_time_ms: u32,

    // --- Derived state ---
    /// Group aggregation interval (milliseconds).
    pub group_refresh_ms: u32,

    // --- Default device ---
    /// Registry index shown after waking from blank;
    /// [`NO_DEFAULT_DEVICE`] keeps the pre-blank selection.
    pub default_device: u16,
    /// Whether a single click while blanked also toggles the default device.
    pub default_active: bool,

    // --- Timing ---
    /// Event-loop pacing on simulation targets (milliseconds).
    pub loop_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            hostname: str_into("DomoDial-1"),

            mqtt_host: str_into("192.168.1.11"),
            mqtt_port: 1883,
            mqtt_user: heapless::String::new(),
            mqtt_pswd: heapless::String::new(),
            mqtt_buffer_size: 768,
            mqtt_retry_ms: 60_000,

            ota_url: str_into("http://192.168.1.11:8086/domodial"),

            display_timeout_ms: 15_000,
            alert_period_ms: 3_000,
            info_time_ms: 3_000,

            group_refresh_ms: 10_000,

            default_device: NO_DEFAULT_DEVICE,
            default_active: false,

            loop_interval_ms: 50, // 20 Hz
        }
    }
}

fn str_into<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    debug_assert!(s.len() <= N);
    let _ = out.push_str(s);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(!c.hostname.is_empty());
        assert!(!c.mqtt_host.is_empty());
        assert!(c.mqtt_port > 0);
        assert!(c.mqtt_retry_ms >= 1_000, "retry must never tight-loop");
        assert!(c.display_timeout_ms > 0);
        assert!(c.alert_period_ms > 0);
        assert!(c.group_refresh_ms > 0);
        assert!(c.loop_interval_ms > 0);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.hostname, c2.hostname);
        assert_eq!(c.mqtt_port, c2.mqtt_port);
        assert_eq!(c.display_timeout_ms, c2.display_timeout_ms);
        assert_eq!(c.default_device, c2.default_device);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = SystemConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c.mqtt_host, c2.mqtt_host);
        assert_eq!(c.mqtt_retry_ms, c2.mqtt_retry_ms);
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = SystemConfig::default();
        assert!(
            c.loop_interval_ms < c.alert_period_ms,
            "loop must tick faster than the alert flash"
        );
        assert!(
            c.alert_period_ms < c.display_timeout_ms,
            "alerts flash faster than the display blanks"
        );
    }
}
