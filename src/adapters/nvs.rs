//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`].  The configuration
//! lives as one postcard blob under the `domodial` namespace; blob
//! integrity comes from postcard's strict decoding rather than the
//! hand-rolled magic/checksum scheme older revisions carried.
//!
//! Config validation: all fields are range-checked before persistence.
//! Invalid ranges are rejected, not silently clamped — a bad remote
//! options document must not be able to set a zero reconnect interval.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;
#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs};

const CONFIG_NAMESPACE: &str = "domodial";
const CONFIG_KEY: &str = "syscfg";
const CONFIG_BLOB_MAX: usize = 512;

pub struct NvsAdapter {
    #[cfg(target_os = "espidf")]
    partition: EspDefaultNvsPartition,
    #[cfg(not(target_os = "espidf"))]
    store: RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create the adapter and initialise the NVS flash partition.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            let partition =
                EspDefaultNvsPartition::take().map_err(|_| ConfigError::IoError)?;
            info!("NvsAdapter: ESP-IDF NVS initialised");
            Ok(Self { partition })
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("NvsAdapter: simulation backend");
            Ok(Self {
                store: RefCell::new(HashMap::new()),
            })
        }
    }

    /// Erase the stored configuration blob (restore-defaults menu entry).
    pub fn clear_config(&mut self) {
        if let Err(e) = self.delete(CONFIG_NAMESPACE, CONFIG_KEY) {
            warn!("NVS: clearing config failed: {e}");
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

// ───────────────────────────────────────────────────────────────
// Config validation
// ───────────────────────────────────────────────────────────────

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if cfg.hostname.is_empty() {
        return Err(ConfigError::ValidationFailed("hostname must not be empty"));
    }
    if cfg.mqtt_host.is_empty() {
        return Err(ConfigError::ValidationFailed("mqtt_host must not be empty"));
    }
    if cfg.mqtt_port == 0 {
        return Err(ConfigError::ValidationFailed("mqtt_port must be non-zero"));
    }
    if cfg.mqtt_buffer_size < 256 {
        return Err(ConfigError::ValidationFailed(
            "mqtt_buffer_size must be at least 256",
        ));
    }
    if !(1_000..=3_600_000).contains(&cfg.mqtt_retry_ms) {
        return Err(ConfigError::ValidationFailed(
            "mqtt_retry_ms must be 1s–1h (never a tight loop)",
        ));
    }
    if !(1_000..=600_000).contains(&cfg.display_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "display_timeout_ms must be 1s–10min",
        ));
    }
    if !(250..=60_000).contains(&cfg.alert_period_ms) {
        return Err(ConfigError::ValidationFailed(
            "alert_period_ms must be 250ms–60s",
        ));
    }
    if !(1_000..=600_000).contains(&cfg.group_refresh_ms) {
        return Err(ConfigError::ValidationFailed(
            "group_refresh_ms must be 1s–10min",
        ));
    }
    if !(10..=1_000).contains(&cfg.loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "loop_interval_ms must be 10ms–1s",
        ));
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// ConfigPort
// ───────────────────────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; CONFIG_BLOB_MAX];
        let len = match self.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("NVS: no stored config, using defaults");
                return Ok(SystemConfig::default());
            }
            Err(_) => return Err(ConfigError::IoError),
        };
        postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > CONFIG_BLOB_MAX {
            return Err(ConfigError::StorageFull);
        }
        // StoragePort::write takes &mut; config saves go through the same
        // backend with interior mutability on the host and a fresh handle
        // on target.
        #[cfg(target_os = "espidf")]
        {
            let mut nvs = EspNvs::new(self.partition.clone(), CONFIG_NAMESPACE, true)
                .map_err(|_| ConfigError::IoError)?;
            nvs.set_raw(CONFIG_KEY, &bytes)
                .map_err(|_| ConfigError::IoError)?;
        }
        #[cfg(not(target_os = "espidf"))]
        self.store
            .borrow_mut()
            .insert(Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY), bytes);
        info!("NVS: config saved");
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// StoragePort
// ───────────────────────────────────────────────────────────────

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            let nvs = EspNvs::new(self.partition.clone(), namespace, false)
                .map_err(|_| StorageError::IoError)?;
            match nvs.get_raw(key, buf) {
                Ok(Some(data)) => Ok(data.len()),
                Ok(None) => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }

        #[cfg(not(target_os = "espidf"))]
        match self.store.borrow().get(&Self::composite_key(namespace, key)) {
            Some(v) => {
                let len = v.len().min(buf.len());
                buf[..len].copy_from_slice(&v[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(target_os = "espidf")]
        {
            let mut nvs = EspNvs::new(self.partition.clone(), namespace, true)
                .map_err(|_| StorageError::IoError)?;
            nvs.set_raw(key, data).map_err(|_| StorageError::IoError)?;
            Ok(())
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(Self::composite_key(namespace, key), data.to_vec());
            Ok(())
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(target_os = "espidf")]
        {
            let mut nvs = EspNvs::new(self.partition.clone(), namespace, true)
                .map_err(|_| StorageError::IoError)?;
            let _ = nvs.remove(key).map_err(|_| StorageError::IoError)?;
            Ok(())
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .remove(&Self::composite_key(namespace, key));
            Ok(())
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(target_os = "espidf")]
        {
            EspNvs::new(self.partition.clone(), namespace, false)
                .and_then(|nvs| nvs.contains(key))
                .unwrap_or(false)
        }

        #[cfg(not(target_os = "espidf"))]
        self.store
            .borrow()
            .contains_key(&Self::composite_key(namespace, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_without_store_yields_defaults() {
        let nvs = NvsAdapter::new().unwrap();
        let cfg = nvs.load().unwrap();
        assert_eq!(cfg.mqtt_port, SystemConfig::default().mqtt_port);
    }

    #[test]
    fn save_load_roundtrip() {
        let nvs = NvsAdapter::new().unwrap();
        let mut cfg = SystemConfig::default();
        cfg.display_timeout_ms = 30_000;
        cfg.default_device = 6;
        nvs.save(&cfg).unwrap();
        let loaded = nvs.load().unwrap();
        assert_eq!(loaded.display_timeout_ms, 30_000);
        assert_eq!(loaded.default_device, 6);
    }

    #[test]
    fn save_rejects_tight_retry_loop() {
        let nvs = NvsAdapter::new().unwrap();
        let mut cfg = SystemConfig::default();
        cfg.mqtt_retry_ms = 10;
        assert!(matches!(
            nvs.save(&cfg),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn save_rejects_empty_hostname() {
        let nvs = NvsAdapter::new().unwrap();
        let mut cfg = SystemConfig::default();
        cfg.hostname = heapless::String::new();
        assert!(matches!(
            nvs.save(&cfg),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn clear_config_restores_defaults_on_next_load() {
        let mut nvs = NvsAdapter::new().unwrap();
        let mut cfg = SystemConfig::default();
        cfg.default_active = true;
        nvs.save(&cfg).unwrap();
        nvs.clear_config();
        assert!(!nvs.load().unwrap().default_active);
    }

    #[test]
    fn storage_roundtrip_and_delete() {
        let mut nvs = NvsAdapter::new().unwrap();
        nvs.write("auth", "token", b"abc").unwrap();
        assert!(nvs.exists("auth", "token"));
        let mut buf = [0u8; 8];
        assert_eq!(nvs.read("auth", "token", &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        nvs.delete("auth", "token").unwrap();
        assert!(!nvs.exists("auth", "token"));
        assert!(matches!(
            nvs.read("auth", "token", &mut buf),
            Err(StorageError::NotFound)
        ));
    }
}
