//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements        | Connects to               |
//! |------------|-------------------|---------------------------|
//! | `display`  | DisplayPort       | SSD1306 OLED / log output |
//! | `log_sink` | EventSink         | Serial log output         |
//! | `mqtt`     | BrokerPort        | Domoticz MQTT broker      |
//! | `nvs`      | ConfigPort        | NVS / in-memory store     |
//! |            | StoragePort       |                           |
//! | `ota`      | UpdatePort        | Firmware / options server |
//! | `time`     | —                 | Monotonic uptime clock    |
//! | `wifi`     | ConnectivityPort  | ESP-IDF WiFi STA          |

pub mod display;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod ota;
pub mod time;
pub mod wifi;
