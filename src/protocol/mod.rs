//! Bidirectional translation between the device model and the Domoticz
//! MQTT wire protocol.
//!
//! Inbound: loosely-typed JSON status documents on `domoticz/out` become
//! registry mutations ([`inbound::apply_inbound`]).  Outbound: user intents
//! become fixed-template command payloads on `domoticz/in`
//! ([`outbound::build_command`]).

pub mod inbound;
pub mod outbound;

/// Topic Domoticz publishes status updates on (case sensitive).
pub const STATUS_TOPIC: &str = "domoticz/out";
/// Topic Domoticz accepts commands on (case sensitive).
pub const COMMAND_TOPIC: &str = "domoticz/in";

/// Maximum outbound payload length.
pub const MSG_SZ: usize = 160;

/// A ready-to-publish MQTT message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: &'static str,
    pub payload: heapless::String<MSG_SZ>,
}
