//! Outbound command construction.
//!
//! Four fixed payload templates, selected by device kind:
//!
//! - `{"command":"switchlight","idx":IDX,"switchcmd":"On|Off"}` — switches,
//!   push-ons, and dimmers outside level edit.
//! - `{"command":"switchlight","idx":IDX,"switchcmd":"Set Level","level":N}`
//!   — N = 0 turns a dimmer off without changing its stored level; N > 0
//!   sets the level and turns the light on.  The same command serves
//!   selector switches (levels are multiples of 10).
//! - `{"command":"switchscene","idx":IDX,"switchcmd":"On|Off"}` — scenes
//!   (On only) and groups (both).
//! - `{"idx":IDX,"nvalue":0}` — self-report for the reserved push-off,
//!   published to the status topic.

use core::fmt::Write as _;

use log::{debug, warn};

use super::{COMMAND_TOPIC, OutboundMessage, STATUS_TOPIC};
use crate::model::catalog::PUSH_OFF_SELF_REPORT_IDX;
use crate::model::{Device, DeviceKind, Registry, Status};

/// Build the command for a user intent on the device at `index`.
///
/// `value` is On/Off truthiness for switch-style kinds and the raw level
/// (0–100) when `as_level` is set.  Returns `None` for kind/mode
/// combinations that have no valid template; nothing is published then.
pub fn build_command(
    reg: &Registry,
    index: usize,
    value: i32,
    as_level: bool,
) -> Option<OutboundMessage> {
    let dev = reg.get(index)?;

    // Domoticz does not echo a status update for this trigger after a
    // command, so self-report completion on the status topic instead.
    if dev.kind() == DeviceKind::PushOff && dev.idx() == PUSH_OFF_SELF_REPORT_IDX {
        return message(STATUS_TOPIC, |p| {
            write!(p, r#"{{"idx":{},"nvalue":0}}"#, dev.idx())
        });
    }

    match dev.kind() {
        DeviceKind::Toggle => switchlight_onoff(dev, value),
        DeviceKind::Dimmer if !as_level => switchlight_onoff(dev, value),
        DeviceKind::Dimmer | DeviceKind::Selector if as_level => message(COMMAND_TOPIC, |p| {
            write!(
                p,
                r#"{{"command":"switchlight","idx":{},"switchcmd":"Set Level","level":{}}}"#,
                dev.idx(),
                value
            )
        }),
        DeviceKind::Scene if value != 0 => message(COMMAND_TOPIC, |p| {
            write!(
                p,
                r#"{{"command":"switchscene","idx":{},"switchcmd":"On"}}"#,
                dev.idx()
            )
        }),
        DeviceKind::Group => message(COMMAND_TOPIC, |p| {
            write!(
                p,
                r#"{{"command":"switchscene","idx":{},"switchcmd":"{}"}}"#,
                dev.idx(),
                onoff(value)
            )
        }),
        kind => {
            warn!(
                "no outbound template for {} '{}' (value {value}, as_level {as_level})",
                kind.label(),
                dev.name()
            );
            None
        }
    }
}

/// Toggle the device at `index` based on its mirrored status.
///
/// Off (or mixed) turns on; anything on turns off.  Push-offs only ever
/// send off, scenes only ever fire on.  Contacts and selectors cannot be
/// toggled from the browse view.
pub fn build_toggle(reg: &Registry, index: usize) -> Option<OutboundMessage> {
    let dev = reg.get(index)?;
    let value = match dev.kind() {
        DeviceKind::Toggle | DeviceKind::Dimmer | DeviceKind::Group => {
            i32::from(dev.status() == Status::Off)
        }
        DeviceKind::PushOff => 0,
        DeviceKind::Scene => 1,
        DeviceKind::Contact | DeviceKind::Selector => {
            debug!("cannot toggle {} '{}'", dev.kind().label(), dev.name());
            return None;
        }
    };
    build_command(reg, index, value, false)
}

/// Bulk status-refresh commands, published once after (re)connecting:
/// `getdeviceinfo` per status-bearing device, `getsceneinfo` per group.
pub fn resync_messages(
    reg: &Registry,
) -> heapless::Vec<OutboundMessage, { crate::model::MAX_DEVICES }> {
    let mut msgs = heapless::Vec::new();
    for dev in reg.iter() {
        if !dev.kind().has_status() {
            continue;
        }
        let what = if dev.kind() == DeviceKind::Group {
            "scene"
        } else {
            "device"
        };
        let msg = message(COMMAND_TOPIC, |p| {
            write!(p, r#"{{"command":"get{}info","idx":{}}}"#, what, dev.idx())
        });
        if let Some(msg) = msg {
            // Capacity matches the registry, push cannot fail.
            let _ = msgs.push(msg);
        }
    }
    msgs
}

// ---------------------------------------------------------------------------
// Internal
// ---------------------------------------------------------------------------

const fn onoff(value: i32) -> &'static str {
    if value != 0 { "On" } else { "Off" }
}

fn switchlight_onoff(dev: &Device, value: i32) -> Option<OutboundMessage> {
    message(COMMAND_TOPIC, |p| {
        write!(
            p,
            r#"{{"command":"switchlight","idx":{},"switchcmd":"{}"}}"#,
            dev.idx(),
            onoff(value)
        )
    })
}

/// Render a payload into a fixed-capacity buffer.  Overflow cannot happen
/// with the templates above, but is absorbed as `None` rather than a panic.
fn message(
    topic: &'static str,
    render: impl FnOnce(&mut heapless::String<{ super::MSG_SZ }>) -> core::fmt::Result,
) -> Option<OutboundMessage> {
    let mut payload = heapless::String::new();
    match render(&mut payload) {
        Ok(()) => Some(OutboundMessage { topic, payload }),
        Err(_) => {
            debug_assert!(false, "outbound payload exceeded MSG_SZ");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog;

    fn registry() -> Registry {
        catalog::build_registry()
    }

    #[test]
    fn toggle_payload_shape_is_exact() {
        let reg = registry();
        let msg = build_command(&reg, 0, 1, false).unwrap();
        assert_eq!(msg.topic, COMMAND_TOPIC);
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchlight","idx":5,"switchcmd":"On"}"#
        );
        let msg = build_command(&reg, 0, 0, false).unwrap();
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchlight","idx":5,"switchcmd":"Off"}"#
        );
    }

    #[test]
    fn dimmer_level_payload_shape_is_exact() {
        let reg = registry();
        // Index 9 = dining room dimmer, idx 89.
        let msg = build_command(&reg, 9, 70, true).unwrap();
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchlight","idx":89,"switchcmd":"Set Level","level":70}"#
        );
    }

    #[test]
    fn dimmer_without_level_edit_is_plain_onoff() {
        let reg = registry();
        let msg = build_command(&reg, 9, 1, false).unwrap();
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchlight","idx":89,"switchcmd":"On"}"#
        );
    }

    #[test]
    fn selector_level_edit_uses_set_level() {
        let reg = registry();
        // Index 15 = garage auto-close selector, idx 37.
        let msg = build_command(&reg, 15, 10, true).unwrap();
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchlight","idx":37,"switchcmd":"Set Level","level":10}"#
        );
    }

    #[test]
    fn selector_outside_level_edit_is_refused() {
        let reg = registry();
        assert_eq!(build_command(&reg, 15, 1, false), None);
    }

    #[test]
    fn contact_is_always_refused() {
        let reg = registry();
        for (value, as_level) in [(0, false), (1, false), (50, true)] {
            assert_eq!(build_command(&reg, 16, value, as_level), None);
        }
    }

    #[test]
    fn scene_fires_on_only() {
        let reg = registry();
        let msg = build_command(&reg, 3, 1, false).unwrap();
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchscene","idx":7,"switchcmd":"On"}"#
        );
        assert_eq!(build_command(&reg, 3, 0, false), None);
    }

    #[test]
    fn group_uses_scene_command_both_ways() {
        let reg = registry();
        let msg = build_command(&reg, 2, 0, false).unwrap();
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchscene","idx":5,"switchcmd":"Off"}"#
        );
    }

    #[test]
    fn reserved_push_off_self_reports_on_status_topic() {
        let reg = registry();
        let msg = build_toggle(&reg, 17).unwrap();
        assert_eq!(msg.topic, STATUS_TOPIC);
        assert_eq!(msg.payload.as_str(), r#"{"idx":28,"nvalue":0}"#);
    }

    #[test]
    fn toggle_inverts_mirrored_status() {
        let mut reg = registry();
        let msg = build_toggle(&reg, 0).unwrap();
        assert!(msg.payload.as_str().contains(r#""switchcmd":"On""#));
        reg.set_status(0, Status::On, 0);
        let msg = build_toggle(&reg, 0).unwrap();
        assert!(msg.payload.as_str().contains(r#""switchcmd":"Off""#));
        // Mixed groups also turn off.
        reg.set_status(2, Status::Mixed, 0);
        let msg = build_toggle(&reg, 2).unwrap();
        assert!(msg.payload.as_str().contains(r#""switchcmd":"Off""#));
    }

    #[test]
    fn resync_covers_status_bearing_devices_only() {
        let reg = registry();
        let msgs = resync_messages(&reg);
        let with_status = reg.iter().filter(|d| d.kind().has_status()).count();
        assert_eq!(msgs.len(), with_status);
        assert!(
            msgs.iter()
                .any(|m| m.payload.as_str() == r#"{"command":"getsceneinfo","idx":5}"#)
        );
        assert!(
            msgs.iter()
                .any(|m| m.payload.as_str() == r#"{"command":"getdeviceinfo","idx":29}"#)
        );
        // Scenes and push-offs are skipped.
        assert!(!msgs.iter().any(|m| m.payload.as_str().contains(r#""idx":28"#)));
    }
}
