//! Inbound status-message handling.
//!
//! Domoticz publishes loosely-typed JSON documents on the status topic.
//! Each recognised message resolves to exactly one registry mutation; every
//! failure mode has a named outcome and drops the message without touching
//! the registry.
//!
//! Recognised keys:
//!
//! | Key                  | Type              | Applies to            |
//! |----------------------|-------------------|-----------------------|
//! | `idx`                | positive integer  | all (required)        |
//! | `switchType` / `Type`| string            | all (required)        |
//! | `nvalue`             | integer           | switch/dimmer/contact |
//! | `Level`              | integer 0–100     | dimmer                |
//! | `svalue1`            | string-encoded int| selector (/ 10)       |
//! | `Status`             | "On"/"Mixed"/other| group                 |
//! | `name` / `Name`      | string            | diagnostics only      |

use log::debug;
use serde_json::Value;

use crate::model::selectors::SelectorTable;
use crate::model::{DeviceKind, Registry, Status};

/// Outcome of applying one inbound status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// The registry was mutated at this index.
    Applied { index: usize },
    /// Payload was not valid JSON.
    Malformed,
    /// `idx` absent or zero.
    MissingId,
    /// Device-kind discriminator absent or not in the mapping table.
    UnknownKind,
    /// `(kind, idx)` not present in the registry.
    Unresolved,
}

/// Parse and apply one status document.  Never mutates the registry on any
/// outcome other than `Applied`.
pub fn apply_inbound(
    reg: &mut Registry,
    selectors: &SelectorTable,
    payload: &str,
) -> Inbound {
    let doc: Value = match serde_json::from_str(payload) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("inbound JSON rejected: {e}");
            return Inbound::Malformed;
        }
    };

    let idx = match field_u64(&doc, "idx") {
        Some(idx) if idx > 0 => idx as u32,
        _ => {
            debug!("idx not found in status message");
            return Inbound::MissingId;
        }
    };

    let kind_str = field_str(&doc, "switchType").or_else(|| field_str(&doc, "Type"));
    let Some(kind) = kind_str.and_then(kind_from_wire) else {
        debug!("status message for idx {idx} has no recognised kind");
        return Inbound::UnknownKind;
    };

    let Some(index) = reg.find(kind, idx) else {
        // Name is extracted for the log line only, never for matching.
        let name = field_str(&doc, "name")
            .or_else(|| field_str(&doc, "Name"))
            .unwrap_or("?");
        debug!("device '{name}' ({} idx {idx}) not handled", kind.label());
        return Inbound::Unresolved;
    };

    let current_aux = reg.get(index).map_or(0, crate::model::Device::aux);
    let (status, aux) = match kind {
        DeviceKind::Toggle | DeviceKind::Contact => {
            let nvalue = field_i64(&doc, "nvalue").unwrap_or(0);
            (Status::offset(kind.status_base(), nvalue), current_aux)
        }
        DeviceKind::Dimmer => {
            let nvalue = field_i64(&doc, "nvalue").unwrap_or(0);
            let level = field_i64(&doc, "Level").unwrap_or(0);
            (
                Status::offset(kind.status_base(), nvalue),
                (level / 10) as i32,
            )
        }
        DeviceKind::Selector => {
            // The primary status field is meaningless for selectors; the
            // choice comes from svalue1 (multiples of 10).
            let sv = field_i64(&doc, "svalue1").unwrap_or(0);
            let choice = (sv / 10).clamp(0, i64::from(u8::MAX)) as u8;
            let desc = selectors
                .find_by_device(index)
                .map_or(current_aux, |d| d as i32);
            (Status::from_choice(choice), desc)
        }
        DeviceKind::Group => {
            let status = match field_str(&doc, "Status") {
                Some("On") => Status::On,
                Some("Mixed") => Status::Mixed,
                _ => Status::Off,
            };
            (status, current_aux)
        }
        // Scenes and push-offs carry no status; nothing is published for
        // them anyway since their wire kinds are not in the mapping table.
        DeviceKind::PushOff | DeviceKind::Scene => return Inbound::UnknownKind,
    };

    reg.set_status(index, status, aux);
    if let Some(dev) = reg.get(index) {
        debug!(
            "set '{}' status to {} (aux {})",
            dev.name(),
            status.label(),
            aux
        );
    }
    Inbound::Applied { index }
}

/// Exact wire-string → kind mapping.  Anything else is unknown.
fn kind_from_wire(s: &str) -> Option<DeviceKind> {
    match s {
        "On/Off" => Some(DeviceKind::Toggle),
        "Dimmer" => Some(DeviceKind::Dimmer),
        "Contact" => Some(DeviceKind::Contact),
        "Selector" => Some(DeviceKind::Selector),
        "Group" => Some(DeviceKind::Group),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Explicit optional-field accessors
// ---------------------------------------------------------------------------
//
// Absence, null, and the empty string all count as "not present"; there is
// no silent cross-type coercion beyond the documented string-encoded
// integer form.

fn field_str<'a>(doc: &'a Value, key: &str) -> Option<&'a str> {
    match doc.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn field_u64(doc: &Value, key: &str) -> Option<u64> {
    doc.get(key).and_then(Value::as_u64)
}

/// Integer field that may arrive number-typed or string-encoded
/// (Domoticz sends `svalue1` as a string).
fn field_i64(doc: &Value, key: &str) -> Option<i64> {
    match doc.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog;

    fn fixtures() -> (Registry, SelectorTable) {
        (
            catalog::build_registry(),
            SelectorTable::new(catalog::SELECTORS),
        )
    }

    #[test]
    fn toggle_on_message_applies() {
        let (mut reg, sel) = fixtures();
        let out = apply_inbound(&mut reg, &sel, r#"{"idx":5,"switchType":"On/Off","nvalue":1}"#);
        let index = reg.find(DeviceKind::Toggle, 5).unwrap();
        assert_eq!(out, Inbound::Applied { index });
        assert_eq!(reg.get(index).unwrap().status(), Status::On);
    }

    #[test]
    fn applied_status_is_retrievable() {
        let (mut reg, sel) = fixtures();
        let out = apply_inbound(
            &mut reg,
            &sel,
            r#"{"idx":89,"switchType":"Dimmer","nvalue":1,"Level":70}"#,
        );
        let index = reg.find(DeviceKind::Dimmer, 89).unwrap();
        assert_eq!(out, Inbound::Applied { index });
        let dev = reg.get(index).unwrap();
        assert_eq!(dev.status(), Status::On);
        assert_eq!(dev.aux(), 7);
    }

    #[test]
    fn contact_uses_closed_base() {
        let (mut reg, sel) = fixtures();
        apply_inbound(&mut reg, &sel, r#"{"idx":29,"switchType":"Contact","nvalue":0}"#);
        let index = reg.find(DeviceKind::Contact, 29).unwrap();
        assert_eq!(reg.get(index).unwrap().status(), Status::Closed);

        apply_inbound(&mut reg, &sel, r#"{"idx":29,"switchType":"Contact","nvalue":1}"#);
        assert_eq!(reg.get(index).unwrap().status(), Status::Open);
    }

    #[test]
    fn selector_reads_svalue1_and_wires_descriptor() {
        let (mut reg, sel) = fixtures();
        let out = apply_inbound(
            &mut reg,
            &sel,
            r#"{"idx":159,"switchType":"Selector","nvalue":4,"svalue1":"20"}"#,
        );
        let index = reg.find(DeviceKind::Selector, 159).unwrap();
        assert_eq!(out, Inbound::Applied { index });
        let dev = reg.get(index).unwrap();
        // Choice 2 of the calendar; nvalue is ignored for selectors.
        assert_eq!(dev.status(), Status::from_choice(2));
        assert_eq!(dev.aux(), 1);
    }

    #[test]
    fn group_status_string_maps_tristate() {
        let (mut reg, sel) = fixtures();
        let index = reg.find(DeviceKind::Group, 6).unwrap();
        apply_inbound(&mut reg, &sel, r#"{"idx":6,"Type":"Group","Status":"On"}"#);
        assert_eq!(reg.get(index).unwrap().status(), Status::On);
        apply_inbound(&mut reg, &sel, r#"{"idx":6,"Type":"Group","Status":"Mixed"}"#);
        assert_eq!(reg.get(index).unwrap().status(), Status::Mixed);
        apply_inbound(&mut reg, &sel, r#"{"idx":6,"Type":"Group","Status":"Whatever"}"#);
        assert_eq!(reg.get(index).unwrap().status(), Status::Off);
    }

    #[test]
    fn type_key_is_a_fallback_for_switch_type() {
        let (mut reg, sel) = fixtures();
        let out = apply_inbound(&mut reg, &sel, r#"{"idx":5,"Type":"On/Off","nvalue":1}"#);
        assert!(matches!(out, Inbound::Applied { .. }));
    }

    #[test]
    fn missing_idx_is_dropped() {
        let (mut reg, sel) = fixtures();
        assert_eq!(
            apply_inbound(&mut reg, &sel, r#"{"switchType":"On/Off","nvalue":1}"#),
            Inbound::MissingId
        );
        assert_eq!(
            apply_inbound(&mut reg, &sel, r#"{"idx":0,"switchType":"On/Off"}"#),
            Inbound::MissingId
        );
    }

    #[test]
    fn empty_kind_is_unknown_and_mutates_nothing() {
        let (mut reg, sel) = fixtures();
        let before = reg.get(0).unwrap().status();
        let out = apply_inbound(&mut reg, &sel, r#"{"idx":5,"switchType":"","nvalue":1}"#);
        assert_eq!(out, Inbound::UnknownKind);
        assert_eq!(reg.get(0).unwrap().status(), before);
    }

    #[test]
    fn unlisted_kind_string_is_unknown() {
        let (mut reg, sel) = fixtures();
        assert_eq!(
            apply_inbound(&mut reg, &sel, r#"{"idx":5,"switchType":"Thermostat"}"#),
            Inbound::UnknownKind
        );
    }

    #[test]
    fn unresolved_device_is_dropped() {
        let (mut reg, sel) = fixtures();
        let out = apply_inbound(
            &mut reg,
            &sel,
            r#"{"idx":9999,"switchType":"On/Off","nvalue":1,"name":"porch"}"#,
        );
        assert_eq!(out, Inbound::Unresolved);
    }

    #[test]
    fn garbage_payload_is_malformed() {
        let (mut reg, sel) = fixtures();
        assert_eq!(apply_inbound(&mut reg, &sel, "not json"), Inbound::Malformed);
    }
}
