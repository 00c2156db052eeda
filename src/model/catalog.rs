//! Static device catalog.
//!
//! The list of Domoticz virtual devices visible on this dial, in display
//! order (grouped by zone), plus the selector, group, and alert descriptor
//! tables that reference them by registry index.
//!
//! Everything here is constant; the mutable status cells live in the
//! [`Registry`](super::Registry) built from these tables at startup.

use super::alerts::AlertDef;
use super::selectors::SelectorDef;
use super::{Device, DeviceKind, Registry, Status, Zone};

/// Domoticz idx of the garage-door push-off trigger.
///
/// Domoticz does not echo a status update for this device after a command,
/// so the translator self-reports completion on the status topic instead
/// of publishing to the command topic.
pub const PUSH_OFF_SELF_REPORT_IDX: u32 = 28;

/// Devices in display order.  Comments carry the registry index used by
/// the descriptor tables below.
pub const DEVICES: &[Device] = &[
    /* 00 */ Device::new(Status::Off, 5, DeviceKind::Toggle, Zone::TopFloor, "Alice's lamp"),
    /* 01 */ Device::new(Status::Off, 6, DeviceKind::Toggle, Zone::TopFloor, "Michael's lamp"),
    /* 02 */ Device::new(Status::None, 5, DeviceKind::Group, Zone::TopFloor, "Bedside lamps"),
    /* 03 */ Device::new(Status::None, 7, DeviceKind::Scene, Zone::TopFloor, "Alice bedtime"),
    /* 04 */ Device::new(Status::None, 8, DeviceKind::Scene, Zone::TopFloor, "Michael bedtime"),
    /* 05 */ Device::new(Status::Off, 85, DeviceKind::Toggle, Zone::TopFloor, "Guest TV"),
    /* 06 */ Device::new(Status::Off, 1, DeviceKind::Toggle, Zone::GroundFloor, "Floor lamp"),
    /* 07 */ Device::new(Status::Off, 4, DeviceKind::Toggle, Zone::GroundFloor, "Table lamp"),
    /* 08 */ Device::new(Status::Off, 3, DeviceKind::Toggle, Zone::GroundFloor, "Bookshelves"),
    /* 09 */ Device::new(Status::Off, 89, DeviceKind::Dimmer, Zone::GroundFloor, "Dining room"),
    /* 10 */ Device::new(Status::Off, 90, DeviceKind::Dimmer, Zone::GroundFloor, "Kitchen"),
    /* 11 */ Device::new(Status::Off, 113, DeviceKind::Dimmer, Zone::GroundFloor, "Entrance"),
    /* 12 */ Device::new(Status::Off, 140, DeviceKind::Toggle, Zone::GroundFloor, "Balconies"),
    /* 13 */ Device::new(Status::Off, 8, DeviceKind::Toggle, Zone::Garage, "Garage outside"),
    /* 14 */ Device::new(Status::Off, 7, DeviceKind::Toggle, Zone::Garage, "Garage inside"),
    /* 15 */
    // Boots on choice 1 ("Yes"); choice 0 would trip the disabled-alert
    // below before the first selector message arrives.
    Device::new(Status::from_choice(1), 37, DeviceKind::Selector, Zone::Garage, "Auto close"),
    /* 16 */ Device::new(Status::Open, 29, DeviceKind::Contact, Zone::Garage, "Door"),
    /* 17 */ Device::new(Status::None, 28, DeviceKind::PushOff, Zone::Garage, "Close door"),
    /* 18 */ Device::new(Status::Off, 138, DeviceKind::Toggle, Zone::Basement, "Basement stairs"),
    /* 19 */ Device::new(Status::Off, 72, DeviceKind::Toggle, Zone::Basement, "Sofa lamp"),
    /* 20 */ Device::new(Status::Off, 52, DeviceKind::Toggle, Zone::Basement, "TV lamps"),
    /* 21 */ Device::new(Status::Off, 87, DeviceKind::Toggle, Zone::Basement, "Desk"),
    /* 22 */ Device::new(Status::Off, 173, DeviceKind::Toggle, Zone::Basement, "Torch lamp"),
    /* 23 */ Device::new(Status::None, 6, DeviceKind::Group, Zone::Basement, "Basement"),
    /* 24 */ Device::new(Status::None, 159, DeviceKind::Selector, Zone::House, "Calendar"),
];

/// Selector descriptors: registry index, first choice, number of choices.
/// A selector's `status` holds the 0-based choice index; the display adds
/// `status0` to obtain the label.
pub const SELECTORS: &[SelectorDef] = &[
    // Garage auto close: No / Yes
    SelectorDef {
        device: 15,
        status0: Status::No,
        choices: 2,
    },
    // Calendar: Default / Weekend / Holidays
    SelectorDef {
        device: 24,
        status0: Status::Default,
        choices: 3,
    },
];

/// Group member lists (registry indices, max 5 members each).
pub const GROUPS: &[(usize, &[usize])] = &[
    // Bedside lamps = {Alice's lamp, Michael's lamp}
    (2, &[0, 1]),
    // Basement = {Sofa lamp, TV lamps, Torch lamp}
    (23, &[19, 20, 22]),
];

/// Alert conditions: registry index plus the status that warrants flashing.
pub const ALERTS: &[AlertDef] = &[
    // Garage door left open.
    AlertDef {
        device: 16,
        condition: Status::Open,
    },
    // Automatic closing disabled (selector choice 0).
    AlertDef {
        device: 15,
        condition: Status::from_choice(0),
    },
];

/// Build the registry from the static catalog, wiring each selector
/// device's `aux` to its descriptor index up front.
pub fn build_registry() -> Registry {
    let mut reg = Registry::new(DEVICES);
    for (desc, sel) in SELECTORS.iter().enumerate() {
        if let Some(dev) = reg.get(sel.device) {
            let status = dev.status();
            reg.set_status(sel.device, status, desc as i32);
        }
    }
    reg
}

/// Build the group descriptor table.
pub fn build_groups() -> super::groups::GroupTable {
    super::groups::GroupTable::new(GROUPS)
}
