//! Device registry and core data model.
//!
//! The registry is an immutable ordered table of [`Device`] records built
//! once at startup from the static catalog.  All cross-references (group
//! members, selector and alert targets) are **registry indices** into this
//! table, never pointers or ids.  Only `status`/`aux` mutate at runtime,
//! and only through [`Registry::set_status`].

pub mod alerts;
pub mod catalog;
pub mod groups;
pub mod selectors;

use log::debug;

/// Maximum number of devices the registry can hold (stack-allocated).
pub const MAX_DEVICES: usize = 32;

// ---------------------------------------------------------------------------
// Device kind
// ---------------------------------------------------------------------------

/// Categories of Domoticz virtual devices handled by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceKind {
    /// Status is On or Off.
    Toggle = 0,
    /// Status is On or Off plus a dim level.
    Dimmer = 1,
    /// Status is Closed or Open.
    Contact = 2,
    /// Status is the index of the current choice.
    Selector = 3,
    /// Status is On, Off or Mixed depending on the members.
    Group = 4,
    /// Momentary trigger, no status.
    PushOff = 5,
    /// Activatable scene, no status.
    Scene = 6,
}

impl DeviceKind {
    /// Short name used in log messages only.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Toggle => "switch",
            Self::Dimmer => "dimmer",
            Self::Contact => "contact",
            Self::Selector => "selector",
            Self::Group => "group",
            Self::PushOff => "push off",
            Self::Scene => "scene",
        }
    }

    /// Zero point of the primary numeric status field on the wire.
    pub const fn status_base(self) -> Status {
        match self {
            Self::Contact => Status::Closed,
            _ => Status::Off,
        }
    }

    /// Kinds that carry a status worth mirroring (and resyncing on connect).
    pub const fn has_status(self) -> bool {
        !matches!(self, Self::PushOff | Self::Scene)
    }
}

// ---------------------------------------------------------------------------
// Device status
// ---------------------------------------------------------------------------

/// Primary device status.
///
/// One shared enumeration for every kind; which values are meaningful
/// depends on the device kind.  Selector devices store their choice index
/// here directly (0-based) and shift by the descriptor's first choice only
/// for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Status {
    /// Scenes and push-offs have no status.
    #[default]
    None = 0,
    Off = 1,
    On = 2,
    /// Groups whose members disagree.
    Mixed = 3,
    No = 4,
    Yes = 5,
    Closed = 6,
    Open = 7,
    Default = 8,
    Weekend = 9,
    Holidays = 10,
}

impl Status {
    /// Total number of status values — used to bound `from_index`.
    pub const COUNT: usize = 11;

    /// Convert a raw index back to `Status`.  Out-of-range values clamp to
    /// `None` (release) with a debug assertion (debug builds).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::None,
            1 => Self::Off,
            2 => Self::On,
            3 => Self::Mixed,
            4 => Self::No,
            5 => Self::Yes,
            6 => Self::Closed,
            7 => Self::Open,
            8 => Self::Default,
            9 => Self::Weekend,
            10 => Self::Holidays,
            _ => {
                debug_assert!(false, "invalid status index: {idx}");
                Self::None
            }
        }
    }

    /// Status value storing a selector's 0-based choice index.
    ///
    /// Selector devices keep the raw choice index in the shared status
    /// enumeration; the display shifts it by the descriptor's first choice
    /// to obtain a label.  Usable in const contexts (catalog tables).
    pub const fn from_choice(choice: u8) -> Self {
        match choice {
            0 => Self::None,
            1 => Self::Off,
            2 => Self::On,
            3 => Self::Mixed,
            4 => Self::No,
            5 => Self::Yes,
            6 => Self::Closed,
            7 => Self::Open,
            8 => Self::Default,
            9 => Self::Weekend,
            _ => Self::Holidays,
        }
    }

    /// Text shown on the display for this status.
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Off => "Off",
            Self::On => "On",
            Self::Mixed => "Mixed",
            Self::No => "No",
            Self::Yes => "Yes",
            Self::Closed => "Closed",
            Self::Open => "Open",
            Self::Default => "Default",
            Self::Weekend => "Weekend",
            Self::Holidays => "Holidays",
        }
    }

    /// Apply a wire offset to a base status (`base + nvalue`).
    /// The wire value is untrusted; anything out of range maps to `None`
    /// rather than faulting.
    pub fn offset(base: Status, n: i64) -> Self {
        let raw = base as i64 + n;
        if (0..Self::COUNT as i64).contains(&raw) {
            Self::from_index(raw as usize)
        } else {
            Self::None
        }
    }
}

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

/// Room or floor in which devices are grouped; devices are displayed in
/// catalog order, which keeps each zone contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    TopFloor,
    GroundFloor,
    Basement,
    Garage,
    House,
}

impl Zone {
    /// Label printed on the top display line.
    pub const fn label(self) -> &'static str {
        match self {
            Self::TopFloor => "Top Floor",
            Self::GroundFloor => "Ground Floor",
            Self::Basement => "Basement",
            Self::Garage => "Garage",
            Self::House => "House",
        }
    }
}

// ---------------------------------------------------------------------------
// Device record
// ---------------------------------------------------------------------------

/// One Domoticz virtual device mirrored by the controller.
///
/// Identity fields (`idx`, `kind`, `zone`, `name`) never change after
/// construction; `status` and `aux` are updated from inbound broker
/// messages, by the group aggregator, or by UI preview edits.
#[derive(Debug, Clone, Copy)]
pub struct Device {
    idx: u32,
    kind: DeviceKind,
    zone: Zone,
    name: &'static str,
    status: Status,
    /// Extra status: dim level / 10 for dimmers, selector-descriptor index
    /// for selectors, unused otherwise.
    aux: i32,
}

impl Device {
    pub const fn new(
        status: Status,
        idx: u32,
        kind: DeviceKind,
        zone: Zone,
        name: &'static str,
    ) -> Self {
        Self {
            idx,
            kind,
            zone,
            name,
            status,
            aux: 0,
        }
    }

    /// Domoticz idx — unique only within the device's kind.
    pub const fn idx(&self) -> u32 {
        self.idx
    }

    pub const fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub const fn zone(&self) -> Zone {
        self.zone
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn status(&self) -> Status {
        self.status
    }

    pub const fn aux(&self) -> i32 {
        self.aux
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The immutable device table plus its mutable status cells.
///
/// Single-threaded: no locking, every mutation is immediately visible to
/// all readers.
pub struct Registry {
    devices: heapless::Vec<Device, MAX_DEVICES>,
}

impl Registry {
    /// Build the registry from a static catalog slice.
    ///
    /// Devices beyond [`MAX_DEVICES`] are dropped with a debug assertion;
    /// the shipped catalog fits comfortably.
    pub fn new(catalog: &[Device]) -> Self {
        let mut devices = heapless::Vec::new();
        for dev in catalog {
            if devices.push(*dev).is_err() {
                debug_assert!(false, "device catalog exceeds MAX_DEVICES");
                break;
            }
        }
        Self { devices }
    }

    /// Number of devices in the table.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Look up the registry index for a `(kind, idx)` pair.
    ///
    /// The Domoticz idx is unique only per kind — an On/Off switch and a
    /// scene can share idx 6 — so both criteria are required.
    pub fn find(&self, kind: DeviceKind, idx: u32) -> Option<usize> {
        self.devices
            .iter()
            .position(|d| d.kind == kind && d.idx == idx)
    }

    /// Immutable view of a device record.
    pub fn get(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    /// The single mutation primitive: overwrite `status` and `aux` of the
    /// device at `index`.  Invalid indices are ignored.
    pub fn set_status(&mut self, index: usize, status: Status, aux: i32) {
        match self.devices.get_mut(index) {
            Some(dev) => {
                dev.status = status;
                dev.aux = aux;
            }
            None => {
                debug_assert!(false, "set_status: invalid index {index}");
                debug!("set_status ignored for invalid index {index}");
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
