//! Alert conditions and the round-robin alert cursor.
//!
//! While the display is blanked, the controller flashes devices that are in
//! an alert condition (garage door open, automatic closing disabled).  The
//! scanner walks the alert table round-robin so that simultaneously active
//! alerts take turns instead of the first one starving the rest.

use log::debug;

use super::Registry;
use super::Status;

/// Maximum number of alert descriptors.
pub const MAX_ALERTS: usize = 8;

/// One alert: registry index plus the status value that warrants flashing.
#[derive(Debug, Clone, Copy)]
pub struct AlertDef {
    pub device: usize,
    pub condition: Status,
}

/// The alert table plus the runtime cursor.
pub struct AlertScanner {
    alerts: heapless::Vec<AlertDef, MAX_ALERTS>,
    /// Alert-table index currently shown in the flash view, if any.
    current: Option<usize>,
}

impl AlertScanner {
    pub fn new(defs: &[AlertDef]) -> Self {
        let mut alerts = heapless::Vec::new();
        for def in defs {
            if alerts.push(*def).is_err() {
                debug_assert!(false, "alert table exceeds MAX_ALERTS");
                break;
            }
        }
        Self {
            alerts,
            current: None,
        }
    }

    /// Alert-table index currently shown, if its condition still held at
    /// the last scan.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Registry index of the device behind an alert slot.
    pub fn target(&self, slot: usize) -> Option<usize> {
        self.alerts.get(slot).map(|a| a.device)
    }

    /// Advance to the next active alert, round-robin from the slot after
    /// the current one.
    ///
    /// Returns the slot of the first alert whose device currently matches
    /// its condition, or `None` (and a cleared cursor) when nothing is in
    /// alarm.  Finding the same alert again leaves the cursor untouched —
    /// only a transition into, out of, or between alerts changes it.
    pub fn scan_next(&mut self, reg: &Registry) -> Option<usize> {
        let count = self.alerts.len();
        if count == 0 {
            return None;
        }
        let mut next = self.current.map_or(0, |c| c + 1);
        for _ in 0..count {
            if next >= count {
                next = 0;
            }
            let alert = &self.alerts[next];
            if reg.get(alert.device).map(super::Device::status) == Some(alert.condition) {
                if self.current != Some(next) {
                    debug!("alert {next} raised");
                    self.current = Some(next);
                }
                return self.current;
            }
            next += 1;
        }
        if self.current.is_some() {
            debug!("alerts cleared");
            self.current = None;
        }
        None
    }
}
