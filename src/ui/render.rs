//! Display line composition.
//!
//! The display sink accepts exactly three lines of text plus an
//! alert-highlight flag; this module builds those lines for the current
//! mode.  Painting pixels is the adapter's business.

use core::fmt::Write as _;

use super::{MenuAction, Mode};
use crate::model::selectors::SelectorTable;
use crate::model::{DeviceKind, Registry};

/// Maximum characters per display line.
pub const LINE_SZ: usize = 24;

pub type Line = heapless::String<LINE_SZ>;

/// Three composed lines plus the alert-highlight flag for the bottom row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub lines: [Line; 3],
    pub alert: bool,
}

impl Screen {
    pub fn new(top: &str, middle: &str, bottom: &str, alert: bool) -> Self {
        Self {
            lines: [line(top), line(middle), line(bottom)],
            alert,
        }
    }
}

/// Compose the screen for the device at `index`.
///
/// The bottom row depends on the mode: the pending value while editing,
/// otherwise the mirrored status (with dim percentage for dimmers and the
/// shifted choice label for selectors).
pub fn device_screen(
    reg: &Registry,
    selectors: &SelectorTable,
    index: usize,
    mode: Mode,
    alert: bool,
) -> Screen {
    let Some(dev) = reg.get(index) else {
        return Screen::default();
    };

    let mut bottom = Line::new();
    match mode {
        Mode::DimmerEdit { pending } => {
            let _ = write!(bottom, "< {} >", pending * 10);
        }
        Mode::SelectorEdit { pending } => {
            let label = selectors.choice_label(dev.aux().max(0) as usize, pending as u8);
            let _ = write!(bottom, "< {label} >");
        }
        _ => match dev.kind() {
            DeviceKind::Dimmer => {
                let _ = write!(bottom, "{} @ {}%", dev.status().label(), dev.aux() * 10);
            }
            DeviceKind::Selector => {
                let label =
                    selectors.choice_label(dev.aux().max(0) as usize, dev.status() as u8);
                let _ = bottom.push_str(label);
            }
            _ => {
                let _ = bottom.push_str(dev.status().label());
            }
        },
    }

    Screen {
        lines: [line(dev.zone().label()), line(dev.name()), bottom],
        alert,
    }
}

/// Compose the configuration-menu screen for the highlighted entry.
pub fn menu_screen(choice: usize) -> Screen {
    let (cap1, cap2) = MenuAction::from_index(choice).captions();
    Screen::new("--Configuration--", cap1, cap2, false)
}

/// Best-effort copy into a display line; overlong text is truncated at the
/// panel width.
fn line(s: &str) -> Line {
    let mut out = Line::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
