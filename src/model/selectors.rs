//! Selector descriptors.
//!
//! Selectors can have many choices; each selector device has exactly one
//! descriptor row mapping it to its first choice label and choice count.
//! The device's `aux` holds the index of its descriptor in this table.

use super::Status;

/// Maximum number of selector descriptors.
pub const MAX_SELECTORS: usize = 8;

/// One selector: registry index, first possible choice (value 0), and the
/// number of choices — so the last wire level is `(choices - 1) * 10`.
#[derive(Debug, Clone, Copy)]
pub struct SelectorDef {
    pub device: usize,
    pub status0: Status,
    pub choices: u8,
}

/// The static selector descriptor table.
pub struct SelectorTable {
    selectors: heapless::Vec<SelectorDef, MAX_SELECTORS>,
}

impl SelectorTable {
    pub fn new(defs: &[SelectorDef]) -> Self {
        let mut selectors = heapless::Vec::new();
        for def in defs {
            if selectors.push(*def).is_err() {
                debug_assert!(false, "selector table exceeds MAX_SELECTORS");
                break;
            }
        }
        Self { selectors }
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Descriptor by table index (a selector device's `aux`).
    pub fn get(&self, desc: usize) -> Option<&SelectorDef> {
        self.selectors.get(desc)
    }

    /// Find the descriptor index for a device's registry index.
    pub fn find_by_device(&self, device: usize) -> Option<usize> {
        self.selectors.iter().position(|s| s.device == device)
    }

    /// Display label for a selector's current choice.
    pub fn choice_label(&self, desc: usize, choice: u8) -> &'static str {
        match self.get(desc) {
            Some(def) => Status::from_choice(choice.saturating_add(def.status0 as u8)).label(),
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SelectorTable {
        SelectorTable::new(&[
            SelectorDef {
                device: 15,
                status0: Status::No,
                choices: 2,
            },
            SelectorDef {
                device: 24,
                status0: Status::Default,
                choices: 3,
            },
        ])
    }

    #[test]
    fn find_by_device_resolves() {
        let t = table();
        assert_eq!(t.find_by_device(15), Some(0));
        assert_eq!(t.find_by_device(24), Some(1));
        assert_eq!(t.find_by_device(3), None);
    }

    #[test]
    fn choice_labels_shift_by_status0() {
        let t = table();
        assert_eq!(t.choice_label(0, 0), "No");
        assert_eq!(t.choice_label(0, 1), "Yes");
        assert_eq!(t.choice_label(1, 0), "Default");
        assert_eq!(t.choice_label(1, 2), "Holidays");
    }
}
