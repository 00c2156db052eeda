//! Interaction-mode state machine for the rotary dial.
//!
//! ```text
//!               single click: toggle current device
//!                    ┌───┐
//!                    ▼   │
//!  ┌──────────────────────────┐  double click on dimmer  ┌─────────────┐
//!  │          BROWSE          │ ───────────────────────▶ │ DIMMER EDIT │
//!  │  rotate: previous/next   │ ◀─────────────────────── │ rotate: 0-10│
//!  │          device          │   click: send Set Level  └─────────────┘
//!  └──────────────────────────┘  double click on selector ┌─────────────┐
//!     ▲      │         ▲        ───────────────────────▶ │ SELECT EDIT │
//!     │      │inactive │        ◀─────────────────────── │rotate:choice│
//!     │      ▼         │  long   click: send Set Level   └─────────────┘
//!  ┌─────────────┐     │  press
//!  │   BLANKED   │     └─────────────▶ ┌───────────────┐
//!  │ alert flash │    click: run entry │     MENU      │
//!  └─────────────┘ ◀── any input ───── │ admin actions │
//!                                      └───────────────┘
//! ```
//!
//! Every transition is synchronous; the machine never publishes or paints
//! by itself.  Commands come back to the caller as [`UiEffect`] values and
//! display staleness is signalled through a dirty flag consumed by the
//! render step.

pub mod render;

use log::debug;

use crate::app::ports::RotaryPort;
use crate::config::SystemConfig;
use crate::model::selectors::SelectorTable;
use crate::model::{DeviceKind, Registry};
use crate::protocol::outbound::{build_command, build_toggle};
use crate::protocol::OutboundMessage;

/// Dim levels run 0–10 on the dial (0–100 on the wire).
pub const DIM_LEVEL_MAX: i32 = 10;

// ---------------------------------------------------------------------------
// Menu entries
// ---------------------------------------------------------------------------

/// Administrative actions reachable from the configuration menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Fetch the remote options document and restart.
    ReloadConfig = 0,
    /// Download and flash new firmware, then restart.
    RefreshFirmware = 1,
    /// Wipe stored options, restart with defaults.
    RestoreDefaults = 2,
    /// Forget Wi-Fi credentials and restart into provisioning.
    ForgetNetwork = 3,
    /// Show hostname/version, IP, and broker state.
    ShowInfo = 4,
    Restart = 5,
}

impl MenuAction {
    pub const COUNT: usize = 6;

    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::ReloadConfig,
            1 => Self::RefreshFirmware,
            2 => Self::RestoreDefaults,
            3 => Self::ForgetNetwork,
            4 => Self::ShowInfo,
            _ => Self::Restart,
        }
    }

    /// The two caption lines shown under the menu banner.
    pub const fn captions(self) -> (&'static str, &'static str) {
        match self {
            Self::ReloadConfig => ("Download", "options"),
            Self::RefreshFirmware => ("Download", "firmware"),
            Self::RestoreDefaults => ("Use default", "options"),
            Self::ForgetNetwork => ("Clear", "Wi-Fi"),
            Self::ShowInfo => ("Show", "information"),
            Self::Restart => ("Restart", ""),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// The interaction mode, carrying only the fields that mode needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Showing device statuses; the default mode.
    Browse,
    /// Editing a dimmer's level; `pending` is 0–10, sent `* 10`.
    DimmerEdit { pending: i32 },
    /// Editing a selector's choice; `pending` is the 0-based choice.
    SelectorEdit { pending: i32 },
    /// Display off after inactivity; `resume` is the device to return to.
    Blanked { resume: usize },
    /// Administrative menu.
    Menu { choice: usize },
}

impl Mode {
    /// Whether the display is lit in this mode.
    pub const fn display_visible(self) -> bool {
        !matches!(self, Self::Blanked { .. })
    }
}

/// What the caller must do after feeding an input event to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    None,
    /// Publish this command to the broker.
    Publish(OutboundMessage),
    /// Execute an administrative action.
    Admin(MenuAction),
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Owns the interaction mode, the current selection, and the display dirty
/// flag.  Consults the registry and translator; never blocks.
pub struct UiMachine {
    mode: Mode,
    /// Registry index of the device currently shown / acted upon.
    current: usize,
    dirty: bool,
}

impl UiMachine {
    /// Start in browse mode on the first catalog entry, pushing the initial
    /// rotation bounds to the encoder.
    pub fn new(reg: &Registry, rotary: &mut impl RotaryPort) -> Self {
        let mut ui = Self {
            mode: Mode::Blanked { resume: 0 },
            current: 0,
            dirty: true,
        };
        // Seed from a throwaway mode so the Browse entry bounds apply.
        ui.set_mode(Mode::Browse, reg, &SelectorTable::new(&[]), &SystemConfig::default(), rotary);
        ui.dirty = true;
        ui
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Registry index of the device currently shown.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Consume the display dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::take(&mut self.dirty)
    }

    /// Flag the display stale (inbound update for the shown device, group
    /// recompute, broker state change, ...).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // ── Input events ──────────────────────────────────────────

    /// Rotation event: update the bounded cursor for the active mode.
    /// Never emits a command.
    pub fn handle_rotation(
        &mut self,
        position: i32,
        reg: &Registry,
        selectors: &SelectorTable,
        config: &SystemConfig,
        rotary: &mut impl RotaryPort,
    ) {
        match self.mode {
            Mode::Browse => {
                self.current = clamp_index(position, reg.len());
            }
            Mode::DimmerEdit { .. } => {
                self.mode = Mode::DimmerEdit {
                    pending: position.clamp(0, DIM_LEVEL_MAX),
                };
            }
            Mode::SelectorEdit { .. } => {
                let max = self.selector_choice_max(reg, selectors);
                self.mode = Mode::SelectorEdit {
                    pending: position.clamp(0, max),
                };
            }
            Mode::Menu { .. } => {
                self.mode = Mode::Menu {
                    choice: clamp_index(position, MenuAction::COUNT),
                };
            }
            Mode::Blanked { .. } => {
                // Any rotation wakes the display; the position itself is
                // discarded since the bounds belonged to the old mode.
                self.set_mode(Mode::Browse, reg, selectors, config, rotary);
                return;
            }
        }
        self.dirty = true;
    }

    /// Click event.  `count` is the number of clicks; `-1` is the held
    /// (long-press) signal from the button driver.
    pub fn handle_clicks(
        &mut self,
        count: i8,
        reg: &Registry,
        selectors: &SelectorTable,
        config: &SystemConfig,
        rotary: &mut impl RotaryPort,
    ) -> UiEffect {
        debug!(
            "clicks {count} in {:?}, device {}",
            self.mode, self.current
        );

        if count < 0 {
            self.set_mode(Mode::Menu { choice: 0 }, reg, selectors, config, rotary);
            return UiEffect::None;
        }

        match self.mode {
            Mode::Blanked { .. } => {
                let mut effect = UiEffect::None;
                if count == 1 && config.default_active {
                    if let Some(default) = self.default_index(reg, config) {
                        effect = build_toggle(reg, default).map_or(UiEffect::None, UiEffect::Publish);
                    }
                }
                self.set_mode(Mode::Browse, reg, selectors, config, rotary);
                effect
            }

            Mode::Browse => {
                match count {
                    1 => build_toggle(reg, self.current).map_or(UiEffect::None, UiEffect::Publish),
                    2 => {
                        match reg.get(self.current).map(crate::model::Device::kind) {
                            Some(DeviceKind::Dimmer) => {
                                let pending = reg
                                    .get(self.current)
                                    .map_or(0, |d| d.aux().clamp(0, DIM_LEVEL_MAX));
                                self.set_mode(
                                    Mode::DimmerEdit { pending },
                                    reg,
                                    selectors,
                                    config,
                                    rotary,
                                );
                            }
                            Some(DeviceKind::Selector) => {
                                let pending = reg
                                    .get(self.current)
                                    .map_or(0, |d| d.status() as i32);
                                self.set_mode(
                                    Mode::SelectorEdit { pending },
                                    reg,
                                    selectors,
                                    config,
                                    rotary,
                                );
                            }
                            _ => {}
                        }
                        UiEffect::None
                    }
                    _ => UiEffect::None,
                }
            }

            Mode::Menu { choice } => {
                let effect = if count == 1 {
                    UiEffect::Admin(MenuAction::from_index(choice))
                } else {
                    UiEffect::None
                };
                self.set_mode(Mode::Browse, reg, selectors, config, rotary);
                effect
            }

            Mode::DimmerEdit { pending } => {
                let effect = if count == 1 {
                    // Dial level 0–10 becomes wire level 0–100.
                    build_command(reg, self.current, pending * 10, true)
                        .map_or(UiEffect::None, UiEffect::Publish)
                } else {
                    UiEffect::None
                };
                self.set_mode(Mode::Browse, reg, selectors, config, rotary);
                effect
            }

            Mode::SelectorEdit { pending } => {
                let effect = if count == 1 {
                    // Selector choices are multiples of 10 on the wire.
                    build_command(reg, self.current, pending * 10, true)
                        .map_or(UiEffect::None, UiEffect::Publish)
                } else {
                    UiEffect::None
                };
                self.set_mode(Mode::Browse, reg, selectors, config, rotary);
                effect
            }
        }
    }

    /// Inactivity timeout elapsed: blank the display, caching the resume
    /// index.  No-op when already blanked.
    pub fn enter_blanked(&mut self) {
        if !matches!(self.mode, Mode::Blanked { .. }) {
            debug!("display blanked, resume index {}", self.current);
            self.mode = Mode::Blanked {
                resume: self.current,
            };
            // The render step turns the panel off; nothing to redraw.
            self.dirty = false;
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Switch modes: restore the selection when waking from blank, then
    /// push the new mode's rotation bounds to the encoder.
    fn set_mode(
        &mut self,
        mode: Mode,
        reg: &Registry,
        selectors: &SelectorTable,
        config: &SystemConfig,
        rotary: &mut impl RotaryPort,
    ) {
        if self.mode == mode {
            return;
        }
        if let Mode::Blanked { resume } = self.mode {
            self.current = self
                .default_index(reg, config)
                .unwrap_or_else(|| clamp_index(resume as i32, reg.len()));
        }
        match mode {
            Mode::Browse => {
                rotary.set_limits(reg.len().saturating_sub(1) as i32);
                rotary.set_position(self.current as i32);
            }
            Mode::DimmerEdit { pending } => {
                rotary.set_limits(DIM_LEVEL_MAX);
                rotary.set_position(pending);
            }
            Mode::SelectorEdit { pending } => {
                rotary.set_limits(self.selector_choice_max(reg, selectors));
                rotary.set_position(pending);
            }
            Mode::Menu { choice } => {
                rotary.set_limits(MenuAction::COUNT as i32 - 1);
                rotary.set_position(choice as i32);
            }
            Mode::Blanked { .. } => {}
        }
        debug!("mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.dirty = mode.display_visible();
    }

    /// Highest valid choice index for the current selector device.
    fn selector_choice_max(&self, reg: &Registry, selectors: &SelectorTable) -> i32 {
        reg.get(self.current)
            .and_then(|d| selectors.get(d.aux().max(0) as usize))
            .map_or(0, |s| i32::from(s.choices) - 1)
    }

    /// Configured default device, when valid.
    fn default_index(&self, reg: &Registry, config: &SystemConfig) -> Option<usize> {
        let idx = config.default_device as usize;
        (idx < reg.len()).then_some(idx)
    }
}

fn clamp_index(position: i32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    position.clamp(0, len as i32 - 1) as usize
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog;
    use crate::model::Status;

    /// Records the bounds the machine pushes to the encoder.
    #[derive(Default)]
    struct MockRotary {
        limits: i32,
        position: i32,
    }

    impl RotaryPort for MockRotary {
        fn set_limits(&mut self, max: i32) {
            self.limits = max;
        }
        fn set_position(&mut self, position: i32) {
            self.position = position;
        }
    }

    struct Fixture {
        reg: Registry,
        selectors: SelectorTable,
        config: SystemConfig,
        rotary: MockRotary,
        ui: UiMachine,
    }

    fn fixture() -> Fixture {
        let reg = catalog::build_registry();
        let mut rotary = MockRotary::default();
        let ui = UiMachine::new(&reg, &mut rotary);
        Fixture {
            reg,
            selectors: SelectorTable::new(catalog::SELECTORS),
            config: SystemConfig::default(),
            rotary,
            ui,
        }
    }

    impl Fixture {
        fn rotate(&mut self, pos: i32) {
            self.ui.handle_rotation(
                pos,
                &self.reg,
                &self.selectors,
                &self.config,
                &mut self.rotary,
            );
        }
        fn click(&mut self, n: i8) -> UiEffect {
            self.ui.handle_clicks(
                n,
                &self.reg,
                &self.selectors,
                &self.config,
                &mut self.rotary,
            )
        }
    }

    #[test]
    fn starts_browsing_first_device() {
        let mut f = fixture();
        assert_eq!(f.ui.mode(), Mode::Browse);
        assert_eq!(f.ui.current(), 0);
        assert_eq!(f.rotary.limits, catalog::DEVICES.len() as i32 - 1);
        assert!(f.ui.take_dirty());
        assert!(!f.ui.take_dirty());
    }

    #[test]
    fn rotation_moves_device_cursor_clamped() {
        let mut f = fixture();
        f.rotate(3);
        assert_eq!(f.ui.current(), 3);
        assert!(f.ui.take_dirty());
        f.rotate(1000);
        assert_eq!(f.ui.current(), catalog::DEVICES.len() - 1);
        f.rotate(-5);
        assert_eq!(f.ui.current(), 0);
    }

    #[test]
    fn single_click_toggles_current_device() {
        let mut f = fixture();
        let UiEffect::Publish(msg) = f.click(1) else {
            panic!("expected a publish effect");
        };
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchlight","idx":5,"switchcmd":"On"}"#
        );
        assert_eq!(f.ui.mode(), Mode::Browse);
    }

    #[test]
    fn double_click_on_dimmer_enters_edit_with_current_level() {
        let mut f = fixture();
        f.reg.set_status(9, Status::On, 7);
        f.rotate(9);
        assert_eq!(f.click(2), UiEffect::None);
        assert_eq!(f.ui.mode(), Mode::DimmerEdit { pending: 7 });
        assert_eq!(f.rotary.limits, DIM_LEVEL_MAX);
        assert_eq!(f.rotary.position, 7);
    }

    #[test]
    fn dimmer_confirm_sends_one_level_command() {
        let mut f = fixture();
        f.reg.set_status(9, Status::On, 7);
        f.rotate(9);
        f.click(2);
        f.rotate(4);
        let UiEffect::Publish(msg) = f.click(1) else {
            panic!("expected a publish effect");
        };
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchlight","idx":89,"switchcmd":"Set Level","level":40}"#
        );
        assert_eq!(f.ui.mode(), Mode::Browse);
    }

    #[test]
    fn dimmer_double_click_discards_pending() {
        let mut f = fixture();
        f.reg.set_status(9, Status::On, 7);
        f.rotate(9);
        f.click(2);
        f.rotate(2);
        assert_eq!(f.click(2), UiEffect::None);
        assert_eq!(f.ui.mode(), Mode::Browse);
        // The mirrored level is untouched by the discarded edit.
        assert_eq!(f.reg.get(9).unwrap().aux(), 7);
    }

    #[test]
    fn double_click_on_selector_enters_choice_edit() {
        let mut f = fixture();
        f.reg.set_status(24, Status::from_choice(1), 1);
        f.rotate(24);
        f.click(2);
        assert_eq!(f.ui.mode(), Mode::SelectorEdit { pending: 1 });
        // Calendar has 3 choices: bounds 0..=2.
        assert_eq!(f.rotary.limits, 2);
    }

    #[test]
    fn selector_confirm_sends_choice_times_ten() {
        let mut f = fixture();
        f.rotate(24);
        f.click(2);
        f.rotate(2);
        let UiEffect::Publish(msg) = f.click(1) else {
            panic!("expected a publish effect");
        };
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchlight","idx":159,"switchcmd":"Set Level","level":20}"#
        );
    }

    #[test]
    fn double_click_on_plain_switch_is_a_no_op() {
        let mut f = fixture();
        assert_eq!(f.click(2), UiEffect::None);
        assert_eq!(f.ui.mode(), Mode::Browse);
    }

    #[test]
    fn long_press_opens_menu_and_click_runs_entry() {
        let mut f = fixture();
        assert_eq!(f.click(-1), UiEffect::None);
        assert_eq!(f.ui.mode(), Mode::Menu { choice: 0 });
        assert_eq!(f.rotary.limits, MenuAction::COUNT as i32 - 1);
        f.rotate(5);
        assert_eq!(f.click(1), UiEffect::Admin(MenuAction::Restart));
        assert_eq!(f.ui.mode(), Mode::Browse);
    }

    #[test]
    fn blank_caches_resume_index_and_wakes_to_it() {
        let mut f = fixture();
        f.rotate(12);
        f.ui.enter_blanked();
        assert_eq!(f.ui.mode(), Mode::Blanked { resume: 12 });
        assert!(!f.ui.take_dirty());
        f.rotate(0);
        assert_eq!(f.ui.mode(), Mode::Browse);
        assert_eq!(f.ui.current(), 12);
        assert!(f.ui.take_dirty());
    }

    #[test]
    fn wake_prefers_configured_default_device() {
        let mut f = fixture();
        f.config.default_device = 6;
        f.rotate(12);
        f.ui.enter_blanked();
        f.click(2);
        assert_eq!(f.ui.current(), 6);
        assert_eq!(f.ui.mode(), Mode::Browse);
    }

    #[test]
    fn blanked_single_click_toggles_default_when_active() {
        let mut f = fixture();
        f.config.default_device = 6;
        f.config.default_active = true;
        f.ui.enter_blanked();
        let UiEffect::Publish(msg) = f.click(1) else {
            panic!("expected a publish effect");
        };
        // Floor lamp, idx 1, currently off.
        assert_eq!(
            msg.payload.as_str(),
            r#"{"command":"switchlight","idx":1,"switchcmd":"On"}"#
        );
        assert_eq!(f.ui.mode(), Mode::Browse);
    }

    #[test]
    fn blanked_click_without_default_just_wakes() {
        let mut f = fixture();
        f.ui.enter_blanked();
        assert_eq!(f.click(1), UiEffect::None);
        assert_eq!(f.ui.mode(), Mode::Browse);
    }
}
