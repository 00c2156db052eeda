//! Application service — the hexagonal core.
//!
//! [`DialService`] owns the registry, descriptor tables, UI machine, and
//! the resynchronization timers.  It exposes one method per slot of the
//! fixed loop-cycle order:
//!
//! ```text
//!  input events ─▶ group tick ─▶ display refresh ─▶ blanking check
//!      ─▶ alert tick ─▶ connectivity maintenance ─▶ inbound drain
//! ```
//!
//! Every method is synchronous and bounded-time; all I/O flows through
//! port traits injected at call sites, making the entire service testable
//! with mock adapters.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::events::InputEvent;
use crate::model::alerts::AlertScanner;
use crate::model::groups::GroupTable;
use crate::model::selectors::SelectorTable;
use crate::model::{catalog, Registry};
use crate::protocol::inbound::{apply_inbound, Inbound};
use crate::protocol::outbound::resync_messages;
use crate::protocol::{OutboundMessage, STATUS_TOPIC};
use crate::ui::render::{device_screen, menu_screen, Screen};
use crate::ui::{MenuAction, Mode, UiEffect, UiMachine};

use super::events::AppEvent;
use super::ports::{BrokerPort, DisplayPort, EventSink, RotaryPort};

/// The application service orchestrates all domain logic.
pub struct DialService {
    reg: Registry,
    groups: GroupTable,
    selectors: SelectorTable,
    alerts: AlertScanner,
    ui: UiMachine,
    config: SystemConfig,

    // ── Resynchronization timers (milliseconds, wrapping) ────
    /// Last group-aggregation run.
    group_at_ms: u32,
    /// Last alert flash toggle.
    alert_at_ms: u32,
    /// Last display render; drives the inactivity blank.
    last_active_ms: u32,
    /// Last broker connection attempt, `None` before the first.
    connect_at_ms: Option<u32>,
    /// Whether the broker session was up at the previous maintenance call.
    broker_up: bool,
    /// Whether an alert screen is currently lit (blanked mode only).
    alert_visible: bool,
}

impl DialService {
    /// Build the service from configuration and the static catalog,
    /// pushing the initial browse bounds to the encoder.
    pub fn new(config: SystemConfig, rotary: &mut impl RotaryPort) -> Self {
        let reg = catalog::build_registry();
        let ui = UiMachine::new(&reg, rotary);
        Self {
            reg,
            groups: catalog::build_groups(),
            selectors: SelectorTable::new(catalog::SELECTORS),
            alerts: AlertScanner::new(catalog::ALERTS),
            ui,
            config,
            group_at_ms: 0,
            alert_at_ms: 0,
            last_active_ms: 0,
            connect_at_ms: None,
            broker_up: false,
            alert_visible: false,
        }
    }

    /// Align the timers and announce the start.
    pub fn start(&mut self, now_ms: u32, sink: &mut impl EventSink) {
        self.group_at_ms = now_ms;
        self.alert_at_ms = now_ms;
        self.last_active_ms = now_ms;
        sink.emit(&AppEvent::Started);
        info!("DialService started with {} devices", self.reg.len());
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn registry(&self) -> &Registry {
        &self.reg
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.ui.mode()
    }

    /// Registry index of the device currently shown.
    pub fn current_device(&self) -> usize {
        self.ui.current()
    }

    /// Force a repaint on the next cycle (after info screens or a failed
    /// administrative action painted over the normal view).
    pub fn request_refresh(&mut self) {
        self.ui.mark_dirty();
    }

    // ── 1. Input events ───────────────────────────────────────

    /// Route one input event through the UI machine.  Commands publish
    /// immediately; administrative actions are returned for the caller to
    /// execute (most of them restart the process).
    pub fn handle_input(
        &mut self,
        event: InputEvent,
        rotary: &mut impl RotaryPort,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) -> Option<MenuAction> {
        match event {
            InputEvent::Rotated(position) => {
                self.ui.handle_rotation(
                    i32::from(position),
                    &self.reg,
                    &self.selectors,
                    &self.config,
                    rotary,
                );
                None
            }
            InputEvent::Clicked(count) => {
                let effect = self.ui.handle_clicks(
                    count,
                    &self.reg,
                    &self.selectors,
                    &self.config,
                    rotary,
                );
                match effect {
                    UiEffect::None => None,
                    UiEffect::Publish(msg) => {
                        self.publish(&msg, broker, sink);
                        None
                    }
                    UiEffect::Admin(action) => Some(action),
                }
            }
        }
    }

    // ── 2. Group aggregation tick ─────────────────────────────

    /// Recompute group statuses when the interval has elapsed.  Batched on
    /// purpose: inbound bursts do not trigger per-message recomputes.
    pub fn group_tick(&mut self, now_ms: u32) {
        if now_ms.wrapping_sub(self.group_at_ms) < self.config.group_refresh_ms {
            return;
        }
        self.group_at_ms = now_ms;
        let changed = self.groups.recompute(&mut self.reg);
        if self.ui.mode().display_visible() && changed.contains(&self.ui.current()) {
            self.ui.mark_dirty();
        }
    }

    // ── 3. Display refresh ────────────────────────────────────

    /// Repaint the panel if the view is stale.  Consumes the dirty flag
    /// and counts as activity for the inactivity blank.
    pub fn refresh_display(&mut self, now_ms: u32, display: &mut impl DisplayPort) {
        if !self.ui.take_dirty() {
            return;
        }
        let screen = self.compose_screen();
        display.show(&screen);
        self.alert_visible = false;
        self.last_active_ms = now_ms;
    }

    // ── 4. Inactivity blanking ────────────────────────────────

    /// Blank the display after the configured idle period.
    pub fn check_blanking(&mut self, now_ms: u32, display: &mut impl DisplayPort) {
        if !self.ui.mode().display_visible() {
            return;
        }
        if now_ms.wrapping_sub(self.last_active_ms) >= self.config.display_timeout_ms {
            self.ui.enter_blanked();
            display.screen_off();
            self.alert_at_ms = now_ms;
            self.alert_visible = false;
        }
    }

    // ── 5. Alert flash tick ───────────────────────────────────

    /// While blanked, alternate the panel between off and the next active
    /// alert every half-period.
    pub fn alert_tick(&mut self, now_ms: u32, display: &mut impl DisplayPort) {
        if self.ui.mode().display_visible() {
            return;
        }
        if now_ms.wrapping_sub(self.alert_at_ms) < self.config.alert_period_ms {
            return;
        }
        self.alert_at_ms = now_ms;

        if self.alert_visible {
            self.alert_visible = false;
            display.screen_off();
            return;
        }
        if let Some(slot) = self.alerts.scan_next(&self.reg) {
            if let Some(index) = self.alerts.target(slot) {
                let screen =
                    device_screen(&self.reg, &self.selectors, index, Mode::Browse, true);
                display.show(&screen);
                self.alert_visible = true;
            }
        }
    }

    // ── 6. Connectivity maintenance ───────────────────────────

    /// Keep the broker session alive, retrying no more often than the
    /// configured minimum interval.  On every (re)connect: subscribe to
    /// the status topic and publish the bulk resync sequence.
    pub fn maintain_connection(
        &mut self,
        now_ms: u32,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) {
        if broker.is_connected() {
            if !self.broker_up {
                self.broker_up = true;
                self.on_connected(broker, sink);
            }
            return;
        }

        if self.broker_up {
            self.broker_up = false;
            warn!("broker session lost");
            sink.emit(&AppEvent::BrokerLost);
        }

        let due = self
            .connect_at_ms
            .is_none_or(|t| now_ms.wrapping_sub(t) >= self.config.mqtt_retry_ms);
        if !due {
            return;
        }
        self.connect_at_ms = Some(now_ms);
        match broker.connect() {
            Ok(()) => {
                self.broker_up = true;
                self.on_connected(broker, sink);
            }
            Err(e) => warn!("could not connect to MQTT broker: {e}"),
        }
    }

    // ── 7. Inbound drain ──────────────────────────────────────

    /// Apply one inbound status payload; flags a refresh when the mutated
    /// device is currently shown.
    pub fn apply_status(&mut self, payload: &str, sink: &mut impl EventSink) -> Inbound {
        let outcome = apply_inbound(&mut self.reg, &self.selectors, payload);
        if let Inbound::Applied { index } = outcome {
            sink.emit(&AppEvent::StatusApplied { index });
            if self.ui.mode().display_visible() && index == self.ui.current() {
                self.ui.mark_dirty();
            }
        }
        outcome
    }

    // ── Internal ──────────────────────────────────────────────

    fn compose_screen(&self) -> Screen {
        match self.ui.mode() {
            Mode::Menu { choice } => menu_screen(choice),
            mode => device_screen(&self.reg, &self.selectors, self.ui.current(), mode, false),
        }
    }

    fn publish(
        &mut self,
        msg: &OutboundMessage,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) {
        match broker.publish(msg.topic, &msg.payload) {
            Ok(()) => {
                info!("MQTT: publish [{}] {}", msg.topic, msg.payload);
                sink.emit(&AppEvent::CommandPublished { topic: msg.topic });
            }
            Err(e) => warn!("MQTT publish failed: {e}"),
        }
    }

    fn on_connected(&mut self, broker: &mut impl BrokerPort, sink: &mut impl EventSink) {
        info!(
            "connected to MQTT broker {} as {}",
            self.config.mqtt_host, self.config.hostname
        );
        sink.emit(&AppEvent::BrokerConnected);
        if let Err(e) = broker.subscribe(STATUS_TOPIC) {
            warn!("subscribe to {STATUS_TOPIC} failed: {e}");
            return;
        }
        // Refresh the mirror: one info request per status-bearing device.
        for msg in resync_messages(&self.reg) {
            if let Err(e) = broker.publish(msg.topic, &msg.payload) {
                warn!("resync publish failed: {e}");
                break;
            }
        }
        self.ui.mark_dirty();
    }
}
