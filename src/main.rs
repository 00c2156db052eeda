//! DomoDial firmware — main entry point.
//!
//! Hexagonal architecture with a single-threaded cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  OledDisplay   MqttAdapter   NvsAdapter   WifiAdapter          │
//! │  (DisplayPort) (BrokerPort)  (Config+NVS) (ConnectivityPort)   │
//! │  RotaryDriver  ButtonDriver  HttpUpdater  LogEventSink         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            DialService (pure logic)                    │    │
//! │  │  Registry · Groups · Alerts · Translator · UI modes    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each loop cycle runs a fixed order: hardware input, group tick,
//! display refresh, blanking check, alert tick, connectivity
//! maintenance, inbound drain.  Nothing in the cycle blocks; broker
//! reconnects are rate-limited inside the service.

#![deny(unused_must_use)]

use anyhow::{anyhow, Result};
use log::{info, warn};

use domodial::adapters::display::OledDisplay;
use domodial::adapters::log_sink::LogEventSink;
use domodial::adapters::mqtt::MqttAdapter;
use domodial::adapters::nvs::NvsAdapter;
use domodial::adapters::ota::HttpUpdater;
use domodial::adapters::time::Uptime;
use domodial::adapters::wifi::{ConnectivityPort, WifiAdapter};
use domodial::app::ports::{BrokerPort, ConfigPort, DisplayPort, UpdatePort};
use domodial::app::service::DialService;
use domodial::config::SystemConfig;
use domodial::drivers::button::ButtonDriver;
use domodial::drivers::rotary::RotaryDriver;
use domodial::events::{drain_inputs, push_input, InputEvent};
use domodial::pins;
use domodial::ui::render::Screen;
use domodial::ui::MenuAction;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init().map_err(|e| anyhow!("logger init: {e:?}"))?;

    info!("DomoDial v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({e}), using defaults");
            SystemConfig::default()
        }
    };

    // ── 3. Construct adapters ─────────────────────────────────
    let clock = Uptime::new();
    let mut display = OledDisplay::new();
    let mut sink = LogEventSink::new();
    let mut rotary = RotaryDriver::new(pins::ENCODER_CLK_GPIO, pins::ENCODER_DT_GPIO);
    let mut button = ButtonDriver::new(pins::ENCODER_SW_GPIO);
    let mut wifi = WifiAdapter::new();
    let mut broker = MqttAdapter::new(&config);
    let mut updater = HttpUpdater::new(&config.ota_url);

    display.show(&Screen::new(
        &config.hostname,
        "version",
        env!("CARGO_PKG_VERSION"),
        false,
    ));
    dwell(config.info_time_ms);

    if let Err(e) = wifi.connect() {
        warn!("WiFi not up yet ({e}); backoff polling takes over");
    }

    // ── 4. Construct the service ──────────────────────────────
    let mut service = DialService::new(config.clone(), &mut rotary);
    service.start(clock.now_ms(), &mut sink);

    info!("System ready. Entering event loop.");

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        let now_ms = clock.now_ms();

        // 5a. Hardware input events.
        if let Some(position) = rotary.tick() {
            let _ = push_input(InputEvent::Rotated(position as i16));
        }
        if let Some(count) = button.tick(now_ms) {
            let _ = push_input(InputEvent::Clicked(count));
        }
        let mut admin: Option<MenuAction> = None;
        drain_inputs(|event| {
            if let Some(action) =
                service.handle_input(event, &mut rotary, &mut broker, &mut sink)
            {
                admin = Some(action);
            }
        });
        if let Some(action) = admin {
            run_admin(
                action,
                &mut service,
                &mut display,
                &mut wifi,
                &mut nvs,
                &mut updater,
                &broker,
            );
        }

        // 5b. Group aggregation tick.
        service.group_tick(now_ms);

        // 5c. Display refresh (if dirty).
        service.refresh_display(now_ms, &mut display);

        // 5d. Inactivity blanking.
        service.check_blanking(now_ms, &mut display);

        // 5e. Alert flash tick (blanked only).
        service.alert_tick(now_ms, &mut display);

        // 5f. Network connectivity maintenance.
        wifi.poll(now_ms);
        if wifi.is_connected() {
            service.maintain_connection(now_ms, &mut broker, &mut sink);
        }

        // 5g. Inbound message drain.
        broker.drain_inbound(&mut |_topic, payload| {
            service.apply_status(payload, &mut sink);
        });

        dwell(service.config().loop_interval_ms);
    }
}

// ── Administrative actions ────────────────────────────────────
//
// Most entries restart the process, so they run here at the outer ring
// where every adapter is in scope, not inside the service.

fn run_admin(
    action: MenuAction,
    service: &mut DialService,
    display: &mut OledDisplay,
    wifi: &mut WifiAdapter,
    nvs: &mut NvsAdapter,
    updater: &mut HttpUpdater,
    broker: &MqttAdapter,
) {
    let info_ms = service.config().info_time_ms;
    match action {
        MenuAction::ReloadConfig => {
            if updater.fetch_options() {
                restart(display, info_ms);
            }
            display.show(&Screen::new("Failed to load", "options", "", false));
            dwell(info_ms);
            service.request_refresh();
        }
        MenuAction::RefreshFirmware => {
            if updater.fetch_firmware() {
                // New firmware starts from default options but keeps the
                // Wi-Fi credentials.
                nvs.clear_config();
                restart(display, info_ms);
            }
            display.show(&Screen::new("Failed to load", "new firmware", "", false));
            dwell(info_ms);
            service.request_refresh();
        }
        MenuAction::RestoreDefaults => {
            nvs.clear_config();
            restart(display, info_ms);
        }
        MenuAction::ForgetNetwork => {
            wifi.forget_credentials();
            restart(display, info_ms);
        }
        MenuAction::ShowInfo => {
            let config = service.config();
            display.show(&Screen::new(
                &config.hostname,
                "version",
                env!("CARGO_PKG_VERSION"),
                false,
            ));
            dwell(info_ms);
            let ip = wifi.ip();
            display.show(&Screen::new(
                "Connected as",
                ip.as_deref().unwrap_or("(no network)"),
                "",
                false,
            ));
            dwell(info_ms);
            if broker.is_connected() {
                display.show(&Screen::new(
                    "Connected to",
                    "MQTT broker",
                    &config.mqtt_host,
                    false,
                ));
            } else {
                display.show(&Screen::new(
                    "Not connected",
                    "to MQTT broker",
                    &config.mqtt_host,
                    false,
                ));
            }
            dwell(info_ms);
            service.request_refresh();
        }
        MenuAction::Restart => restart(display, info_ms),
    }
}

/// Paint the goodbye screen, give pending log lines time to flush, then
/// reset the processor.
fn restart(display: &mut OledDisplay, dwell_ms: u32) -> ! {
    info!("Restarting DomoDial");
    display.show(&Screen::new("", "Restarting...", "", false));
    dwell(dwell_ms);
    #[cfg(target_os = "espidf")]
    {
        // SAFETY: esp_restart never returns; all state is lost by design.
        unsafe { esp_idf_svc::sys::esp_restart() };
        #[allow(unreachable_code)]
        loop {}
    }
    #[cfg(not(target_os = "espidf"))]
    std::process::exit(0);
}

/// Blocking wait — used only for info-screen dwell and loop pacing,
/// never inside the service.
fn dwell(ms: u32) {
    std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
}
