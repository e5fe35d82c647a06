//! Greenhouse node firmware: main entry point.
//!
//! Hexagonal architecture driven by a cooperative scheduler.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   WifiAdapter   Esp32Time      │
//! │  (ActuatorPort)    (EventSink)    (LinkPort)    (ClockPort)    │
//! │  UnwiredSensors    StatusLed      HeapMonitor   BackendClient  │
//! │  (SensorPort)      (StatusPort)   (MemoryPort)  (BackendPort)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        Controller · OverrideMachine (pure logic)       │    │
//! │  │  TelemetryUplink · CommandPoller · Supervisor          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (edge-executor, five perpetual tasks)               │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use core::time::Duration;

use anyhow::{Context, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{AnyOutputPin, PinDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{info, warn};

use greenhouse_node::adapters::hardware::HardwareAdapter;
use greenhouse_node::adapters::log_sink::LogEventSink;
use greenhouse_node::adapters::time::Esp32TimeAdapter;
use greenhouse_node::adapters::tls_transport::TlsConnector;
use greenhouse_node::adapters::wifi::WifiAdapter;
use greenhouse_node::config::{DeviceConfig, secrets};
use greenhouse_node::diagnostics::{self, HeapMonitor};
use greenhouse_node::drivers::relay::RelayDriver;
use greenhouse_node::drivers::status_led::StatusLed;
use greenhouse_node::net::BackendClient;
use greenhouse_node::pins;
use greenhouse_node::scheduler::{Node, NodeParts, Scheduler};
#[cfg(feature = "sim-sensors")]
use greenhouse_node::sensors::SimulatedSensors;
#[cfg(not(feature = "sim-sensors"))]
use greenhouse_node::sensors::UnwiredSensors;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    diagnostics::install_panic_handler();

    info!("╔══════════════════════════════════════╗");
    info!("║  Greenhouse node v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration from build-time secrets ──────────────
    let mut config = DeviceConfig::default();
    config.backend.device_id = secrets::DEVICE_ID.into();
    config.backend.api_key = secrets::API_KEY.into();
    if let Some(host) = secrets::BACKEND_HOST {
        config.backend.host = host.into();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("device configuration")?;
    info!(
        "Backend {}:{} as device '{}'",
        config.backend.host, config.backend.port, config.backend.device_id
    );

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // SAFETY: each GPIO number is claimed exactly once here, and the
    // pins are not handed out through `peripherals.pins` elsewhere.
    let (pump_pin, fan_pin, led_pin) = unsafe {
        (
            AnyOutputPin::new(pins::PUMP_RELAY_GPIO),
            AnyOutputPin::new(pins::FAN_RELAY_GPIO),
            AnyOutputPin::new(pins::STATUS_LED_GPIO),
        )
    };
    let actuators = HardwareAdapter::new(
        RelayDriver::new(PinDriver::output(pump_pin)?, pins::PUMP_RELAY_ACTIVE_LOW, "pump"),
        RelayDriver::new(PinDriver::output(fan_pin)?, pins::FAN_RELAY_ACTIVE_LOW, "fan"),
    );
    let status = StatusLed::new(PinDriver::output(led_pin)?);

    // ── 4. Wi-Fi (connected by the scheduler's boot sequence) ─
    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, Some(nvs))?);
    if let Err(e) = wifi.set_credentials(secrets::WIFI_SSID, secrets::WIFI_PSK) {
        warn!("Wi-Fi credentials rejected ({}), running offline", e);
    }

    // ── 5. Backend clients (one per network task) ─────────────
    let io_timeout = Duration::from_millis(u64::from(config.io_timeout_ms));
    let client = || {
        BackendClient::new(
            TlsConnector::new(io_timeout),
            &config.backend,
            config.max_response_bytes,
        )
    };

    // ── 6. Sensors ────────────────────────────────────────────
    // Bench images opt into the simulated hub; otherwise every channel
    // reads as faulted and auto-control never switches the relays.
    #[cfg(feature = "sim-sensors")]
    let sensors = SimulatedSensors::drifting();
    #[cfg(not(feature = "sim-sensors"))]
    let sensors = UnwiredSensors::new();

    // ── 7. Assemble and run ───────────────────────────────────
    let node = Node::new(
        &config,
        NodeParts {
            sensors,
            actuators,
            events: LogEventSink::new(),
            uplink_backend: client(),
            poll_backend: client(),
            link: wifi,
            memory: HeapMonitor::new(),
            status,
            clock: Esp32TimeAdapter::new(),
        },
    );

    info!("System ready. Starting scheduler.");
    Scheduler::new(&config).run(node, core::future::pending::<()>());
    Ok(())
}
