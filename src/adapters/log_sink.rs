//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::{AppEvent, ControlSource};
use crate::app::ports::EventSink;

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

fn channel(v: Option<f32>) -> heapless::String<12> {
    let mut s = heapless::String::new();
    let _ = match v {
        Some(v) => core::fmt::Write::write_fmt(&mut s, format_args!("{:.1}", v)),
        None => s.push_str("--").map_err(|()| core::fmt::Error),
    };
    s
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ActuatorChanged { actuator, on, source } => {
                let by = match source {
                    ControlSource::Auto => "auto",
                    ControlSource::Remote => "remote",
                };
                info!("ACT | {} {} ({})", actuator, on_off(*on), by);
            }
            AppEvent::OverrideActivated { actuator, at } => {
                info!("OVR | {} override armed at t={}s", actuator, at);
            }
            AppEvent::OverrideExpired { actuator, at } => {
                info!("OVR | {} override expired at t={}s, back to auto", actuator, at);
            }
            AppEvent::CommandsReceived(cmd) => {
                info!("OVR | commands pump={:?} fan={:?}", cmd.pump, cmd.fan);
            }
            AppEvent::TelemetrySent(p) => {
                info!(
                    "TELEM | T={}\u{00b0}C | RH={}% | soil={}%",
                    channel(p.temp),
                    channel(p.humidity),
                    channel(p.soil_moisture),
                );
            }
            AppEvent::TelemetryFailed => {
                warn!("TELEM | push failed, will retry");
            }
            AppEvent::LinkLost => {
                warn!("LINK | lost");
            }
            AppEvent::LinkRestored => {
                info!("LINK | restored");
            }
            AppEvent::MemoryReclaimed { free_bytes } => match free_bytes {
                Some(b) => info!("MEM | reclaimed, free={}B", b),
                None => info!("MEM | reclaimed"),
            },
        }
    }
}
