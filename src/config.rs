//! System configuration parameters
//!
//! All tunable parameters for the greenhouse node.  Defaults match the
//! deployed firmware; a JSON overlay can replace any subset of them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Backend endpoint and the static shared-secret header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend host name (also sent as `Host:` and used as TLS SNI).
    pub host: String,
    /// TLS port.
    pub port: u16,
    /// Device identifier embedded in both endpoint paths.
    pub device_id: String,
    /// Value of the `X-Api-Key` header.
    pub api_key: String,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "smartgreenhouse.online".into(),
            port: 443,
            device_id: String::new(),
            api_key: String::new(),
            user_agent: concat!("GreenhouseNode/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// Core device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub backend: BackendConfig,

    // --- Telemetry ---
    /// Sensor / auto-control / uplink cycle (milliseconds)
    pub send_interval_ms: u32,
    /// Minimum per-channel delta that triggers an uplink (channel units)
    pub change_threshold: f32,

    // --- Commands ---
    /// Command poll cycle (milliseconds)
    pub command_poll_interval_ms: u32,
    /// Seconds a remote command suppresses auto-control
    pub override_timeout_secs: u32,

    // --- Auto-control thresholds ---
    /// Fan turns on above this temperature (°C)
    pub temp_threshold_c: f32,
    /// Pump turns on below this soil moisture (%)
    pub soil_moisture_threshold_pct: f32,

    // --- Connectivity ---
    /// Link supervisor cycle (milliseconds)
    pub wifi_check_interval_ms: u32,
    /// Upper bound for one reconnect attempt (seconds)
    pub reconnect_timeout_secs: u32,
    /// Link check step while a reconnect is pending (milliseconds)
    pub reconnect_poll_ms: u32,
    /// Socket connect/read/write timeout (milliseconds)
    pub io_timeout_ms: u32,
    /// Responses larger than this are dropped as a transport fault
    pub max_response_bytes: usize,

    // --- Housekeeping ---
    /// Memory reclaim cycle (milliseconds)
    pub memory_reclaim_interval_ms: u32,
    /// Status feedback / heartbeat cycle (milliseconds)
    pub status_interval_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),

            // Telemetry
            send_interval_ms: 1000,
            change_threshold: 0.5,

            // Commands
            command_poll_interval_ms: 1000,
            override_timeout_secs: 300, // 5 min

            // Auto-control
            temp_threshold_c: 36.0,
            soil_moisture_threshold_pct: 30.0,

            // Connectivity
            wifi_check_interval_ms: 10_000,
            reconnect_timeout_secs: 15,
            reconnect_poll_ms: 1000,
            io_timeout_ms: 10_000,
            max_response_bytes: 16 * 1024,

            // Housekeeping
            memory_reclaim_interval_ms: 60_000,
            status_interval_ms: 2000,
        }
    }
}

impl DeviceConfig {
    /// Parse a JSON overlay.  Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|_| Error::Config("json"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the control loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("send_interval_ms", self.send_interval_ms),
            ("command_poll_interval_ms", self.command_poll_interval_ms),
            ("wifi_check_interval_ms", self.wifi_check_interval_ms),
            ("memory_reclaim_interval_ms", self.memory_reclaim_interval_ms),
            ("status_interval_ms", self.status_interval_ms),
            ("reconnect_timeout_secs", self.reconnect_timeout_secs),
            ("reconnect_poll_ms", self.reconnect_poll_ms),
            ("io_timeout_ms", self.io_timeout_ms),
        ];
        if let Some(&(field, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(Error::Config(field));
        }
        if !(self.change_threshold >= 0.0 && self.change_threshold.is_finite()) {
            return Err(Error::Config("change_threshold"));
        }
        if !self.temp_threshold_c.is_finite() {
            return Err(Error::Config("temp_threshold_c"));
        }
        if !(0.0..=100.0).contains(&self.soil_moisture_threshold_pct) {
            return Err(Error::Config("soil_moisture_threshold_pct"));
        }
        if self.max_response_bytes == 0 {
            return Err(Error::Config("max_response_bytes"));
        }
        if self.backend.host.is_empty() {
            return Err(Error::Config("backend.host"));
        }
        if self.backend.device_id.is_empty() || self.backend.device_id.contains('/') {
            return Err(Error::Config("backend.device_id"));
        }
        if self.backend.api_key.is_empty() {
            return Err(Error::Config("backend.api_key"));
        }
        Ok(())
    }
}

/// Build-time secrets for the device image.
///
/// Set `GREENHOUSE_*` in the environment when building the firmware;
/// unset values are empty and fail [`DeviceConfig::validate`].
pub mod secrets {
    pub const WIFI_SSID: &str = match option_env!("GREENHOUSE_WIFI_SSID") {
        Some(v) => v,
        None => "",
    };
    pub const WIFI_PSK: &str = match option_env!("GREENHOUSE_WIFI_PSK") {
        Some(v) => v,
        None => "",
    };
    pub const API_KEY: &str = match option_env!("GREENHOUSE_API_KEY") {
        Some(v) => v,
        None => "",
    };
    pub const DEVICE_ID: &str = match option_env!("GREENHOUSE_DEVICE_ID") {
        Some(v) => v,
        None => "",
    };
    pub const BACKEND_HOST: Option<&str> = option_env!("GREENHOUSE_BACKEND_HOST");
}
