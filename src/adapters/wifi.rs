//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`], the hexagonal boundary for network
//! connectivity.  The connectivity supervisor calls
//! [`begin_reconnect`](LinkPort::begin_reconnect) whenever the link is
//! down and then polls [`is_connected`](LinkPort::is_connected).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests, with
//!   link-drop and connect-failure injection.
//!
//! ## Connect policy
//!
//! One association request per call.  `EspWifi::connect` only queues the
//! request with the driver, so the call returns at once; the caller owns
//! the wait and the timeout.  No backoff: the supervisor's own interval
//! spaces the attempts.

use log::{error, info};
#[cfg(not(target_os = "espidf"))]
use log::warn;

use crate::app::ports::LinkPort;
use crate::error::LinkFault;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), LinkFault> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(LinkFault::InvalidCredentials);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkFault> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkFault::InvalidCredentials);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    attempts: u32,

    // ── ESP-IDF fields ──────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,

    // ── Simulation fields ───────────────────────────────────────
    /// Link level as the simulated driver reports it.
    #[cfg(not(target_os = "espidf"))]
    sim_up: bool,
    /// Upcoming connect attempts that fail.
    #[cfg(not(target_os = "espidf"))]
    sim_fail_next: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            attempts: 0,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            attempts: 0,
            sim_up: false,
            sim_fail_next: 0,
        }
    }

    pub fn state(&self) -> WifiState {
        if self.platform_is_connected() {
            WifiState::Connected
        } else {
            self.state
        }
    }

    /// Connect attempts since boot.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), LinkFault> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|()| LinkFault::InvalidCredentials)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| LinkFault::InvalidCredentials)?;
        info!("LINK: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Request association with the configured AP.  Returns as soon as
    /// the driver has accepted the request.
    pub fn begin_connect(&mut self) -> Result<(), LinkFault> {
        if self.ssid.is_empty() {
            return Err(LinkFault::NoCredentials);
        }
        self.attempts = self.attempts.wrapping_add(1);
        info!("LINK: associating with '{}'", self.ssid);
        self.state = WifiState::Connecting;

        self.platform_begin().inspect_err(|e| {
            error!("LINK: driver refused the connect request: {}", e);
            self.state = WifiState::Failed;
        })
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self) -> Result<(), LinkFault> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| LinkFault::InvalidCredentials)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| LinkFault::InvalidCredentials)?,
            auth_method,
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|_| LinkFault::ConnectFailed)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| LinkFault::ConnectFailed)?;
        }
        // A stale association makes connect() fail; ignore the result.
        let _ = self.wifi.disconnect();
        self.wifi.connect().map_err(|_| LinkFault::ConnectFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self) -> Result<(), LinkFault> {
        if self.sim_fail_next > 0 {
            self.sim_fail_next -= 1;
            warn!("LINK(sim): association will not complete (attempt {})", self.attempts);
            return Ok(());
        }
        self.sim_up = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_up
    }

    // ── Simulation controls ───────────────────────────────────

    /// Drop the simulated link, as if the AP went away.
    #[cfg(not(target_os = "espidf"))]
    pub fn drop_link(&mut self) {
        self.sim_up = false;
        self.state = WifiState::Disconnected;
        info!("LINK(sim): link dropped");
    }

    /// Make the next `n` association attempts never complete.
    #[cfg(not(target_os = "espidf"))]
    pub fn fail_next(&mut self, n: u32) {
        self.sim_fail_next = n;
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn begin_reconnect(&mut self) -> Result<(), LinkFault> {
        self.begin_connect()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
