//! ESP-IDF platform helpers for `TlsConnector`.
//!
//! This module is compiled only for `target_os = "espidf"` and wraps the
//! `esp_tls` client: lwIP socket, mbedTLS session, CA-bundle server
//! verification.
//!
//! All public items are `pub(super)` to keep them private to the adapters
//! module.

use core::time::Duration;

use esp_idf_svc::tls::{Config, EspTls, InternalSocket};
use log::{info, warn};

use crate::error::TransportFault;

/// One client session.  `EspTls::drop` tears down mbedTLS and closes the
/// socket.
pub(super) type EspSession = EspTls<InternalSocket>;

/// Connect and complete the handshake.
pub(super) fn esp_connect(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<EspSession, TransportFault> {
    let mut tls = EspTls::new().map_err(|e| {
        warn!("TLS(espidf): session alloc failed: {}", e);
        TransportFault::Tls
    })?;

    let cfg = Config {
        common_name: Some(host),
        timeout_ms: timeout.as_millis() as u32,
        use_crt_bundle_attach: true,
        ..Config::new()
    };

    tls.connect(host, port, &cfg).map_err(|e| {
        warn!("TLS(espidf): connect {}:{} failed: {}", host, port, e);
        TransportFault::Tls
    })?;
    info!("TLS(espidf): session up with {}:{}", host, port);
    Ok(tls)
}

/// Blocking read.  `Ok(0)` once the server closes.
pub(super) fn esp_read(tls: &mut EspSession, buf: &mut [u8]) -> Result<usize, TransportFault> {
    tls.read(buf).map_err(|e| {
        warn!("TLS(espidf): read failed: {}", e);
        TransportFault::Read
    })
}

pub(super) fn esp_write(tls: &mut EspSession, data: &[u8]) -> Result<usize, TransportFault> {
    tls.write(data).map_err(|e| {
        warn!("TLS(espidf): write failed: {}", e);
        TransportFault::Write
    })
}
