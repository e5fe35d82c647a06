//! TLS connector adapter.
//!
//! Implements [`Connector`](crate::net::transport::Connector): every
//! backend exchange opens its own TLS-wrapped socket and drops it when
//! the response has been read.  Nothing is pooled or reused.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_tls` client session with server
//!   certificate verification against the built-in CA bundle and the
//!   backend host as SNI / common name.
//! - **all other targets**: simulation stubs using `std::net::TcpStream`
//!   in plaintext (no TLS) for host-side testing against a loopback
//!   listener.
//!
//! ## Connection model
//!
//! 1. `open()` resolves the host and connects with `io_timeout`.
//! 2. Reads block until data, EOF or timeout; a timeout is a read fault.
//! 3. Dropping the [`TlsStream`] closes the session.

use core::time::Duration;

use log::{debug, warn};

use crate::error::TransportFault;
use crate::net::transport::{Connector, Transport};

#[cfg(not(target_os = "espidf"))]
use std::io::{Read, Write};

// ───────────────────────────────────────────────────────────────
// ESP-IDF platform helpers (esp_tls)
// ───────────────────────────────────────────────────────────────
#[cfg(target_os = "espidf")]
mod esp_impl;

// ───────────────────────────────────────────────────────────────
// TlsConnector
// ───────────────────────────────────────────────────────────────

/// Opens one TLS session per exchange.
pub struct TlsConnector {
    io_timeout: Duration,
    opened: u32,
}

impl TlsConnector {
    pub fn new(io_timeout: Duration) -> Self {
        Self {
            io_timeout,
            opened: 0,
        }
    }

    /// Sessions opened since boot.
    pub fn opened(&self) -> u32 {
        self.opened
    }

    // ── Platform helpers: open ────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_open(&self, host: &str, port: u16) -> Result<TlsStream, TransportFault> {
        let inner = esp_impl::esp_connect(host, port, self.io_timeout)?;
        Ok(TlsStream { inner })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_open(&self, host: &str, port: u16) -> Result<TlsStream, TransportFault> {
        use std::net::ToSocketAddrs;

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|_| TransportFault::Dns)?
            .next()
            .ok_or(TransportFault::Dns)?;
        let stream = std::net::TcpStream::connect_timeout(&addr, self.io_timeout)
            .map_err(|_| TransportFault::Connect)?;
        stream
            .set_read_timeout(Some(self.io_timeout))
            .and_then(|()| stream.set_write_timeout(Some(self.io_timeout)))
            .map_err(|_| TransportFault::Connect)?;
        debug!("TLS(sim): connected to {} (plaintext)", addr);
        Ok(TlsStream { stream })
    }
}

impl Connector for TlsConnector {
    type Conn = TlsStream;

    fn open(&mut self, host: &str, port: u16) -> Result<TlsStream, TransportFault> {
        match self.platform_open(host, port) {
            Ok(s) => {
                self.opened = self.opened.wrapping_add(1);
                Ok(s)
            }
            Err(e) => {
                warn!("TLS: open {}:{} failed: {}", host, port, e);
                Err(e)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// TlsStream
// ───────────────────────────────────────────────────────────────

/// One open session.  Closed on drop.
pub struct TlsStream {
    #[cfg(target_os = "espidf")]
    inner: esp_impl::EspSession,
    #[cfg(not(target_os = "espidf"))]
    stream: std::net::TcpStream,
}

impl Transport for TlsStream {
    #[cfg(target_os = "espidf")]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportFault> {
        esp_impl::esp_read(&mut self.inner, buf)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportFault> {
        self.stream.read(buf).map_err(|_| TransportFault::Read)
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportFault> {
        esp_impl::esp_write(&mut self.inner, data)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportFault> {
        self.stream.write(data).map_err(|_| TransportFault::Write)
    }

    #[cfg(target_os = "espidf")]
    fn flush(&mut self) -> Result<(), TransportFault> {
        // esp_tls writes through to mbedtls; nothing is buffered here.
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn flush(&mut self) -> Result<(), TransportFault> {
        self.stream.flush().map_err(|_| TransportFault::Write)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests (host / simulation path only)
// ───────────────────────────────────────────────────────────────
