//! Transport abstraction — a per-call, byte-oriented connection.
//!
//! Concrete implementations:
//! - TLS socket over Wi-Fi (ESP-IDF `esp_tls`)
//! - plaintext `TcpStream` (host simulation and loopback tests)
//! - scripted in-memory connections (unit tests)
//!
//! The HTTP layer is generic over [`Connector`], so swapping the
//! socket implementation requires zero changes to request building or
//! response parsing.

use crate::error::TransportFault;

/// Size of each socket read while draining a response.
pub const READ_CHUNK: usize = 512;

/// One open, exclusively owned connection.  Dropping it closes the socket.
pub trait Transport {
    /// Read up to `buf.len()` bytes.  `Ok(0)` means the peer closed.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportFault>;

    /// Write `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportFault>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), TransportFault>;
}

/// Opens a fresh connection for every exchange.
pub trait Connector {
    type Conn: Transport;

    /// Resolve, connect and (on device) complete the TLS handshake.
    fn open(&mut self, host: &str, port: u16) -> Result<Self::Conn, TransportFault>;
}

/// Write the whole buffer, then flush.
pub fn write_all(conn: &mut impl Transport, mut data: &[u8]) -> Result<(), TransportFault> {
    while !data.is_empty() {
        match conn.write(data)? {
            0 => return Err(TransportFault::Write),
            n => data = &data[n..],
        }
    }
    conn.flush()
}

/// Read in [`READ_CHUNK`]-sized pieces until the peer closes.
///
/// There is no `Content-Length` early exit: the request always carries
/// `Connection: close`, so end-of-stream marks the end of the response.
/// Gives up with [`TransportFault::ResponseTooLarge`] once more than
/// `cap` bytes have arrived.
pub fn read_to_close(conn: &mut impl Transport, cap: usize) -> Result<Vec<u8>, TransportFault> {
    let mut out = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = conn.read(&mut chunk)?;
        if n == 0 {
            return Ok(out);
        }
        if out.len() + n > cap {
            return Err(TransportFault::ResponseTooLarge);
        }
        out.extend_from_slice(&chunk[..n]);
    }
}
