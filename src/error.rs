//! Unified error types for the greenhouse node firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! per-task "log and continue" handling uniform.  All variants are `Copy`
//! so a fault can be logged, counted and signalled without allocation.
//!
//! No variant is fatal: every task iteration that returns an `Error` is
//! logged by the scheduler and the task proceeds to its next sleep.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor channel could not be read this cycle.
    Sensor(SensorFault),
    /// DNS, connect, TLS or socket I/O failed.
    Transport(TransportFault),
    /// The backend answered, but not with something usable.
    Protocol(ProtocolFault),
    /// The Wi-Fi link is down or could not be re-established.
    Link(LinkFault),
    /// Configuration is invalid.  Carries the offending field name.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(field) => write!(f, "config: invalid {field}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// Sensor channels, used to tag which reading was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Temperature,
    Humidity,
    SoilMoisture,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Humidity => write!(f, "humidity"),
            Self::SoilMoisture => write!(f, "soil moisture"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// The provider returned no value for the channel.
    Unavailable(Channel),
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(ch) => write!(f, "{ch} reading unavailable"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    /// Host name did not resolve.
    Dns,
    /// TCP connect failed or timed out.
    Connect,
    /// TLS handshake or session error.
    Tls,
    /// Writing the request failed.
    Write,
    /// Reading the response failed before the peer closed.
    Read,
    /// The response exceeded the configured byte cap.
    ResponseTooLarge,
    /// The request could not be assembled within its buffer.
    RequestTooLarge,
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns => write!(f, "DNS lookup failed"),
            Self::Connect => write!(f, "connect failed"),
            Self::Tls => write!(f, "TLS handshake or session error"),
            Self::Write => write!(f, "request write failed"),
            Self::Read => write!(f, "response read failed"),
            Self::ResponseTooLarge => write!(f, "response too large"),
            Self::RequestTooLarge => write!(f, "request too large"),
        }
    }
}

impl From<TransportFault> for Error {
    fn from(e: TransportFault) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol faults
// ---------------------------------------------------------------------------

/// Non-JSON bodies are NOT a protocol fault: they degrade to a raw
/// passthrough.  Only an explicit non-2xx status or an unencodable
/// payload end up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFault {
    /// The backend answered with a non-2xx status.
    Status(u16),
    /// The response carried no parseable status line.
    MissingStatus,
    /// The outbound payload could not be serialised.
    Encode,
}

impl fmt::Display for ProtocolFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "unexpected HTTP status {code}"),
            Self::MissingStatus => write!(f, "no HTTP status line"),
            Self::Encode => write!(f, "payload encoding failed"),
        }
    }
}

impl From<ProtocolFault> for Error {
    fn from(e: ProtocolFault) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Link faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFault {
    /// No Wi-Fi credentials have been configured.
    NoCredentials,
    /// SSID or passphrase failed validation.
    InvalidCredentials,
    /// The association did not complete within the allotted time.
    Timeout,
    /// The driver rejected the connection attempt.
    ConnectFailed,
}

impl fmt::Display for LinkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidCredentials => write!(f, "WiFi credentials invalid"),
            Self::Timeout => write!(f, "WiFi connect timed out"),
            Self::ConnectFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl From<LinkFault> for Error {
    fn from(e: LinkFault) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
