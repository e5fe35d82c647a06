//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements    | Connects to                  |
//! |----------------|---------------|------------------------------|
//! | `hardware`     | ActuatorPort  | Pump and fan relay GPIOs     |
//! | `log_sink`     | EventSink     | Serial log output            |
//! | `time`         | ClockPort     | ESP32 system timer           |
//! | `tls_transport`| Connector     | TCP + TLS (CA bundle)        |
//! | `wifi`         | LinkPort      | ESP-IDF Wi-Fi STA            |

pub mod hardware;
pub mod log_sink;
pub mod time;
pub mod tls_transport;
pub mod wifi;
