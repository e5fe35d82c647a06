//! Backend networking: a minimal HTTP/1.1 client over a per-call socket.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    Net Stack                          │
//! │                                                       │
//! │  ┌──────────────┐   ┌───────────┐   ┌─────────────┐   │
//! │  │ BackendClient│──▶│   HTTP    │──▶│  Connector  │   │
//! │  │ (BackendPort)│   │  (codec)  │   │  (trait)    │   │
//! │  └──────────────┘   └───────────┘   └─────────────┘   │
//! │         ▲                 │                │          │
//! │         │   HttpResponse  │    TLS / TCP   ▼          │
//! │         └─────────────────┘          smartgreenhouse  │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod http;
pub mod transport;

pub use client::BackendClient;
pub use http::{Body, HttpResponse, HttpTransport, Method, RequestHeaders, parse_response};
pub use transport::{Connector, Transport};
