//! Minimal HTTP/1.1 request/response codec.
//!
//! Only what the two backend endpoints need: a literal request with a
//! fixed header set and order, `Connection: close`, and a response split
//! on the first blank line.  No chunked transfer, no redirects, no
//! connection reuse.
//!
//! ```text
//!  <METHOD> <path> HTTP/1.1
//!  Host · X-Api-Key · User-Agent · Accept · [Content-Type · Content-Length]
//!  Connection: close
//!
//!  [<json body>]
//! ```
//!
//! A body that is not JSON is NOT an error: it surfaces as
//! [`Body::Raw`], which callers treat as a fallback value.

use core::fmt::Write as _;

use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ProtocolFault, Result};

use super::transport::{Connector, read_to_close, write_all};

const HEADER_END: &[u8] = b"\r\n\r\n";

// ───────────────────────────────────────────────────────────────
// Request
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Per-node request identity: target host and the static headers.
#[derive(Debug, Clone)]
pub struct RequestHeaders {
    pub host: String,
    pub api_key: String,
    pub user_agent: String,
}

/// Build the literal request bytes.
///
/// `Content-Type` and `Content-Length` are emitted only when a body is
/// present (POST).
pub fn encode_request(
    method: Method,
    path: &str,
    headers: &RequestHeaders,
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut head = String::with_capacity(192);
    // Writing into a String cannot fail.
    let _ = write!(head, "{} {} HTTP/1.1\r\n", method.as_str(), path);
    let _ = write!(head, "Host: {}\r\n", headers.host);
    let _ = write!(head, "X-Api-Key: {}\r\n", headers.api_key);
    let _ = write!(head, "User-Agent: {}\r\n", headers.user_agent);
    head.push_str("Accept: application/json\r\n");
    if let Some(body) = body {
        head.push_str("Content-Type: application/json\r\n");
        let _ = write!(head, "Content-Length: {}\r\n", body.len());
    }
    head.push_str("Connection: close\r\n\r\n");

    let mut out = head.into_bytes();
    if let Some(body) = body {
        out.extend_from_slice(body);
    }
    out
}

// ───────────────────────────────────────────────────────────────
// Response
// ───────────────────────────────────────────────────────────────

/// Response body: parsed JSON, or the bytes as text when parsing failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Raw(String),
}

impl Body {
    fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(v) => Self::Json(v),
            Err(_) => Self::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// JSON view of the body.  A raw body becomes `{"raw": <text>}`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(v) => v,
            Self::Raw(text) => serde_json::json!({ "raw": text }),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// `None` when the first line is not a recognisable status line.
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(HEADER_END.len()).position(|w| w == HEADER_END)
}

fn parse_status_line(line: &str) -> Option<u16> {
    let rest = line.strip_prefix("HTTP/")?;
    rest.split_whitespace().nth(1)?.parse().ok()
}

fn parse_head(head: &[u8]) -> (Option<u16>, Vec<(String, String)>) {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.split("\r\n");
    let status = lines.next().and_then(parse_status_line);
    let headers = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
        .collect();
    (status, headers)
}

/// Split raw response bytes on the first `\r\n\r\n` and decode.
///
/// Without a separator, the whole response is surfaced as a raw body.
/// Never fails.
pub fn parse_response(raw: &[u8]) -> HttpResponse {
    match find_header_end(raw) {
        Some(pos) => {
            let (status, headers) = parse_head(&raw[..pos]);
            HttpResponse {
                status,
                headers,
                body: Body::parse(&raw[pos + HEADER_END.len()..]),
            }
        }
        None => {
            let (status, _) = parse_head(raw);
            HttpResponse {
                status,
                headers: Vec::new(),
                body: Body::Raw(String::from_utf8_lossy(raw).into_owned()),
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// HttpTransport
// ───────────────────────────────────────────────────────────────

/// One request, one fresh connection, read until close.
///
/// Faults surface to the caller untouched; this layer never retries.
pub struct HttpTransport<C: Connector> {
    connector: C,
    headers: RequestHeaders,
    port: u16,
    max_response_bytes: usize,
}

impl<C: Connector> HttpTransport<C> {
    pub fn new(connector: C, headers: RequestHeaders, port: u16, max_response_bytes: usize) -> Self {
        Self {
            connector,
            headers,
            port,
            max_response_bytes,
        }
    }

    /// Perform one exchange.
    pub fn request(&mut self, method: Method, path: &str, body: Option<&[u8]>) -> Result<HttpResponse> {
        let request = encode_request(method, path, &self.headers, body);
        debug!("HTTP: {} {} ({} bytes)", method.as_str(), path, request.len());

        let mut conn = self.connector.open(&self.headers.host, self.port)?;
        write_all(&mut conn, &request)?;
        let raw = read_to_close(&mut conn, self.max_response_bytes)?;
        drop(conn);

        let resp = parse_response(&raw);
        info!(
            "HTTP: {} {} -> {:?} ({} bytes{})",
            method.as_str(),
            path,
            resp.status,
            raw.len(),
            if resp.body.is_raw() { ", raw body" } else { "" }
        );
        Ok(resp)
    }

    pub fn get(&mut self, path: &str) -> Result<HttpResponse> {
        self.request(Method::Get, path, None)
    }

    /// Serialise `payload` and POST it as JSON.
    pub fn post_json<T: Serialize>(&mut self, path: &str, payload: &T) -> Result<HttpResponse> {
        let body = serde_json::to_vec(payload).map_err(|_| ProtocolFault::Encode)?;
        self.request(Method::Post, path, Some(&body))
    }
}
