//! Fuzz target: `parse_response`
//!
//! Drives arbitrary byte sequences into the HTTP response parser and
//! asserts that it never panics and that a raw fallback body always
//! carries the undecodable text.
//!
//! cargo fuzz run fuzz_response_parser

#![no_main]

use greenhouse_node::net::{Body, parse_response};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let resp = parse_response(data);

    if let Some(code) = resp.status {
        // A parsed status always came from an "HTTP/" status line.
        assert!(data.starts_with(b"HTTP/"), "status {code} without a status line");
    }

    // The raw fallback must still turn into a JSON value.
    let is_raw = matches!(resp.body, Body::Raw(_));
    let value = resp.body.into_value();
    if is_raw {
        assert!(value.get("raw").is_some(), "raw body lost its wrapper");
    }
});
