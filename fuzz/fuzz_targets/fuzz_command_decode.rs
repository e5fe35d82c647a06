//! Fuzz target: `RemoteCommand::from_json`
//!
//! Any bytes that parse as JSON must decode to a command without
//! panicking, and a present field must mirror a JSON boolean.
//!
//! cargo fuzz run fuzz_command_decode

#![no_main]

use greenhouse_node::app::commands::RemoteCommand;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let cmd = RemoteCommand::from_json(&value);

    if let Some(pump) = cmd.pump {
        assert_eq!(value.get("pump").and_then(Value::as_bool), Some(pump));
    }
    if let Some(fan) = cmd.fan {
        assert_eq!(value.get("fan").and_then(Value::as_bool), Some(fan));
    }
    if !value.is_object() {
        assert!(cmd.is_empty());
    }
});
