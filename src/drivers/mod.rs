//! Output drivers: actuator relays and the status LED.

pub mod relay;
pub mod status_led;
