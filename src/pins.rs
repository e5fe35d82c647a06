//! GPIO pin assignments for the greenhouse node board.
//!
//! Single source of truth: `main` wires every driver from these
//! constants rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Actuator relays
// ---------------------------------------------------------------------------

/// Irrigation pump relay.
pub const PUMP_RELAY_GPIO: i32 = 14;
/// Ventilation fan relay.
pub const FAN_RELAY_GPIO: i32 = 15;

/// Set for opto-isolated relay boards that close on a LOW input.
pub const PUMP_RELAY_ACTIVE_LOW: bool = false;
pub const FAN_RELAY_ACTIVE_LOW: bool = false;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Single indicator LED (active HIGH).
pub const STATUS_LED_GPIO: i32 = 2;
