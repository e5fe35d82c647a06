//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the greenhouse node:
//! auto-control thresholds, override handling, change-detected telemetry
//! and remote command application.  All interaction with hardware and
//! the network happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
pub mod telemetry;
