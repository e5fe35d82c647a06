//! Greenhouse node firmware library.
//!
//! Exposes the control core, network stack and scheduler for
//! integration testing and host simulation.  All ESP-IDF-specific code
//! is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fsm;
pub mod net;
pub mod pins;
pub mod scheduler;
pub mod supervisor;

pub mod adapters;
pub mod drivers;
pub mod sensors;
