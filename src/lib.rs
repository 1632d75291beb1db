//! powerman: power-button daemon library.
//!
//! Watches a GPIO button, and once it has been held for the debounce period
//! runs a configured command (by default `shutdown -h now`) while a status
//! LED shows a heartbeat or a faster busy blink.
//!
//! Everything except the `rpi_gpio` and `signals` adapters runs on any host,
//! which is how the integration tests drive the daemon end to end.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channels;
pub mod cli;
pub mod config;
pub mod drivers;
pub mod error;

pub use error::{Error, PortRole, Result};
