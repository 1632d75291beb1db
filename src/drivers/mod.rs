//! Pin-level drivers: button hold detection, status LED, port ownership.

pub mod button;
pub mod port_guard;
pub mod status_led;
