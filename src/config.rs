//! Daemon configuration
//!
//! All tunable parameters for the power-button daemon.
//! Values come from the command line (see [`cli`](crate::cli)); defaults match
//! a Raspberry Pi with the button on BCM 26 and the LED on BCM 19.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Program and arguments of the action command. Captured once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSpec(Vec<String>);

impl CommandSpec {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(argv.into_iter().map(Into::into).collect())
    }

    pub fn argv(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Renders as `'prog' 'arg1' 'arg2'`.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "'{arg}'")?;
        }
        Ok(())
    }
}

/// Core daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    // --- Button ---
    /// Trigger when the button line goes low (true) or high (false)
    pub active_low: bool,
    /// BCM line of the button
    pub button_pin: u8,
    /// Hold time before a press counts (milliseconds)
    pub debounce_ms: u64,

    // --- LED ---
    /// BCM line of the status LED
    pub led_pin: u8,
    /// Idle heartbeat toggle period (milliseconds)
    pub heartbeat_ms: u64,
    /// Toggle period while the command runs (milliseconds)
    pub busy_pulse_ms: u64,

    // --- Action ---
    pub command: CommandSpec,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            active_low: true,
            button_pin: 26,
            debounce_ms: 5_000,

            led_pin: 19,
            heartbeat_ms: 500,
            busy_pulse_ms: 200,

            command: CommandSpec::new(["shutdown", "-h", "now"]),
        }
    }
}

/// Reasons a configuration is rejected before the daemon starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid command: cannot be empty")]
    EmptyCommand,
    #[error("button and LED cannot share gpio{0}")]
    PinConflict(u8),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

impl DaemonConfig {
    /// Level the button line must hold to trigger.
    pub fn target_level(&self) -> bool {
        !self.active_low
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn busy_pulse(&self) -> Duration {
        Duration::from_millis(self.busy_pulse_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command.is_empty() {
            return Err(ConfigError::EmptyCommand);
        }
        if self.button_pin == self.led_pin {
            return Err(ConfigError::PinConflict(self.button_pin));
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::ZeroDuration("debounce"));
        }
        if self.heartbeat_ms == 0 {
            return Err(ConfigError::ZeroDuration("heartbeat"));
        }
        if self.busy_pulse_ms == 0 {
            return Err(ConfigError::ZeroDuration("busy pulse interval"));
        }
        Ok(())
    }
}
