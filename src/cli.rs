//! Command-line surface.
//!
//! ```text
//! powerman [--activelow[=BOOL]] [--button PIN] [--led PIN] [--debounce DUR]
//!          [--heartbeat DUR] [--busy-interval DUR] [--simulate] COMMAND [ARGS]...
//! ```
//!
//! Durations use `humantime` syntax (`5s`, `250ms`, `1m 30s`).

use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::config::{CommandSpec, DaemonConfig};

#[derive(Debug, Parser)]
#[command(
    name = "powerman",
    version,
    about = "Run a command when a GPIO button is held, with LED feedback"
)]
pub struct Cli {
    /// Trigger when the button pulls the line low
    #[arg(
        long = "activelow",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        require_equals = true,
        value_name = "BOOL"
    )]
    pub active_low: bool,

    /// BCM line of the button
    #[arg(long, default_value_t = 26, value_name = "PIN")]
    pub button: u8,

    /// BCM line of the status LED
    #[arg(long, default_value_t = 19, value_name = "PIN")]
    pub led: u8,

    /// How long the button must be held
    #[arg(long, default_value = "5s", value_parser = parse_millis, value_name = "DUR")]
    pub debounce: Duration,

    /// LED toggle period while idle
    #[arg(long, default_value = "500ms", value_parser = parse_millis, value_name = "DUR")]
    pub heartbeat: Duration,

    /// LED toggle period while the command runs
    #[arg(long, default_value = "200ms", value_parser = parse_millis, value_name = "DUR")]
    pub busy_interval: Duration,

    /// Use an in-memory GPIO; button levels are read from stdin (0/1/low/high)
    #[arg(long)]
    pub simulate: bool,

    /// Command to run once the button is held, with its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// `humantime` duration, restricted to whole milliseconds.
fn parse_millis(arg: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(arg).map_err(|e| e.to_string())?;
    if duration.subsec_nanos() % 1_000_000 != 0 {
        return Err(format!("{arg} is finer than a millisecond"));
    }
    Ok(duration)
}

impl Cli {
    pub fn into_config(self) -> DaemonConfig {
        DaemonConfig {
            active_low: self.active_low,
            button_pin: self.button,
            debounce_ms: self.debounce.as_millis() as u64,
            led_pin: self.led,
            heartbeat_ms: self.heartbeat.as_millis() as u64,
            busy_pulse_ms: self.busy_interval.as_millis() as u64,
            command: CommandSpec::new(self.command),
        }
    }
}
