//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing daemon events through the `log`
//! facade (stderr via `env_logger` in the binary).

use log::info;

use crate::app::events::DaemonEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`DaemonEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DaemonEvent) {
        match event {
            DaemonEvent::Started {
                button_pin,
                led_pin,
                target_level,
            } => {
                info!(
                    "START | button=gpio{} trigger={} | led=gpio{}",
                    button_pin,
                    if *target_level { "high" } else { "low" },
                    led_pin,
                );
            }
            DaemonEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            DaemonEvent::CommandSucceeded { command, output } => {
                let output = output.trim_end();
                if output.is_empty() {
                    info!("DONE  | {}", command);
                } else {
                    info!("DONE  | {} | {}", command, output);
                }
            }
        }
    }
}
