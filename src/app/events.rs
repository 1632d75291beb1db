//! Outbound daemon events.
//!
//! The [`Daemon`](super::service::Daemon) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them (log, count, assert on in tests).

use super::service::State;

/// Structured events emitted by the daemon core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// Both ports are configured and the background tasks are running.
    Started {
        button_pin: u8,
        led_pin: u8,
        /// Level the button must hold to trigger.
        target_level: bool,
    },

    /// The orchestrator moved between states.
    StateChanged { from: State, to: State },

    /// The action command exited successfully.
    CommandSucceeded {
        /// Quoted argv, as shown in logs.
        command: String,
        /// Combined stdout/stderr.
        output: String,
    },
}
