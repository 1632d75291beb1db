//! Port traits: the hexagonal boundary between the daemon core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Daemon (core)
//! ```
//!
//! Driven adapters (GPIO chips, process launchers, event sinks) implement
//! these traits. The [`Daemon`](super::service::Daemon) consumes them via
//! generics, so the core never touches `/dev/gpiomem` or `fork()` directly.

use core::future::Future;
use std::io;

use thiserror::Error;

use super::events::DaemonEvent;
use crate::channels::EdgeStream;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: core ↔ pin)
// ───────────────────────────────────────────────────────────────

/// Electrical configuration applied by [`GpioPort::set_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Input, edges reported through [`GpioPort::values`].
    Input,
    /// Output, initially driven low.
    OutputLow,
}

/// A GPIO controller that hands out one port per line.
pub trait Gpio {
    type Port: GpioPort;

    /// Claim `pin` for exclusive use.
    fn acquire(&self, pin: u8) -> Result<Self::Port, PortError>;
}

/// Exclusive handle on a single GPIO line.
///
/// The lifecycle is `acquire → enable → set_mode → (set_value | values)
/// → reset`. [`reset`](Self::reset) must be idempotent and safe to call at
/// any point of that sequence, including on a handle whose setup failed.
pub trait GpioPort {
    /// BCM line number.
    fn pin(&self) -> u8;

    fn enable(&mut self) -> Result<(), PortError>;

    fn set_mode(&mut self, mode: PinMode) -> Result<(), PortError>;

    /// Drive an output line. `true` = high.
    fn set_value(&mut self, value: bool) -> Result<(), PortError>;

    /// Subscribe to level changes of an input line.
    ///
    /// Buffered to [`EDGE_DEPTH`](crate::channels::EDGE_DEPTH) events; the
    /// stream ends when the port is reset or the driver tears down.
    fn values(&mut self) -> Result<EdgeStream, PortError>;

    /// Return the line to a safe state and release it.
    fn reset(&mut self);
}

/// Errors from [`Gpio`] and [`GpioPort`] operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The driver refused the operation.
    #[error("gpio{pin}: {op} failed: {reason}")]
    Driver {
        pin: u8,
        op: &'static str,
        reason: String,
    },
    /// Operation issued out of lifecycle order.
    #[error("gpio{pin}: {op} requires {needs}")]
    InvalidState {
        pin: u8,
        op: &'static str,
        needs: &'static str,
    },
}

impl embedded_hal::digital::Error for PortError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

// ───────────────────────────────────────────────────────────────
// Command executor (driven adapter: core → child process)
// ───────────────────────────────────────────────────────────────

/// Result of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Interleaved stdout and stderr.
    pub output: Vec<u8>,
}

impl Outcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an argv-style command to completion.
///
/// Must not block the calling executor: the returned future only resolves
/// once the child exits, and other tasks keep running meanwhile.
pub trait Executor {
    /// `argv[0]` is the program. Callers guarantee `argv` is non-empty.
    fn execute(&self, argv: &[String]) -> impl Future<Output = io::Result<Outcome>>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: core → logging)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`DaemonEvent`]s through this port.
/// Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &DaemonEvent);
}
