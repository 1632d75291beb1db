//! Termination source.
//!
//! Process signals arrive on a foreign thread (see
//! [`adapters::signals`](crate::adapters::signals)); the orchestrator awaits
//! them alongside its timers and queues. The source is passed explicitly into
//! [`Daemon::run`](super::service::Daemon::run) rather than living in a global.

use std::fmt;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Signals that ask the daemon to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    Hangup,
    Interrupt,
    Terminate,
    Quit,
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hangup => write!(f, "SIGHUP"),
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
            Self::Quit => write!(f, "SIGQUIT"),
        }
    }
}

/// Cloneable, thread-safe handle: any clone may [`notify`](Self::notify),
/// the orchestrator [`wait`](Self::wait)s.
#[derive(Clone, Default)]
pub struct Termination(Arc<Signal<CriticalSectionRawMutex, TermSignal>>);

impl Termination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a signal. Later deliveries overwrite an unobserved earlier one.
    pub fn notify(&self, signal: TermSignal) {
        self.0.signal(signal);
    }

    pub async fn wait(&self) -> TermSignal {
        self.0.wait().await
    }

    /// Whether a signal is pending and not yet observed.
    pub fn is_pending(&self) -> bool {
        self.0.signaled()
    }
}
