//! Unified error type for the daemon.
//!
//! Every fatal condition funnels into [`Error`] so the process boundary can
//! log it once and pick an exit code.

use thiserror::Error;

use crate::app::ports::PortError;
use crate::app::runner::CommandError;
use crate::app::termination::TermSignal;
use crate::config::ConfigError;

/// Which of the two ports failed to come up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRole {
    Led,
    Button,
}

impl core::fmt::Display for PortRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Led => write!(f, "LED"),
            Self::Button => write!(f, "button listener"),
        }
    }
}

/// Every way the daemon can stop, other than the button stream closing.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected before any port was touched.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// GPIO setup failed; already-acquired ports were released.
    #[error("unable to activate {role} on port {pin}: {source}")]
    Port {
        role: PortRole,
        pin: u8,
        #[source]
        source: PortError,
    },

    /// The action command failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A termination signal was observed.
    #[error("signal received: {0}")]
    Terminated(TermSignal),
}

/// Daemon-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
