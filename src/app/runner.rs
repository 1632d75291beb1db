//! Command runner.
//!
//! Runs the configured action while the LED shows "busy": one pulse up
//! front, then a pulse every busy interval until the command returns.
//!
//! ```text
//!  pulse ─┬─ execute(argv) ───────────────┬─ stop ─▶ ack ─▶ return
//!         └─ ticker: pulse … pulse … pulse ┘
//! ```
//!
//! The ticker runs as a second future joined with the command, so by the
//! time [`CommandRunner::run`] returns the ticker has finished and no pulse
//! from this invocation can arrive later.

use std::fmt;
use std::io;
use std::time::Duration;

use async_io_mini::Timer;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, info, warn};
use thiserror::Error;

use super::ports::{Executor, Outcome};
use crate::channels::{Pulse, PulseQueue, Rejected};
use crate::config::CommandSpec;

/// Why a command did not succeed.
#[derive(Debug)]
pub enum Failure {
    /// The program could not be started.
    Launch(io::Error),
    /// Exited with a non-zero code.
    Exit(i32),
    /// Killed by a signal.
    Killed,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch(e) => write!(f, "launch failed: {}", e),
            Self::Exit(code) => write!(f, "exit status {}", code),
            Self::Killed => write!(f, "killed by signal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid command: cannot be empty")]
    Invalid,

    #[error("command {} failed ({failure}); output: {output}", CommandSpec::new(argv.iter().cloned()))]
    Failed {
        argv: Vec<String>,
        failure: Failure,
        /// Combined stdout/stderr, lossily decoded.
        output: String,
    },
}

pub struct CommandRunner<'a, E> {
    executor: &'a E,
    pulses: &'a PulseQueue,
    busy_interval: Duration,
}

impl<'a, E: Executor> CommandRunner<'a, E> {
    pub fn new(executor: &'a E, pulses: &'a PulseQueue, busy_interval: Duration) -> Self {
        Self {
            executor,
            pulses,
            busy_interval,
        }
    }

    /// Run `command` to completion. Returns its combined output on success.
    pub async fn run(&self, command: &CommandSpec) -> Result<String, CommandError> {
        if command.is_empty() {
            return Err(CommandError::Invalid);
        }
        let argv = command.argv();

        info!("running {}", command);
        pulse(self.pulses);

        let stop: Signal<CriticalSectionRawMutex, ()> = Signal::new();
        let work = async {
            let result = self.executor.execute(argv).await;
            stop.signal(());
            result
        };
        let (result, ticks) = future::zip(work, self.tick_until(&stop)).await;
        debug!("busy ticker stopped after {} pulses", ticks);

        match result {
            Ok(Outcome { code: Some(0), output }) => {
                let output = String::from_utf8_lossy(&output).into_owned();
                info!("{} succeeded", command);
                Ok(output)
            }
            Ok(Outcome { code, output }) => Err(CommandError::Failed {
                argv: argv.to_vec(),
                failure: code.map_or(Failure::Killed, Failure::Exit),
                output: String::from_utf8_lossy(&output).into_owned(),
            }),
            Err(e) => Err(CommandError::Failed {
                argv: argv.to_vec(),
                failure: Failure::Launch(e),
                output: String::new(),
            }),
        }
    }

    /// Pulse every busy interval until `stop` fires. Resolving is the
    /// acknowledgement.
    async fn tick_until(&self, stop: &Signal<CriticalSectionRawMutex, ()>) -> u32 {
        let mut ticks = 0;
        loop {
            let stopped = future::or(
                async {
                    stop.wait().await;
                    true
                },
                async {
                    Timer::after(self.busy_interval).await;
                    false
                },
            )
            .await;
            if stopped {
                return ticks;
            }
            pulse(self.pulses);
            ticks += 1;
        }
    }
}

/// Enqueue one LED pulse; a full queue only costs a blink.
pub(crate) fn pulse(pulses: &PulseQueue) {
    match pulses.try_send(Pulse) {
        Ok(()) => {}
        Err(Rejected::Full) => warn!("pulse queue full, dropping pulse"),
        Err(Rejected::Closed) => debug!("pulse after LED shutdown"),
    }
}
