//! Daemon service: the hexagonal core.
//!
//! [`Daemon`] owns the configuration and the injected adapters. [`run`]
//! brings up both ports, starts the background tasks on a local executor
//! and drives the control loop until the button stream ends, a command
//! fails or a termination signal arrives.
//!
//! ```text
//!              ┌─────────────── LocalExecutor ───────────────┐
//!  Gpio ──────▶│ ButtonMonitor ──Trigger──▶ control loop     │──▶ EventSink
//!              │                              │  heartbeat    │
//!  Executor ◀──│                   CommandRunner  │           │
//!              │ LedDriver ◀────────Pulse─────────┘           │
//!              └──────────────────────────────────────────────┘
//! ```
//!
//! | State            | Leaves on                 | Next                      |
//! |------------------|---------------------------|---------------------------|
//! | `Idle`           | heartbeat                 | `Idle` (one pulse)        |
//! |                  | trigger                   | `CommandRunning`          |
//! |                  | trigger stream closed     | `Terminating` (clean)     |
//! |                  | termination signal        | `Terminating`             |
//! | `CommandRunning` | command succeeded         | `Idle`                    |
//! |                  | command failed            | `Terminating` (error)     |
//! | `Terminating`    | never                     |                           |
//!
//! [`run`]: Daemon::run

use std::mem;

use async_io_mini::Timer;
use edge_executor::LocalExecutor;
use futures_lite::future::{self, block_on};
use log::{debug, error, info};

use super::events::DaemonEvent;
use super::ports::{EventSink, Executor, Gpio};
use super::runner::{self, CommandRunner};
use super::termination::{TermSignal, Termination};
use crate::channels::{PulseQueue, Trigger, TriggerQueue};
use crate::config::DaemonConfig;
use crate::drivers::button::{self, ButtonMonitor};
use crate::drivers::status_led::{self, LedDriver};
use crate::error::{Error, PortRole, Result};

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    CommandRunning,
    /// Absorbing.
    Terminating,
}

pub struct Daemon<G, E, S> {
    config: DaemonConfig,
    gpio: G,
    executor: E,
    sink: S,
    state: State,
}

impl<G: Gpio, E: Executor, S: EventSink> Daemon<G, E, S> {
    pub fn new(config: DaemonConfig, gpio: G, executor: E, sink: S) -> Self {
        Self {
            config,
            gpio,
            executor,
            sink,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run until shutdown. Blocks the calling thread.
    ///
    /// Returns `Ok(())` when the button stream closes. Both ports are
    /// released on every path, the button first.
    pub fn run(&mut self, termination: &Termination) -> Result<()> {
        self.config.validate()?;

        let Self {
            config,
            gpio,
            executor,
            sink,
            state,
        } = self;

        let led_port = status_led::open(gpio, config.led_pin).map_err(|source| Error::Port {
            role: PortRole::Led,
            pin: config.led_pin,
            source,
        })?;
        let (button_port, edges) =
            button::open(gpio, config.button_pin).map_err(|source| Error::Port {
                role: PortRole::Button,
                pin: config.button_pin,
                source,
            })?;

        let pulses = PulseQueue::new();
        let triggers = TriggerQueue::new();
        let tasks: LocalExecutor<'_, 4> = LocalExecutor::new();

        let led_task = tasks.spawn(LedDriver::new(led_port).run(&pulses));
        let monitor_task = tasks.spawn(
            ButtonMonitor::new(config.target_level(), config.debounce()).run(
                button_port,
                edges,
                &triggers,
            ),
        );

        sink.emit(&DaemonEvent::Started {
            button_pin: config.button_pin,
            led_pin: config.led_pin,
            target_level: config.target_level(),
        });
        info!(
            "watching gpio{} for {} held {}, LED on gpio{}, action {}",
            config.button_pin,
            if config.target_level() { "high" } else { "low" },
            humantime::format_duration(config.debounce()),
            config.led_pin,
            config.command,
        );

        let mut session = Session {
            config,
            executor,
            sink,
            state,
            pulses: &pulses,
            triggers: &triggers,
            termination,
        };

        block_on(tasks.run(async {
            let result = session.control_loop().await;

            if monitor_task.cancel().await.is_none() {
                debug!("button monitor cancelled");
            }
            pulses.close();
            drop(led_task.await);
            info!("ports released");
            result
        }))
    }
}

enum Wake {
    Signal(TermSignal),
    Trigger(Option<Trigger>),
    Heartbeat,
}

/// Borrowed view of the daemon for the duration of one run.
struct Session<'a, E, S> {
    config: &'a DaemonConfig,
    executor: &'a E,
    sink: &'a mut S,
    state: &'a mut State,
    pulses: &'a PulseQueue,
    triggers: &'a TriggerQueue,
    termination: &'a Termination,
}

impl<E: Executor, S: EventSink> Session<'_, E, S> {
    async fn control_loop(&mut self) -> Result<()> {
        let triggers = self.triggers;
        let termination = self.termination;
        let mut beat = Timer::after(self.config.heartbeat());

        loop {
            let wake = future::or(
                async { Wake::Signal(termination.wait().await) },
                future::or(async { Wake::Trigger(triggers.recv().await) }, async {
                    (&mut beat).await;
                    Wake::Heartbeat
                }),
            )
            .await;

            match wake {
                Wake::Heartbeat => {
                    runner::pulse(self.pulses);
                    beat = Timer::after(self.config.heartbeat());
                }
                Wake::Trigger(Some(Trigger)) => {
                    self.enter(State::CommandRunning);
                    let runner =
                        CommandRunner::new(self.executor, self.pulses, self.config.busy_pulse());
                    match runner.run(&self.config.command).await {
                        Ok(output) => {
                            self.sink.emit(&DaemonEvent::CommandSucceeded {
                                command: self.config.command.to_string(),
                                output,
                            });
                            self.enter(State::Idle);
                            beat = Timer::after(self.config.heartbeat());
                        }
                        Err(e) => {
                            error!("{}", e);
                            self.enter(State::Terminating);
                            return Err(e.into());
                        }
                    }
                }
                Wake::Trigger(None) => {
                    info!("button stream closed");
                    self.enter(State::Terminating);
                    return Ok(());
                }
                Wake::Signal(signal) => {
                    info!("{} received, shutting down", signal);
                    self.enter(State::Terminating);
                    return Err(Error::Terminated(signal));
                }
            }
        }
    }

    fn enter(&mut self, to: State) {
        if *self.state == to {
            return;
        }
        let from = mem::replace(self.state, to);
        debug!("state {:?} -> {:?}", from, to);
        self.sink.emit(&DaemonEvent::StateChanged { from, to });
    }
}
