//! Debounced hold detection for the power button.
//!
//! ## Hardware
//!
//! Momentary switch on one input line, active-low by default (external
//! pull-up). The GPIO adapter reports every level change as an
//! [`EdgeEvent`]; [`ButtonMonitor`] turns that stream into at most one
//! [`Trigger`] per qualifying hold.
//!
//! ## Hold rules
//!
//! | Edge                               | Effect                          |
//! |------------------------------------|---------------------------------|
//! | Transition into the target level   | (Re)start the hold deadline     |
//! | Repeat of the target level         | None, current hold continues    |
//! | Any other level                    | Cancel the deadline             |
//! | Deadline passes uninterrupted      | Emit one trigger, clear         |

use std::time::{Duration, Instant};

use async_io_mini::Timer;
use futures_lite::future;
use log::{debug, info};

use crate::app::ports::{Gpio, GpioPort, PinMode, PortError};
use crate::channels::{EdgeStream, Rejected, Trigger, TriggerQueue};
use crate::drivers::port_guard::PortGuard;

/// Pure hold-timing state machine. Time is passed in, never read.
#[derive(Debug, Clone)]
pub struct Debouncer {
    target: bool,
    hold: Duration,
    level: Option<bool>,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(target: bool, hold: Duration) -> Self {
        Self {
            target,
            hold,
            level: None,
            deadline: None,
        }
    }

    /// Apply an edge observed at `at`.
    ///
    /// Returns `true` when a pending deadline had already elapsed by `at`,
    /// i.e. the previous hold completed before this edge arrived.
    pub fn on_edge(&mut self, value: bool, at: Instant) -> bool {
        let fired = self.expire(at);
        let entered = self.level != Some(value);
        self.level = Some(value);

        if value != self.target {
            self.deadline = None;
        } else if entered {
            self.deadline = Some(at + self.hold);
        }
        fired
    }

    /// Fire the deadline if it has passed by `now`.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn target(&self) -> bool {
        self.target
    }
}

enum Wake {
    Edge(Option<crate::channels::EdgeEvent>),
    Deadline,
}

/// Long-lived task that owns the button port.
pub struct ButtonMonitor {
    debouncer: Debouncer,
}

impl ButtonMonitor {
    pub fn new(target: bool, hold: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(target, hold),
        }
    }

    /// Watch `edges` until the stream ends, then close `triggers`.
    ///
    /// The port is only held so that it is released when the monitor stops
    /// or is cancelled.
    pub async fn run<P: GpioPort>(
        mut self,
        port: PortGuard<P>,
        mut edges: EdgeStream,
        triggers: &TriggerQueue,
    ) {
        let pin = port.pin();
        let mut deadline: Option<Timer> = None;

        loop {
            let wake = future::or(async { Wake::Edge(edges.next().await) }, async {
                match deadline.as_mut() {
                    Some(timer) => {
                        timer.await;
                    }
                    None => future::pending::<()>().await,
                }
                Wake::Deadline
            })
            .await;

            match wake {
                Wake::Edge(Some(edge)) => {
                    debug!("gpio{}: edge {}", pin, edge.value);
                    if self.debouncer.on_edge(edge.value, edge.at) {
                        Self::emit(pin, triggers);
                    }
                    deadline = self
                        .debouncer
                        .deadline()
                        .map(|at| Timer::after(at.saturating_duration_since(Instant::now())));
                }
                Wake::Edge(None) => break,
                Wake::Deadline => {
                    deadline = None;
                    if self.debouncer.expire(Instant::now()) {
                        Self::emit(pin, triggers);
                    }
                }
            }
        }

        info!("gpio{}: edge stream closed, button monitor stopping", pin);
        triggers.close();
        drop(port);
    }

    fn emit(pin: u8, triggers: &TriggerQueue) {
        match triggers.try_send(Trigger) {
            Ok(()) => info!("gpio{}: hold detected", pin),
            Err(Rejected::Full) => debug!("gpio{}: hold detected, trigger already pending", pin),
            Err(Rejected::Closed) => debug!("gpio{}: hold detected after shutdown", pin),
        }
    }
}

/// Acquire `pin` as the button input and subscribe to its edges.
///
/// On any failure the partially configured port is reset before returning.
pub fn open<G: Gpio>(gpio: &G, pin: u8) -> Result<(PortGuard<G::Port>, EdgeStream), PortError> {
    let mut port = PortGuard::new(gpio.acquire(pin)?);
    port.enable()?;
    port.set_mode(PinMode::Input)?;
    let edges = port.values()?;
    info!("gpio{}: button input ready", pin);
    Ok((port, edges))
}
