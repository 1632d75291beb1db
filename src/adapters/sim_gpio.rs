//! In-memory GPIO simulator.
//!
//! Implements [`Gpio`] without hardware: every pin records its lifecycle
//! (claimed, enabled, mode, writes, released) and input levels are injected
//! with [`SimGpio::set_level`]. Used by the host tests and by the daemon's
//! `--simulate` mode.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::{Gpio, GpioPort, PinMode, PortError};
use crate::channels::{EdgeEvent, EdgeSink, EdgeStream, edge_stream};

#[derive(Default)]
struct SimPin {
    claimed: bool,
    enabled: bool,
    mode: Option<PinMode>,
    writes: Vec<bool>,
    resets: usize,
    edges: Option<EdgeSink>,
}

#[derive(Default)]
struct SimState {
    pins: HashMap<u8, SimPin>,
    fail_acquire: HashSet<u8>,
    fail_values: HashSet<u8>,
}

/// Shared simulator handle; clones observe the same pins.
#[derive(Clone, Default)]
pub struct SimGpio {
    state: Arc<Mutex<SimState>>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A panicking test thread must not hide the pin history from the rest.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Make the next `acquire(pin)` fail.
    pub fn fail_acquire(&self, pin: u8) {
        self.lock().fail_acquire.insert(pin);
    }

    /// Make `values()` on `pin` fail.
    pub fn fail_values(&self, pin: u8) {
        self.lock().fail_values.insert(pin);
    }

    /// Report a level change on an input pin.
    /// Returns `false` if nobody is subscribed to the pin.
    pub fn set_level(&self, pin: u8, level: bool) -> bool {
        let state = self.lock();
        match state.pins.get(&pin).and_then(|p| p.edges.as_ref()) {
            Some(sink) => {
                sink.push(EdgeEvent::now(level));
                true
            }
            None => false,
        }
    }

    /// End the edge stream of `pin`, as a driver teardown would.
    pub fn close_input(&self, pin: u8) {
        if let Some(p) = self.lock().pins.get_mut(&pin) {
            p.edges = None;
        }
    }

    /// Whether an edge stream is open on `pin`.
    pub fn is_subscribed(&self, pin: u8) -> bool {
        self.lock().pins.get(&pin).is_some_and(|p| p.edges.is_some())
    }

    pub fn is_claimed(&self, pin: u8) -> bool {
        self.lock().pins.get(&pin).is_some_and(|p| p.claimed)
    }

    pub fn is_enabled(&self, pin: u8) -> bool {
        self.lock().pins.get(&pin).is_some_and(|p| p.enabled)
    }

    /// Claimed at some point and reset since.
    pub fn is_released(&self, pin: u8) -> bool {
        self.lock()
            .pins
            .get(&pin)
            .is_some_and(|p| !p.claimed && p.resets > 0)
    }

    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.lock().pins.get(&pin).and_then(|p| p.mode)
    }

    /// Every value written to `pin`, oldest first.
    pub fn writes(&self, pin: u8) -> Vec<bool> {
        self.lock()
            .pins
            .get(&pin)
            .map(|p| p.writes.clone())
            .unwrap_or_default()
    }

    /// Last value written to `pin`.
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.lock().pins.get(&pin).and_then(|p| p.writes.last().copied())
    }
}

impl Gpio for SimGpio {
    type Port = SimPort;

    fn acquire(&self, pin: u8) -> Result<SimPort, PortError> {
        let mut state = self.lock();
        if state.fail_acquire.contains(&pin) {
            return Err(PortError::Driver {
                pin,
                op: "acquire",
                reason: "simulated failure".into(),
            });
        }
        let entry = state.pins.entry(pin).or_default();
        if entry.claimed {
            return Err(PortError::Driver {
                pin,
                op: "acquire",
                reason: "line busy".into(),
            });
        }
        entry.claimed = true;
        Ok(SimPort {
            pin,
            gpio: self.clone(),
        })
    }
}

/// Drive `pin` from text lines: `0`/`low` or `1`/`high`, one per line.
///
/// Waits for the pin's edge stream to open first. End of input closes the
/// stream, which the daemon treats as the button going away.
pub fn feed_lines<R: BufRead>(gpio: &SimGpio, pin: u8, input: R) {
    while !gpio.is_subscribed(pin) {
        thread::sleep(Duration::from_millis(10));
    }
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("gpio{}(sim): read failed: {}", pin, e);
                break;
            }
        };
        let level = match line.trim() {
            "" => continue,
            "0" | "low" => false,
            "1" | "high" => true,
            other => {
                warn!("gpio{}(sim): expected 0/1/low/high, got {:?}", pin, other);
                continue;
            }
        };
        if !gpio.set_level(pin, level) {
            break;
        }
    }
    info!("gpio{}(sim): input ended", pin);
    gpio.close_input(pin);
}

/// One simulated line.
pub struct SimPort {
    pin: u8,
    gpio: SimGpio,
}

impl SimPort {
    fn with<R>(&self, f: impl FnOnce(&mut SimPin) -> R) -> R {
        let mut state = self.gpio.lock();
        f(state.pins.entry(self.pin).or_default())
    }
}

impl GpioPort for SimPort {
    fn pin(&self) -> u8 {
        self.pin
    }

    fn enable(&mut self) -> Result<(), PortError> {
        self.with(|p| p.enabled = true);
        Ok(())
    }

    fn set_mode(&mut self, mode: PinMode) -> Result<(), PortError> {
        let pin = self.pin;
        self.with(|p| {
            if !p.enabled {
                return Err(PortError::InvalidState {
                    pin,
                    op: "set_mode",
                    needs: "enable",
                });
            }
            p.mode = Some(mode);
            Ok(())
        })
    }

    fn set_value(&mut self, value: bool) -> Result<(), PortError> {
        let pin = self.pin;
        self.with(|p| {
            if p.mode != Some(PinMode::OutputLow) {
                return Err(PortError::InvalidState {
                    pin,
                    op: "set_value",
                    needs: "output mode",
                });
            }
            p.writes.push(value);
            Ok(())
        })
    }

    fn values(&mut self) -> Result<EdgeStream, PortError> {
        let pin = self.pin;
        if self.gpio.lock().fail_values.contains(&pin) {
            return Err(PortError::Driver {
                pin,
                op: "values",
                reason: "simulated failure".into(),
            });
        }
        self.with(|p| {
            if p.mode != Some(PinMode::Input) {
                return Err(PortError::InvalidState {
                    pin,
                    op: "values",
                    needs: "input mode",
                });
            }
            let (sink, stream) = edge_stream();
            p.edges = Some(sink);
            Ok(stream)
        })
    }

    fn reset(&mut self) {
        let pin = self.pin;
        self.with(|p| {
            if !p.claimed {
                return;
            }
            if p.mode == Some(PinMode::OutputLow) && p.writes.last() != Some(&false) {
                p.writes.push(false);
            }
            p.edges = None;
            p.enabled = false;
            p.mode = None;
            p.claimed = false;
            p.resets += 1;
            debug!("gpio{}(sim): reset", pin);
        });
    }
}
