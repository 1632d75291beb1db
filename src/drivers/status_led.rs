//! Status LED pulse driver.
//!
//! One discrete LED on a digital output. Each [`Pulse`] flips the LED, so the
//! blink rate is set entirely by how often producers enqueue pulses: the
//! idle heartbeat and the faster busy ticker share this one consumer.
//!
//! Generic over [`embedded_hal::digital::OutputPin`]; in the daemon the pin
//! is a [`PortGuard`], in tests any recording pin will do.

use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, info, warn};

use crate::app::ports::{Gpio, GpioPort, PinMode, PortError};
use crate::channels::{Pulse, PulseQueue};
use crate::drivers::port_guard::PortGuard;

pub struct LedDriver<P> {
    pin: P,
    lit: bool,
    toggles: u64,
}

impl<P: OutputPin> LedDriver<P> {
    /// Take over a pin that is already driven low.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            lit: false,
            toggles: 0,
        }
    }

    /// Flip the output once.
    pub fn toggle(&mut self) -> Result<(), P::Error> {
        let next = !self.lit;
        self.pin.set_state(PinState::from(next))?;
        self.lit = next;
        self.toggles += 1;
        Ok(())
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Toggles applied since construction.
    pub fn toggles(&self) -> u64 {
        self.toggles
    }

    /// Apply pulses in arrival order until the queue is closed and drained.
    /// Hands the pin back so the caller controls when it is released.
    pub async fn run(mut self, pulses: &PulseQueue) -> P {
        while let Some(Pulse) = pulses.recv().await {
            if let Err(e) = self.toggle() {
                warn!("LED toggle failed: {:?}", e);
            }
        }
        debug!("LED driver stopped after {} toggles", self.toggles);
        self.pin
    }
}

/// Acquire `pin` as the LED output, driven low.
///
/// On any failure the partially configured port is reset (low) before
/// returning.
pub fn open<G: Gpio>(gpio: &G, pin: u8) -> Result<PortGuard<G::Port>, PortError> {
    let mut port = PortGuard::new(gpio.acquire(pin)?);
    port.enable()?;
    port.set_mode(PinMode::OutputLow)?;
    port.set_value(false)?;
    info!("gpio{}: LED output ready", pin);
    Ok(port)
}
