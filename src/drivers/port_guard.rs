//! Scoped ownership of a GPIO port.
//!
//! A [`PortGuard`] resets its port when dropped, so every exit path
//! (setup error, task cancellation, normal shutdown) leaves the line in a
//! safe state without explicit cleanup calls.

use core::ops::{Deref, DerefMut};

use embedded_hal::digital::{ErrorType, OutputPin};
use log::debug;

use crate::app::ports::{GpioPort, PortError};

pub struct PortGuard<P: GpioPort> {
    port: P,
}

impl<P: GpioPort> PortGuard<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }
}

impl<P: GpioPort> Deref for PortGuard<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.port
    }
}

impl<P: GpioPort> DerefMut for PortGuard<P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

impl<P: GpioPort> Drop for PortGuard<P> {
    fn drop(&mut self) {
        debug!("gpio{}: releasing", self.port.pin());
        self.port.reset();
    }
}

// ── embedded-hal output view ──────────────────────────────────

impl<P: GpioPort> ErrorType for PortGuard<P> {
    type Error = PortError;
}

impl<P: GpioPort> OutputPin for PortGuard<P> {
    fn set_low(&mut self) -> Result<(), PortError> {
        self.port.set_value(false)
    }

    fn set_high(&mut self) -> Result<(), PortError> {
        self.port.set_value(true)
    }
}
