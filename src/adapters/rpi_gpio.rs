//! Raspberry Pi GPIO adapter on `rppal`.
//!
//! Inputs report both edges through an async interrupt; rppal calls the
//! handler on its own thread, which pushes into the port's edge queue.
//! Dropping an rppal pin restores its original mode, so [`reset`] only has
//! to drive outputs low and detach the interrupt first.
//!
//! [`reset`]: GpioPort::reset

use std::mem;

use log::{debug, warn};
use rppal::gpio::{self, InputPin, OutputPin, Pin, Trigger};

use crate::app::ports::{Gpio, GpioPort, PinMode, PortError};
use crate::channels::{EdgeEvent, EdgeStream, edge_stream};

fn invalid_state(pin: u8, op: &'static str, needs: &'static str) -> PortError {
    PortError::InvalidState { pin, op, needs }
}

fn driver_error(pin: u8, op: &'static str, e: gpio::Error) -> PortError {
    PortError::Driver {
        pin,
        op,
        reason: e.to_string(),
    }
}

/// Handle on the SoC's GPIO controller.
pub struct RpiGpio {
    gpio: gpio::Gpio,
}

impl RpiGpio {
    /// Open `/dev/gpiomem`.
    pub fn new() -> Result<Self, gpio::Error> {
        Ok(Self {
            gpio: gpio::Gpio::new()?,
        })
    }
}

impl Gpio for RpiGpio {
    type Port = RpiPort;

    fn acquire(&self, pin: u8) -> Result<RpiPort, PortError> {
        let line = self
            .gpio
            .get(pin)
            .map_err(|e| driver_error(pin, "acquire", e))?;
        Ok(RpiPort {
            pin,
            line: Line::Claimed(line),
        })
    }
}

enum Line {
    Claimed(Pin),
    Enabled(Pin),
    Input(InputPin),
    Output(OutputPin),
    Released,
}

pub struct RpiPort {
    pin: u8,
    line: Line,
}

impl GpioPort for RpiPort {
    fn pin(&self) -> u8 {
        self.pin
    }

    fn enable(&mut self) -> Result<(), PortError> {
        match mem::replace(&mut self.line, Line::Released) {
            Line::Claimed(pin) | Line::Enabled(pin) => {
                self.line = Line::Enabled(pin);
                Ok(())
            }
            other => {
                self.line = other;
                Err(invalid_state(self.pin, "enable", "a freshly acquired line"))
            }
        }
    }

    fn set_mode(&mut self, mode: PinMode) -> Result<(), PortError> {
        match mem::replace(&mut self.line, Line::Released) {
            Line::Enabled(pin) => {
                self.line = match mode {
                    PinMode::Input => Line::Input(pin.into_input()),
                    PinMode::OutputLow => Line::Output(pin.into_output_low()),
                };
                Ok(())
            }
            other => {
                self.line = other;
                Err(invalid_state(self.pin, "set_mode", "enable"))
            }
        }
    }

    fn set_value(&mut self, value: bool) -> Result<(), PortError> {
        let Line::Output(out) = &mut self.line else {
            return Err(invalid_state(self.pin, "set_value", "output mode"));
        };
        if value {
            out.set_high();
        } else {
            out.set_low();
        }
        Ok(())
    }

    fn values(&mut self) -> Result<EdgeStream, PortError> {
        let pin = self.pin;
        let Line::Input(input) = &mut self.line else {
            return Err(invalid_state(pin, "values", "input mode"));
        };
        let (sink, stream) = edge_stream();
        input
            .set_async_interrupt(Trigger::Both, None, move |event| {
                sink.push(EdgeEvent::now(event.trigger == Trigger::RisingEdge));
            })
            .map_err(|e| driver_error(pin, "values", e))?;
        Ok(stream)
    }

    fn reset(&mut self) {
        match mem::replace(&mut self.line, Line::Released) {
            Line::Input(mut input) => {
                // Drops the handler and with it the edge sink.
                if let Err(e) = input.clear_async_interrupt() {
                    warn!("gpio{}: clearing interrupt failed: {}", self.pin, e);
                }
            }
            Line::Output(mut out) => out.set_low(),
            Line::Claimed(_) | Line::Enabled(_) => {}
            Line::Released => return,
        }
        debug!("gpio{}: reset", self.pin);
    }
}

impl Drop for RpiPort {
    fn drop(&mut self) {
        self.reset();
    }
}
