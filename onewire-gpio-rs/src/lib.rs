#![no_std]
#![deny(missing_docs)]

/*! # onewire-gpio
 *
 * A bit-banged 1-Wire bus master on a single open-drain GPIO pin.
 *
 * The pin must implement both [`InputPin`](embedded_hal::digital::InputPin) and
 * [`OutputPin`](embedded_hal::digital::OutputPin) from `embedded-hal` 1.0 and be configured
 * open-drain with a pull-up (typically 4.7 kΩ to the sensor supply): `set_high` releases the
 * line, `set_low` drives it, and the input side samples it. All slot timing comes from a
 * [`DelayNs`](embedded_hal::delay::DelayNs) implementation, which must busy-wait at least the
 * requested time.
 *
 * The timing critical sections are not protected against interrupts. If the application has
 * interrupt handlers that can run longer than a few microseconds, wrap bus transactions in a
 * critical section.
 */

pub use embedded_onewire::{OneWire, OneWireError, OneWireResult};
mod error;
mod onewire;

pub use error::OneWireGpioError;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use embedded_onewire::OneWireStatus;

/// Results of GPIO-specific function calls.
pub type OneWireGpioResult<T, E> = Result<T, OneWireGpioError<E>>;

/// Time slot durations, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Duration of the reset pulse.
    pub reset_low: u32,
    /// Time between releasing the reset pulse and sampling the presence pulse.
    pub presence_sample: u32,
    /// Remainder of the presence detect window after the sample.
    pub reset_recovery: u32,
    /// Time the line is held low to open a time slot.
    pub slot_start: u32,
    /// Time between opening a read slot and sampling the line.
    pub read_sample: u32,
    /// Length of a time slot.
    pub slot: u32,
    /// Time the line is released between two slots.
    pub recovery: u32,
}

impl Timing {
    /// Standard speed timing.
    pub const fn standard() -> Self {
        Self {
            reset_low: 480,
            presence_sample: 70,
            reset_recovery: 410,
            slot_start: 1,
            read_sample: 14,
            slot: 60,
            recovery: 2,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::standard()
    }
}

/// Line state observed during a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStatus {
    presence: bool,
    shorted: bool,
}

impl OneWireStatus for LineStatus {
    fn presence(&self) -> bool {
        self.presence
    }

    fn shortcircuit(&self) -> bool {
        self.shorted
    }
}

/// A bit-banged 1-Wire bus master.
///
/// Takes ownership of an open-drain pin and a timer object implementing the
/// [`DelayNs`](embedded_hal::delay::DelayNs) trait.
pub struct OneWireGpio<P, D> {
    pub(crate) pin: P,
    pub(crate) delay: D,
    pub(crate) timing: Timing,
}

/// Builder for creating a [`OneWireGpio`] instance with custom configuration.
#[derive(Debug, Default)]
pub struct OneWireGpioBuilder {
    pub(crate) timing: Timing,
}

impl OneWireGpioBuilder {
    /// Sets the slot timing.
    ///
    /// Slow GPIO back ends (e.g. a Linux character device) spend a noticeable time in every pin
    /// access; shorten the delays to compensate.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Builds a new `OneWireGpio` instance.
    ///
    /// Releases the line and checks that it floats high.
    pub fn build<P: InputPin + OutputPin, D: DelayNs>(
        self,
        pin: P,
        delay: D,
    ) -> OneWireGpioResult<OneWireGpio<P, D>, P::Error> {
        let mut dev = OneWireGpio {
            pin,
            delay,
            timing: self.timing,
        };
        dev.release()?;
        dev.delay.delay_us(dev.timing.recovery);
        if !dev.sample()? {
            log::warn!("1-Wire line is held low after release");
            return Err(OneWireGpioError::LineStuckLow);
        }
        Ok(dev)
    }
}

impl<P, D> OneWireGpio<P, D> {
    /// Current slot timing.
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Release the pin and the timer.
    pub fn free(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P: InputPin + OutputPin, D: DelayNs> OneWireGpio<P, D> {
    pub(crate) fn drive_low(&mut self) -> OneWireGpioResult<(), P::Error> {
        Ok(self.pin.set_low()?)
    }

    pub(crate) fn release(&mut self) -> OneWireGpioResult<(), P::Error> {
        Ok(self.pin.set_high()?)
    }

    pub(crate) fn sample(&mut self) -> OneWireGpioResult<bool, P::Error> {
        Ok(self.pin.is_high()?)
    }
}
