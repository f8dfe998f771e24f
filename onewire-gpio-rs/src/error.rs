#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors of the bit-banged bus master.
pub enum OneWireGpioError<E> {
    /// GPIO pin errors.
    Pin(E),
    /// The line did not float high after being released; the pull-up is missing or the bus is shorted.
    LineStuckLow,
}

impl<E> From<E> for OneWireGpioError<E> {
    fn from(value: E) -> Self {
        Self::Pin(value)
    }
}
