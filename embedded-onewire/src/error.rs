/// One wire communication error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneWireError<E> {
    /// Encapsulates the error type from the underlying hardware.
    Other(E),
    /// Indicates that no device answered the reset pulse with a presence pulse.
    NoDevicePresent,
    /// Indicates that the line stayed low after a reset, i.e. the bus is shorted to ground.
    ShortCircuit,
    /// Computed CRC of a ROM or of a block of data read from a device is invalid.
    InvalidCrc,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Other(other)
    }
}
