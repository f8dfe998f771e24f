use embedded_onewire::OneWireError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// DS18B20 errors
pub enum Ds18b20Error<E> {
    /// Errors of the 1-Wire bus.
    OneWire(OneWireError<E>),
    /// The ROM code does not belong to a DS18B20.
    NotDs18b20,
    /// A temperature conversion is still running.
    ConversionPending,
    /// The scratchpad failed its CRC check.
    InvalidCrc,
}

impl<E> Ds18b20Error<E> {
    /// Whether the operation may simply be retried later.
    ///
    /// A pending conversion or a corrupted read is not a fault of the bus.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConversionPending | Self::InvalidCrc | Self::OneWire(OneWireError::InvalidCrc)
        )
    }
}

impl<E> From<OneWireError<E>> for Ds18b20Error<E> {
    fn from(value: OneWireError<E>) -> Self {
        Self::OneWire(value)
    }
}
