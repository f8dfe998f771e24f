use crate::{
    ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_ROM_CMD, ONEWIRE_SKIP_ROM_CMD, OneWireCrc, OneWireError,
    OneWireResult, RomCode,
};

/// Status of the bus as reported by [`OneWire::reset`].
pub trait OneWireStatus {
    /// Whether at least one device answered the reset pulse with a presence pulse.
    fn presence(&self) -> bool;

    /// Whether the line was found shorted to ground.
    fn shortcircuit(&self) -> bool {
        false
    }
}

/// Trait for 1-Wire communication.
/// This trait defines the basic operations required for 1-Wire communication, such as resetting the bus,
/// and writing and reading single time slots. Byte transfers are composed of eight time slots, least
/// significant bit first.
///
/// Implementations are not expected to be shareable: the bus is half duplex and master driven,
/// so callers must serialize all access to a given bus.
pub trait OneWire {
    /// The status type returned by the reset operation.
    /// This type must implement the [OneWireStatus] trait.
    type Status: OneWireStatus;
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware or communication.
    type BusError;

    /// Resets the 1-Wire bus and returns the status of the bus.
    ///
    /// Must be called before every new command sequence.
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`] if no presence pulse was detected, [`OneWireError::ShortCircuit`]
    /// if the line does not recover, or a hardware error.
    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError>;

    /// Writes a single bit to the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit from the 1-Wire bus.
    ///
    /// # Returns
    /// The bit read from the bus. Since the bus is a wired-AND, the result is `false` if any device pulls
    /// the line low during the slot.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a byte to the 1-Wire bus, least significant bit first.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    /// Reads a byte from the 1-Wire bus, least significant bit first.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    /// Addresses devices on the 1-Wire bus.
    /// The first [`OneWire::read_byte`], [`OneWire::read_bit`], [`OneWire::write_byte`], [`OneWire::write_bit`] operation should be preceded by this method to address devices on the bus.
    /// Note: A [`OneWire::read_byte`] or [`OneWire::read_bit`] call will return garbage data if this method is called without specifying a ROM address on a bus with multiple devices.
    /// # Arguments
    /// * `rom` - The ROM address of the device to address. Pass [`None`] to skip ROM addressing and address all devices on the bus.
    fn address(&mut self, rom: Option<RomCode>) -> OneWireResult<(), Self::BusError> {
        self.reset()?; // Reset the bus before addressing
        match rom {
            Some(rom) => {
                self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
                for &b in rom.as_bytes().iter() {
                    self.write_byte(b)?; // Write each byte of the ROM address
                }
            }
            None => self.write_byte(ONEWIRE_SKIP_ROM_CMD)?,
        }
        Ok(())
    }

    /// Reads the ROM of the only device on the bus.
    ///
    /// # Errors
    /// [`OneWireError::InvalidCrc`] if the ROM does not check out, which is what happens when more than one
    /// device answers.
    fn read_rom(&mut self) -> OneWireResult<RomCode, Self::BusError> {
        self.reset()?;
        self.write_byte(ONEWIRE_READ_ROM_CMD)?;
        let mut rom = [0; 8];
        for b in rom.iter_mut() {
            *b = self.read_byte()?;
        }
        if !OneWireCrc::validate(&rom) {
            return Err(OneWireError::InvalidCrc);
        }
        Ok(RomCode::from(rom))
    }
}
