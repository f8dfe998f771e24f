#![no_std]
#![deny(missing_docs)]

/*! # DS18B20
 *
 * Driver for the DS18B20 programmable resolution 1-Wire digital thermometer, on top of any bus
 * implementing [`OneWire`].
 *
 * [`Ds18b20`] addresses a single sensor by ROM code. [`Ds18b20Group`] enumerates every sensor on
 * a bus, configures them alike and converts them together.
 *
 * Conversions are asynchronous: [`Ds18b20::start_conversion`] returns immediately, and
 * [`Ds18b20::all_conversions_done`] reports when the line is released again. Nothing in this
 * crate retries; a [`Ds18b20Error::is_retryable`] error means "try again on the next cycle".
 */

pub use embedded_onewire::{OneWire, OneWireError, OneWireResult, RomCode};
mod error;
mod group;
mod registers;

pub use error::Ds18b20Error;
pub use group::Ds18b20Group;
pub use registers::{
    ALARM_MAX, ALARM_MIN, Configuration, Resolution, Scratchpad, Temperature, clamp_alarm,
    decode_temperature,
};

use embedded_onewire::OneWireCrc;

/// Results of DS18B20-specific function calls.
pub type Ds18b20Result<T, E> = Result<T, Ds18b20Error<E>>;

const DS18B20_START_CONV: u8 = 0x44;
const DS18B20_READ_SCRATCH: u8 = 0xbe;
const DS18B20_WRITE_SCRATCH: u8 = 0x4e;
const DS18B20_COPY_SCRATCH: u8 = 0x48;
const DS18B20_RECALL_EEPROM: u8 = 0xb8;
const DS18B20_READ_POWERMODE: u8 = 0xb4;

/// Low bits of the configuration register, which always read as 1.
const CONFIG_RESERVED: u8 = 0x1f;

/// A DS18B20 sensor on a 1-Wire bus, identified by its ROM code.
///
/// The handle does not own the bus; every operation borrows it. All operations fail with
/// [`Ds18b20Error::NotDs18b20`] without touching the bus if the ROM code has another family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ds18b20 {
    rom: RomCode,
}

impl Ds18b20 {
    /// DS18B20 family code.
    pub const FAMILY_CODE: u8 = 0x28;

    /// Create a handle for the sensor with the given ROM code.
    pub fn new(rom: RomCode) -> Self {
        Self { rom }
    }

    /// Whether the ROM code belongs to a DS18B20.
    pub fn is_device(rom: &RomCode) -> bool {
        rom.family() == Self::FAMILY_CODE
    }

    /// ROM code of the sensor.
    pub fn rom(&self) -> RomCode {
        self.rom
    }

    fn check<E>(&self) -> Ds18b20Result<(), E> {
        if Self::is_device(&self.rom) {
            Ok(())
        } else {
            Err(Ds18b20Error::NotDs18b20)
        }
    }

    /// Start a temperature conversion on this sensor.
    pub fn start_conversion<O: OneWire>(&self, bus: &mut O) -> Ds18b20Result<(), O::BusError> {
        self.check()?;
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18B20_START_CONV)?;
        Ok(())
    }

    /// Start a temperature conversion on every device of the bus.
    pub fn start_conversion_all<O: OneWire>(bus: &mut O) -> OneWireResult<(), O::BusError> {
        bus.address(None)?;
        bus.write_byte(DS18B20_START_CONV)
    }

    /// Whether every conversion started by the last command has finished.
    ///
    /// Converting sensors hold the line low during read slots.
    pub fn all_conversions_done<O: OneWire>(bus: &mut O) -> OneWireResult<bool, O::BusError> {
        bus.read_bit()
    }

    /// Read the scratchpad and check its CRC.
    ///
    /// # Errors
    /// [`Ds18b20Error::InvalidCrc`] if the CRC does not match or the configuration register does
    /// not have its reserved bits set.
    pub fn read_scratchpad<O: OneWire>(
        &self,
        bus: &mut O,
    ) -> Ds18b20Result<Scratchpad, O::BusError> {
        self.check()?;
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18B20_READ_SCRATCH)?;
        let mut buf = [0; 9];
        for b in buf.iter_mut() {
            *b = bus.read_byte()?;
        }
        if !OneWireCrc::validate(&buf) {
            log::warn!("scratchpad of {} failed CRC check", self.rom);
            return Err(Ds18b20Error::InvalidCrc);
        }
        // a line held low reads as all zeros, which passes the CRC
        if buf[4] & CONFIG_RESERVED != CONFIG_RESERVED {
            log::warn!("scratchpad of {} has invalid configuration {:#04x}", self.rom, buf[4]);
            return Err(Ds18b20Error::InvalidCrc);
        }
        Ok(Scratchpad::from(buf))
    }

    /// Read the result of the last conversion.
    ///
    /// Must directly follow the conversion command (or the polling of it), since the first read
    /// slot tells whether the conversion is finished.
    ///
    /// # Errors
    /// * [`Ds18b20Error::ConversionPending`] if the conversion has not finished yet.
    /// * [`Ds18b20Error::InvalidCrc`] if the scratchpad was corrupted on the wire.
    pub fn read_temperature<O: OneWire>(
        &self,
        bus: &mut O,
    ) -> Ds18b20Result<Temperature, O::BusError> {
        self.check()?;
        if !bus.read_bit()? {
            return Err(Ds18b20Error::ConversionPending);
        }
        Ok(self.read_scratchpad(bus)?.temperature())
    }

    /// Read the configured conversion resolution.
    pub fn resolution<O: OneWire>(&self, bus: &mut O) -> Ds18b20Result<Resolution, O::BusError> {
        Ok(self.read_scratchpad(bus)?.resolution())
    }

    /// Set the conversion resolution and store it in EEPROM.
    pub fn set_resolution<O: OneWire>(
        &self,
        bus: &mut O,
        resolution: Resolution,
    ) -> Ds18b20Result<(), O::BusError> {
        let sp = self.read_scratchpad(bus)?;
        self.write_scratchpad(bus, sp.alarm_high, sp.alarm_low, resolution)?;
        self.copy_scratchpad(bus)
    }

    /// Read the alarm thresholds as `(high, low)`.
    pub fn alarm_thresholds<O: OneWire>(&self, bus: &mut O) -> Ds18b20Result<(i8, i8), O::BusError> {
        let sp = self.read_scratchpad(bus)?;
        Ok((sp.alarm_high, sp.alarm_low))
    }

    /// Set the high alarm threshold and store it in EEPROM.
    ///
    /// Values outside [`ALARM_MIN`]..=[`ALARM_MAX`] are clamped.
    pub fn set_alarm_high<O: OneWire>(&self, bus: &mut O, temp: i8) -> Ds18b20Result<(), O::BusError> {
        let sp = self.read_scratchpad(bus)?;
        self.write_scratchpad(bus, clamp_alarm(temp), sp.alarm_low, sp.resolution())?;
        self.copy_scratchpad(bus)
    }

    /// Set the low alarm threshold and store it in EEPROM.
    ///
    /// Values outside [`ALARM_MIN`]..=[`ALARM_MAX`] are clamped.
    pub fn set_alarm_low<O: OneWire>(&self, bus: &mut O, temp: i8) -> Ds18b20Result<(), O::BusError> {
        let sp = self.read_scratchpad(bus)?;
        self.write_scratchpad(bus, sp.alarm_high, clamp_alarm(temp), sp.resolution())?;
        self.copy_scratchpad(bus)
    }

    /// Open the alarm window to the full measurement range, so the sensor never answers an
    /// alarm search.
    pub fn disable_alarms<O: OneWire>(&self, bus: &mut O) -> Ds18b20Result<(), O::BusError> {
        let sp = self.read_scratchpad(bus)?;
        self.write_scratchpad(bus, ALARM_MAX, ALARM_MIN, sp.resolution())?;
        self.copy_scratchpad(bus)
    }

    /// Write TH, TL and the configuration register to the scratchpad.
    ///
    /// The values are lost at power-off unless followed by [`Ds18b20::copy_scratchpad`].
    pub fn write_scratchpad<O: OneWire>(
        &self,
        bus: &mut O,
        high: i8,
        low: i8,
        resolution: Resolution,
    ) -> Ds18b20Result<(), O::BusError> {
        self.check()?;
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18B20_WRITE_SCRATCH)?;
        bus.write_byte(high as u8)?;
        bus.write_byte(low as u8)?;
        bus.write_byte(Configuration::new().with_resolution(resolution).into_bits())?;
        Ok(())
    }

    /// Copy TH, TL and the configuration register to EEPROM.
    ///
    /// The sensor needs up to 10 ms to complete the copy; a parasite powered sensor needs a
    /// strong pull-up during that time.
    pub fn copy_scratchpad<O: OneWire>(&self, bus: &mut O) -> Ds18b20Result<(), O::BusError> {
        self.check()?;
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18B20_COPY_SCRATCH)?;
        Ok(())
    }

    /// Reload TH, TL and the configuration register from EEPROM.
    pub fn recall_eeprom<O: OneWire>(&self, bus: &mut O) -> Ds18b20Result<(), O::BusError> {
        self.check()?;
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18B20_RECALL_EEPROM)?;
        Ok(())
    }

    /// Whether the sensor draws its power from the data line.
    pub fn is_parasite_powered<O: OneWire>(&self, bus: &mut O) -> Ds18b20Result<bool, O::BusError> {
        self.check()?;
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18B20_READ_POWERMODE)?;
        // parasite powered devices pull the line low
        Ok(!bus.read_bit()?)
    }
}
