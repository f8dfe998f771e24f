use crate::{
    ALARM_MAX, ALARM_MIN, Ds18b20, Ds18b20Error, Ds18b20Result, Resolution, Temperature,
    clamp_alarm,
};
use core::iter::zip;
use embedded_hal::delay::DelayNs;
use embedded_onewire::{OneWire, OneWireError, OneWireSearch, OneWireSearchKind, RomCode};

/// Up to `N` DS18B20 sensors sharing a bus, configured alike and converted together.
#[derive(Debug)]
pub struct Ds18b20Group<const N: usize> {
    devices: usize,
    roms: [RomCode; N],
    temps: [Option<Temperature>; N],
    resolution: Resolution,
    low: i8,
    high: i8,
    persist: bool,
}

impl<const N: usize> Default for Ds18b20Group<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Ds18b20Group<N> {
    fn new() -> Self {
        Self {
            devices: 0,
            roms: [RomCode::default(); N],
            temps: [None; N],
            resolution: Resolution::default(),
            low: ALARM_MIN,
            high: ALARM_MAX,
            persist: false,
        }
    }

    /// Conversion resolution applied by [`enumerate`](Self::enumerate).
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Low alarm threshold applied by [`enumerate`](Self::enumerate), clamped to the sensor range.
    pub fn with_t_low(mut self, temp: i8) -> Self {
        self.low = clamp_alarm(temp);
        self
    }

    /// High alarm threshold applied by [`enumerate`](Self::enumerate), clamped to the sensor range.
    pub fn with_t_high(mut self, temp: i8) -> Self {
        self.high = clamp_alarm(temp);
        self
    }

    /// Whether [`enumerate`](Self::enumerate) also stores the configuration in EEPROM.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Configured resolution.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// ROM codes of the sensors found by the last enumeration.
    pub fn roms(&self) -> &[RomCode] {
        &self.roms[..self.devices]
    }

    /// Temperatures from the last [`read_temperatures`](Self::read_temperatures), in the order of
    /// [`roms`](Self::roms).
    pub fn temperatures(&self) -> &[Option<Temperature>] {
        &self.temps[..self.devices]
    }

    /// Find the DS18B20 sensors on the bus and write the configuration to each of them.
    ///
    /// Devices of other families are ignored, as are devices whose ROM fails its CRC check.
    /// At most `N` sensors are kept.
    pub fn enumerate<O: OneWire>(&mut self, bus: &mut O) -> Ds18b20Result<usize, O::BusError> {
        self.devices = 0;
        self.temps = [None; N];
        let mut search =
            OneWireSearch::with_family(bus, OneWireSearchKind::Normal, Ds18b20::FAMILY_CODE);
        let mut next = search.first();
        loop {
            match next {
                Ok(Some(_)) if self.devices == N => {
                    log::warn!("more than {} DS18B20 on the bus, ignoring the rest", N);
                    break;
                }
                Ok(Some(rom)) => {
                    self.roms[self.devices] = rom;
                    self.devices += 1;
                }
                Ok(None) => break,
                Err(OneWireError::InvalidCrc) => {
                    log::warn!("skipping device with corrupted ROM {}", search.rom());
                }
                Err(e) => return Err(e.into()),
            }
            next = search.next();
        }
        log::debug!("found {} DS18B20", self.devices);
        for rom in self.roms[..self.devices].iter() {
            let dev = Ds18b20::new(*rom);
            dev.write_scratchpad(bus, self.high, self.low, self.resolution)?;
            if self.persist {
                dev.copy_scratchpad(bus)?;
            }
        }
        Ok(self.devices)
    }

    /// Start a conversion on every sensor and wait until all are done.
    ///
    /// The line is polled every millisecond, for at most the conversion time of the configured
    /// resolution.
    ///
    /// # Errors
    /// [`Ds18b20Error::ConversionPending`] if some sensor is still converting after that time.
    pub fn trigger_temperature_conversion<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds18b20Result<(), O::BusError> {
        Ds18b20::start_conversion_all(bus)?;
        let polls = self.resolution.conversion_time_us().div_ceil(1000);
        for _ in 0..=polls {
            if Ds18b20::all_conversions_done(bus)? {
                return Ok(());
            }
            delay.delay_ms(1);
        }
        log::warn!("temperature conversion did not finish in time");
        Err(Ds18b20Error::ConversionPending)
    }

    /// Read the result of the last conversion from every sensor.
    ///
    /// Sensors whose reading is not usable (CRC failure, conversion still running) get `None`;
    /// bus faults abort the whole read, leaving the sensors not read yet at `None`.
    pub fn read_temperatures<O: OneWire>(
        &mut self,
        bus: &mut O,
    ) -> Ds18b20Result<&[Option<Temperature>], O::BusError> {
        self.temps = [None; N];
        for (rom, temp) in zip(
            self.roms[..self.devices].iter(),
            self.temps[..self.devices].iter_mut(),
        ) {
            *temp = match Ds18b20::new(*rom).read_temperature(bus) {
                Ok(t) => Some(t),
                Err(e) if e.is_retryable() => {
                    log::warn!("no usable reading from {}", rom);
                    None
                }
                Err(e) => return Err(e),
            };
        }
        Ok(&self.temps[..self.devices])
    }

    /// Find the sensors whose last conversion is outside their alarm window.
    ///
    /// Fills `out` and returns the number of sensors written to it.
    pub fn alarm_search<O: OneWire>(
        &self,
        bus: &mut O,
        out: &mut [RomCode],
    ) -> Ds18b20Result<usize, O::BusError> {
        let mut search =
            OneWireSearch::with_family(bus, OneWireSearchKind::Alarmed, Ds18b20::FAMILY_CODE);
        let mut count = 0;
        let mut next = search.first();
        loop {
            match next {
                Ok(Some(_)) if count == out.len() => break,
                Ok(Some(rom)) => {
                    out[count] = rom;
                    count += 1;
                }
                Ok(None) => break,
                Err(OneWireError::InvalidCrc) => {}
                Err(e) => return Err(e.into()),
            }
            next = search.next();
        }
        Ok(count)
    }
}
