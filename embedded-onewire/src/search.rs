use crate::{
    ONEWIRE_CONDITIONAL_SEARCH_CMD, ONEWIRE_SEARCH_CMD, OneWire, OneWireStatus, RomCode,
    error::OneWireError, utils::OneWireCrc,
};

/// A structure for searching devices on a 1-Wire bus.
/// This structure implements the search algorithm for discovering devices on the 1-Wire bus.
/// It maintains the state of the search between calls, so that each call to
/// [`next`](OneWireSearch::next) finds the next device in ROM bit order.
pub struct OneWireSearch<'a, T> {
    onewire: &'a mut T,
    cmd: u8,
    last_device: bool,
    last_discrepancy: u8,
    last_family_discrepancy: u8,
    family: u8,
    rom: [u8; 8],
}

impl<T> core::fmt::Debug for OneWireSearch<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OneWireSearch")
            .field("cmd", &self.cmd)
            .field("last_device", &self.last_device)
            .field("last_discrepancy", &self.last_discrepancy)
            .field("last_family_discrepancy", &self.last_family_discrepancy)
            .field("family", &self.family)
            .field("rom", &self.rom)
            .finish()
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Type of search performed using [`OneWireSearch`].
pub enum OneWireSearchKind {
    /// Normal search
    Normal = ONEWIRE_SEARCH_CMD,
    /// Search only for devices with alarm
    Alarmed = ONEWIRE_CONDITIONAL_SEARCH_CMD,
}

impl<'a, T> OneWireSearch<'a, T> {
    /// Creates a new [`OneWireSearch`] instance.
    ///
    /// # Arguments
    /// * `onewire` - A mutable reference to a type that implements the `OneWire` trait.
    /// * `cmd` - The kind of search to perform.
    pub fn new(onewire: &'a mut T, cmd: OneWireSearchKind) -> Self {
        Self {
            onewire,
            cmd: cmd as _,
            last_device: false,
            last_discrepancy: 0,
            last_family_discrepancy: 0,
            family: 0,
            rom: [0; 8],
        }
    }

    /// Creates a new [`OneWireSearch`] instance that only reports devices of a specific family.
    /// # Arguments
    /// * `onewire` - A mutable reference to a type that implements the `OneWire` trait.
    /// * `cmd` - The kind of search to perform.
    /// * `family` - The family code of the devices to search for.
    pub fn with_family(onewire: &'a mut T, cmd: OneWireSearchKind, family: u8) -> Self {
        let mut search = Self::new(onewire, cmd);
        search.target_setup(family);
        search
    }

    /// Seed the search state so that the next search starts at devices of `family`.
    ///
    /// Devices of other families end the enumeration.
    pub fn target_setup(&mut self, family: u8) {
        self.family = family;
        self.rom = [family, 0, 0, 0, 0, 0, 0, 0];
        self.last_discrepancy = 64;
        self.last_family_discrepancy = 0;
        self.last_device = false;
    }

    /// Fast-forward past the family of the device that was just found.
    ///
    /// The next search continues with the first device of a different family.
    pub fn family_skip_setup(&mut self) {
        self.last_discrepancy = self.last_family_discrepancy;
        self.last_family_discrepancy = 0;
        // check for end of list
        if self.last_discrepancy == 0 {
            self.last_device = true;
        }
    }

    /// The ROM found by the last successful search.
    pub fn rom(&self) -> RomCode {
        RomCode::from(self.rom)
    }

    /// Whether the last device on the bus has been reported.
    pub fn is_done(&self) -> bool {
        self.last_device
    }

    /// Resets the search state, keeping the target family if one was set.
    fn reset(&mut self) {
        if self.family != 0 {
            self.target_setup(self.family);
        } else {
            self.clear();
            self.rom = [0; 8];
        }
    }

    /// Forget the search position so that the next search starts over.
    fn clear(&mut self) {
        self.last_device = false;
        self.last_discrepancy = 0;
        self.last_family_discrepancy = 0;
    }
}

impl<T: OneWire> OneWireSearch<'_, T> {
    /// Restarts the search and returns the first device on the bus.
    ///
    /// See [next](OneWireSearch::next) for the return value.
    pub fn first(&mut self) -> Result<Option<RomCode>, OneWireError<T::BusError>> {
        self.reset();
        self.next()
    }

    /// Searches for devices on the 1-Wire bus.
    /// This method implements the [1-Wire search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html) to discover devices connected to the bus.
    /// The [next](OneWireSearch::next) method can be called repeatedly to find all devices on the bus.
    /// At the end of the search, calling this method will return `None` to indicate that no more devices are present.
    /// Use [first](OneWireSearch::first) to start over.
    ///
    /// # Returns
    /// The ROM code of the found device, or `None` once the enumeration is complete or if the devices stopped
    /// answering in the middle of the search.
    ///
    /// # Errors
    /// * [`OneWireError::NoDevicePresent`] if the reset pulse is not answered. The search state is cleared.
    /// * [`OneWireError::InvalidCrc`] if the assembled ROM fails its CRC check. The search state is kept, so
    ///   calling [next](OneWireSearch::next) again continues with the following device.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<RomCode>, OneWireError<T::BusError>> {
        if self.last_device {
            return Ok(None); // If the last device was found, return None
        }
        let status = match self.onewire.reset() {
            Ok(status) => status,
            Err(e) => {
                self.clear();
                return Err(e);
            }
        };
        if !status.presence() {
            self.clear();
            return Err(OneWireError::NoDevicePresent);
        }
        if status.shortcircuit() {
            self.clear();
            return Err(OneWireError::ShortCircuit);
        }
        let mut last_zero: u8 = 0;
        self.onewire.write_byte(self.cmd)?; // Search ROM command
        for id_bit_num in 1..=64u8 {
            let idx = ((id_bit_num - 1) / 8) as usize; // Index in the ROM array
            let rom_mask = 1u8 << ((id_bit_num - 1) % 8); // Mask for the current bit in the ROM byte
            let id_bit = self.onewire.read_bit()?;
            let complement_bit = self.onewire.read_bit()?;
            let dir = match (id_bit, complement_bit) {
                (true, true) => {
                    // Nobody is driving the line any more
                    log::debug!("1-Wire search lost all devices at bit {}", id_bit_num);
                    self.clear();
                    return Ok(None);
                }
                // All remaining devices agree on this bit
                (true, false) => true,
                (false, true) => false,
                (false, false) => {
                    // Discrepancy: repeat the previous path before the last discrepancy,
                    // take the 1 branch at it and the 0 branch after it
                    let dir = if id_bit_num < self.last_discrepancy {
                        self.rom[idx] & rom_mask > 0
                    } else {
                        id_bit_num == self.last_discrepancy
                    };
                    if !dir {
                        last_zero = id_bit_num;
                        if last_zero < 9 {
                            self.last_family_discrepancy = last_zero;
                        }
                    }
                    dir
                }
            };
            if dir {
                self.rom[idx] |= rom_mask; // Set the bit in the ROM
            } else {
                self.rom[idx] &= !rom_mask; // Clear the bit in the ROM
            }
            self.onewire.write_bit(dir)?; // Devices that disagree drop out
        }
        self.last_discrepancy = last_zero;
        self.last_device = self.last_discrepancy == 0;

        if self.rom[0] == 0 {
            self.clear();
            return Ok(None);
        }
        if !OneWireCrc::validate(&self.rom) {
            log::warn!("1-Wire search found ROM {} with invalid CRC", self.rom());
            return Err(OneWireError::InvalidCrc);
        }
        if self.family != 0 && self.rom[0] != self.family {
            // Walked past the requested family
            self.last_device = true;
            return Ok(None);
        }
        log::debug!("1-Wire search found {}", self.rom());
        Ok(Some(self.rom()))
    }

    /// Verifies if the device with the given ROM code is present on the 1-Wire bus.
    ///
    /// The search state is restored afterwards, so this may be called in the middle of an enumeration.
    pub fn verify(&mut self, rom: RomCode) -> Result<bool, OneWireError<T::BusError>> {
        let backup = (
            self.rom,
            self.last_discrepancy,
            self.last_family_discrepancy,
            self.last_device,
            self.family,
        );
        self.rom = rom.into();
        self.last_discrepancy = 64; // Follow the given ROM at every discrepancy
        self.last_device = false;
        self.family = 0;
        let res = self.next();
        (
            self.rom,
            self.last_discrepancy,
            self.last_family_discrepancy,
            self.last_device,
            self.family,
        ) = backup;
        Ok(res? == Some(rom))
    }
}
