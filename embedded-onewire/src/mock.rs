//! An in-memory 1-Wire bus for exercising drivers without hardware.
//!
//! [`SimBus`] implements [`OneWire`] at the time-slot level. It models the ROM
//! function layer of every device (READ, MATCH, SKIP and both SEARCH commands,
//! with wired-AND bit/complement reads) and hands everything after the ROM
//! command to the addressed [`SimDevice`]s.
//!
//! ```
//! use embedded_onewire::{OneWireSearch, OneWireSearchKind, RomCode};
//! use embedded_onewire::mock::{RomDevice, SimBus};
//!
//! let rom = RomCode::new(0x28, [1, 2, 3, 4, 5, 6]);
//! let mut bus = SimBus::new([RomDevice::new(rom)]);
//! let mut search = OneWireSearch::new(&mut bus, OneWireSearchKind::Normal);
//! assert_eq!(search.first().unwrap(), Some(rom));
//! ```

use crate::{
    ONEWIRE_CONDITIONAL_SEARCH_CMD, ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_ROM_CMD,
    ONEWIRE_SEARCH_CMD, ONEWIRE_SKIP_ROM_CMD, OneWire, OneWireError, OneWireResult,
    OneWireStatus, RomCode,
};
use core::convert::Infallible;
use std::vec::Vec;

/// A device attached to a [`SimBus`].
pub trait SimDevice {
    /// ROM code of the device.
    fn rom(&self) -> RomCode;

    /// Whether the device answers an alarm search.
    fn alarmed(&self) -> bool {
        false
    }

    /// Called on every reset pulse.
    fn reset(&mut self) {}

    /// A function-layer byte written by the master while this device is addressed.
    fn write_byte(&mut self, _byte: u8) {}

    /// A read time slot while this device is addressed.
    ///
    /// Returning `false` pulls the line low for every listener.
    fn read_bit(&mut self) -> bool {
        true
    }
}

/// A device that only implements the ROM layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomDevice {
    rom: RomCode,
    alarm: bool,
}

impl RomDevice {
    /// New device with the given ROM.
    pub fn new(rom: RomCode) -> Self {
        Self { rom, alarm: false }
    }

    /// Set whether the device answers an alarm search.
    pub fn with_alarm(mut self, alarm: bool) -> Self {
        self.alarm = alarm;
        self
    }
}

impl SimDevice for RomDevice {
    fn rom(&self) -> RomCode {
        self.rom
    }

    fn alarmed(&self) -> bool {
        self.alarm
    }
}

/// Status reported by [`SimBus`] on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimStatus {
    presence: bool,
}

impl OneWireStatus for SimStatus {
    fn presence(&self) -> bool {
        self.presence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchSlot {
    Bit,
    Complement,
    Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing addressed, slots are ignored.
    Idle,
    /// Waiting for the ROM command byte after a reset.
    RomCommand,
    /// Collecting the 64-bit ROM after MATCH ROM.
    MatchRom { bytes: [u8; 8], count: usize },
    /// Shifting out the ROM after READ ROM.
    ReadRom { bit: u8 },
    /// Walking the ROM tree.
    Search { bit: u8, slot: SearchSlot },
    /// Selected devices receive function commands.
    Function,
}

/// Simulated 1-Wire bus with a set of devices.
#[derive(Debug)]
pub struct SimBus<D> {
    devices: Vec<D>,
    selected: Vec<bool>,
    phase: Phase,
    shift: u8,
    bits: u8,
    written: Vec<u8>,
    resets: usize,
}

impl<D: SimDevice> SimBus<D> {
    /// Create a bus with the given devices attached.
    pub fn new(devices: impl IntoIterator<Item = D>) -> Self {
        let devices: Vec<D> = devices.into_iter().collect();
        let selected = devices.iter().map(|_| false).collect();
        Self {
            devices,
            selected,
            phase: Phase::Idle,
            shift: 0,
            bits: 0,
            written: Vec::new(),
            resets: 0,
        }
    }

    /// Attach another device.
    pub fn attach(&mut self, device: D) {
        self.devices.push(device);
        self.selected.push(false);
    }

    /// Devices on the bus.
    pub fn devices(&self) -> &[D] {
        &self.devices
    }

    /// Mutable access to the devices on the bus.
    pub fn devices_mut(&mut self) -> &mut [D] {
        &mut self.devices
    }

    /// Every complete byte written by the master outside of the search bit slots, in order.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Forget the recorded bytes.
    pub fn clear_written(&mut self) {
        self.written.clear();
    }

    /// Number of reset pulses issued so far.
    pub fn resets(&self) -> usize {
        self.resets
    }

    fn select_all(&mut self, predicate: impl Fn(&D) -> bool) {
        for (sel, dev) in self.selected.iter_mut().zip(self.devices.iter()) {
            *sel = predicate(dev);
        }
    }

    /// Wired-AND of a ROM bit (or its complement) over the selected devices.
    fn rom_bit(&self, bit: u8, complement: bool) -> bool {
        self.devices
            .iter()
            .zip(self.selected.iter())
            .filter(|(_, sel)| **sel)
            .all(|(dev, _)| dev.rom().bit(bit) != complement)
    }

    fn rom_command(&mut self, cmd: u8) {
        self.phase = match cmd {
            ONEWIRE_READ_ROM_CMD => {
                self.select_all(|_| true);
                Phase::ReadRom { bit: 0 }
            }
            ONEWIRE_MATCH_ROM_CMD => Phase::MatchRom {
                bytes: [0; 8],
                count: 0,
            },
            ONEWIRE_SKIP_ROM_CMD => {
                self.select_all(|_| true);
                Phase::Function
            }
            ONEWIRE_SEARCH_CMD => {
                self.select_all(|_| true);
                Phase::Search {
                    bit: 0,
                    slot: SearchSlot::Bit,
                }
            }
            ONEWIRE_CONDITIONAL_SEARCH_CMD => {
                self.select_all(|d| d.alarmed());
                Phase::Search {
                    bit: 0,
                    slot: SearchSlot::Bit,
                }
            }
            _ => Phase::Idle,
        };
    }

    fn byte_written(&mut self, byte: u8) {
        self.written.push(byte);
        match self.phase {
            Phase::RomCommand => self.rom_command(byte),
            Phase::MatchRom {
                mut bytes,
                mut count,
            } => {
                bytes[count] = byte;
                count += 1;
                if count == bytes.len() {
                    let rom = RomCode::from(bytes);
                    self.select_all(|d| d.rom() == rom);
                    self.phase = Phase::Function;
                } else {
                    self.phase = Phase::MatchRom { bytes, count };
                }
            }
            Phase::Function => {
                for (dev, _) in self
                    .devices
                    .iter_mut()
                    .zip(self.selected.iter())
                    .filter(|(_, sel)| **sel)
                {
                    dev.write_byte(byte);
                }
            }
            _ => {}
        }
    }
}

impl<D: SimDevice> OneWire for SimBus<D> {
    type Status = SimStatus;

    type BusError = Infallible;

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        self.resets += 1;
        self.shift = 0;
        self.bits = 0;
        self.select_all(|_| false);
        for dev in self.devices.iter_mut() {
            dev.reset();
        }
        if self.devices.is_empty() {
            self.phase = Phase::Idle;
            return Err(OneWireError::NoDevicePresent);
        }
        self.phase = Phase::RomCommand;
        Ok(SimStatus { presence: true })
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        match self.phase {
            Phase::Idle | Phase::ReadRom { .. } => {}
            Phase::Search {
                bit: index,
                slot: SearchSlot::Direction,
            } => {
                for (sel, dev) in self.selected.iter_mut().zip(self.devices.iter()) {
                    if *sel && dev.rom().bit(index) != bit {
                        *sel = false;
                    }
                }
                self.phase = if index == 63 {
                    Phase::Function
                } else {
                    Phase::Search {
                        bit: index + 1,
                        slot: SearchSlot::Bit,
                    }
                };
            }
            Phase::Search { .. } => {}
            Phase::RomCommand | Phase::MatchRom { .. } | Phase::Function => {
                if bit {
                    self.shift |= 1 << self.bits;
                }
                self.bits += 1;
                if self.bits == 8 {
                    let byte = self.shift;
                    self.shift = 0;
                    self.bits = 0;
                    self.byte_written(byte);
                }
            }
        }
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        let level = match self.phase {
            Phase::Search { bit, slot } => match slot {
                SearchSlot::Bit => {
                    self.phase = Phase::Search {
                        bit,
                        slot: SearchSlot::Complement,
                    };
                    self.rom_bit(bit, false)
                }
                SearchSlot::Complement => {
                    self.phase = Phase::Search {
                        bit,
                        slot: SearchSlot::Direction,
                    };
                    self.rom_bit(bit, true)
                }
                SearchSlot::Direction => true,
            },
            Phase::ReadRom { bit } => {
                let level = self.rom_bit(bit, false);
                self.phase = if bit == 63 {
                    Phase::Function
                } else {
                    Phase::ReadRom { bit: bit + 1 }
                };
                level
            }
            Phase::Function => {
                // every addressed device gets the slot, any of them may pull low
                let mut level = true;
                for (dev, _) in self
                    .devices
                    .iter_mut()
                    .zip(self.selected.iter())
                    .filter(|(_, sel)| **sel)
                {
                    level &= dev.read_bit();
                }
                level
            }
            Phase::Idle | Phase::RomCommand | Phase::MatchRom { .. } => true,
        };
        Ok(level)
    }
}
