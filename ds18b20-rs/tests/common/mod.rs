#![allow(dead_code)]

use embedded_onewire::{OneWireCrc, RomCode, mock::SimDevice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Converting,
    ReadScratchpad { bit: usize },
    WriteScratchpad { index: usize },
    ReadPower,
}

/// A DS18B20 as seen from the function layer.
#[derive(Debug, Clone)]
pub struct SimDs18b20 {
    rom: RomCode,
    /// Bytes 0 to 7 of the scratchpad; the CRC is computed on read.
    pub scratchpad: [u8; 8],
    pub eeprom: [u8; 3],
    /// Raw register value latched by the next conversion.
    pub temperature: u16,
    /// Read slots a conversion keeps the line low.
    pub conversion_slots: u32,
    pub corrupt_crc: bool,
    pub parasite: bool,
    pub copies: usize,
    busy: u32,
    state: State,
}

impl SimDs18b20 {
    pub fn new(id: u8) -> Self {
        Self::with_rom(RomCode::new(0x28, [id, 0x11, 0x22, 0x33, 0x44, 0x55]))
    }

    pub fn with_rom(rom: RomCode) -> Self {
        Self {
            rom,
            // power-on state: 85 °C, TH 75, TL 70, 12 bits
            scratchpad: [0x50, 0x05, 0x4b, 0x46, 0x7f, 0xff, 0x0c, 0x10],
            eeprom: [0x4b, 0x46, 0x7f],
            temperature: 0x0191,
            conversion_slots: 3,
            corrupt_crc: false,
            parasite: false,
            copies: 0,
            busy: 0,
            state: State::Idle,
        }
    }

    pub fn with_temperature(mut self, raw: u16) -> Self {
        self.temperature = raw;
        self
    }

    pub fn alarm_high(&self) -> i8 {
        self.scratchpad[2] as i8
    }

    pub fn alarm_low(&self) -> i8 {
        self.scratchpad[3] as i8
    }

    pub fn config(&self) -> u8 {
        self.scratchpad[4]
    }

    fn latch(&mut self) {
        self.scratchpad[..2].copy_from_slice(&self.temperature.to_le_bytes());
    }

    fn bytes(&self) -> [u8; 9] {
        let mut out = [0; 9];
        out[..8].copy_from_slice(&self.scratchpad);
        out[8] = OneWireCrc::compute(&self.scratchpad);
        if self.corrupt_crc {
            out[8] ^= 0xff;
        }
        out
    }
}

impl SimDevice for SimDs18b20 {
    fn rom(&self) -> RomCode {
        self.rom
    }

    fn alarmed(&self) -> bool {
        let whole = i16::from_le_bytes([self.scratchpad[0], self.scratchpad[1]]) >> 4;
        whole >= self.alarm_high() as i16 || whole <= self.alarm_low() as i16
    }

    fn reset(&mut self) {
        self.state = State::Idle;
    }

    fn write_byte(&mut self, byte: u8) {
        if let State::WriteScratchpad { index } = self.state {
            self.scratchpad[2 + index] = byte;
            self.state = if index == 2 {
                State::Idle
            } else {
                State::WriteScratchpad { index: index + 1 }
            };
            return;
        }
        self.state = match byte {
            0x44 => {
                self.busy = self.conversion_slots;
                if self.busy == 0 {
                    self.latch();
                }
                State::Converting
            }
            0xbe => State::ReadScratchpad { bit: 0 },
            0x4e => State::WriteScratchpad { index: 0 },
            0x48 => {
                self.eeprom.copy_from_slice(&self.scratchpad[2..5]);
                self.copies += 1;
                State::Idle
            }
            0xb8 => {
                let eeprom = self.eeprom;
                self.scratchpad[2..5].copy_from_slice(&eeprom);
                State::Idle
            }
            0xb4 => State::ReadPower,
            _ => State::Idle,
        };
    }

    fn read_bit(&mut self) -> bool {
        match self.state {
            State::Converting if self.busy > 0 => {
                self.busy -= 1;
                if self.busy == 0 {
                    self.latch();
                }
                false
            }
            State::ReadScratchpad { bit } if bit < 72 => {
                self.state = State::ReadScratchpad { bit: bit + 1 };
                self.bytes()[bit / 8] & (1 << (bit % 8)) != 0
            }
            State::ReadPower => !self.parasite,
            _ => true,
        }
    }
}
