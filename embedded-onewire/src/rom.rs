use crate::OneWireCrc;
use core::fmt;

/// 64-bit registration number of a 1-Wire device, in bus (transmission) order.
///
/// | Byte | Description |
/// |------|-------------|
/// | 0 | Family code (e.g., 0x28 for DS18B20) |
/// | 1-6 | Serial number, least significant byte first |
/// | 7 | CRC-8 (`0b1_0011_0001` poly) of bytes 0-6 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct RomCode([u8; 8]);

impl RomCode {
    /// Build a ROM code from a family code and serial number, computing the CRC byte.
    pub fn new(family: u8, serial: [u8; 6]) -> Self {
        let mut rom = [family, 0, 0, 0, 0, 0, 0, 0];
        rom[1..7].copy_from_slice(&serial);
        rom[7] = OneWireCrc::compute(&rom[..7]);
        Self(rom)
    }

    /// Family code of the device.
    pub fn family(&self) -> u8 {
        self.0[0]
    }

    /// 48-bit serial number.
    pub fn serial(&self) -> [u8; 6] {
        let mut serial = [0; 6];
        serial.copy_from_slice(&self.0[1..7]);
        serial
    }

    /// CRC byte as stored in the ROM.
    pub fn crc(&self) -> u8 {
        self.0[7]
    }

    /// Check that the CRC byte matches the first seven bytes.
    pub fn is_valid(&self) -> bool {
        OneWireCrc::validate(&self.0)
    }

    /// Raw bytes in bus order.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Get the value of the ROM bit at `index` (0-63), in the order bits appear on the bus.
    pub fn bit(&self, index: u8) -> bool {
        self.0[(index / 8) as usize] & (1 << (index % 8)) != 0
    }
}

impl From<[u8; 8]> for RomCode {
    fn from(value: [u8; 8]) -> Self {
        Self(value)
    }
}

impl From<RomCode> for [u8; 8] {
    fn from(value: RomCode) -> Self {
        value.0
    }
}

impl From<u64> for RomCode {
    fn from(value: u64) -> Self {
        Self(value.to_le_bytes())
    }
}

impl From<RomCode> for u64 {
    fn from(value: RomCode) -> Self {
        u64::from_le_bytes(value.0)
    }
}

impl fmt::Display for RomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.iter() {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl fmt::LowerHex for RomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&u64::from(*self), f)
    }
}
