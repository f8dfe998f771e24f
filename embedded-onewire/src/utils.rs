/// Reflected form of the 1-Wire CRC-8 polynomial x^8 + x^5 + x^4 + 1.
const CRC8_POLY: u8 = 0x8c;

#[cfg(feature = "crc-table")]
static CRC8_TABLE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = crc8_bitwise(0, i as u8);
        i += 1;
    }
    table
};

const fn crc8_bitwise(crc: u8, byte: u8) -> u8 {
    let mut crc = crc ^ byte; // XOR the byte with the current CRC value
    let mut i = 0;
    while i < 8 {
        if crc & 0x1 == 0x1 {
            crc = (crc >> 1) ^ CRC8_POLY;
        } else {
            crc >>= 1;
        }
        i += 1;
    }
    crc
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Calculate CRC-8 used in 1-Wire communications.
pub struct OneWireCrc(u8);

impl OneWireCrc {
    /// Get the current CRC value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Update the CRC with the incoming byte.
    pub fn update(&mut self, byte: u8) {
        #[cfg(feature = "crc-table")]
        {
            self.0 = CRC8_TABLE[(self.0 ^ byte) as usize];
        }
        #[cfg(not(feature = "crc-table"))]
        {
            self.0 = crc8_bitwise(self.0, byte);
        }
    }

    /// Compute the CRC of a sequence of bytes.
    pub fn compute(sequence: &[u8]) -> u8 {
        let mut crc = OneWireCrc::default();
        for &byte in sequence.iter() {
            crc.update(byte);
        }
        crc.value()
    }

    /// Validate a sequence of bytes where the last byte is the 1-Wire CRC of
    /// the previous bytes.
    pub fn validate(sequence: &[u8]) -> bool {
        // If the last byte is the CRC of the rest, the running CRC ends at 0
        !sequence.is_empty() && Self::compute(sequence) == 0x0
    }
}
