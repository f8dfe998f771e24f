use bitfield_struct::bitfield;
use fixed::types::I12F4;

/// Temperature in °C, with the 1/16 °C step of the DS18B20 temperature register.
pub type Temperature = I12F4;

/// Lowest temperature the alarm registers accept.
pub const ALARM_MIN: i8 = -55;
/// Highest temperature the alarm registers accept.
pub const ALARM_MAX: i8 = 125;

/// Conversion resolution.
///
/// The discriminant is the value of the configuration register for that resolution.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Resolution {
    /// 9 bits, 0.5 °C
    Bits9 = 0x1f,
    /// 10 bits, 0.25 °C
    Bits10 = 0x3f,
    /// 11 bits, 0.125 °C
    Bits11 = 0x5f,
    /// 12 bits, 0.0625 °C (power-on default)
    #[default]
    Bits12 = 0x7f,
}

impl Resolution {
    /// Number of bits of the conversion result.
    pub fn bits(&self) -> u8 {
        9 + self.code()
    }

    /// Resolution with the given number of bits (9 to 12).
    pub fn from_bits(bits: u8) -> Option<Self> {
        use Resolution::*;
        match bits {
            9 => Some(Bits9),
            10 => Some(Bits10),
            11 => Some(Bits11),
            12 => Some(Bits12),
            _ => None,
        }
    }

    /// Smallest temperature step at this resolution.
    pub fn step(&self) -> Temperature {
        Temperature::from_bits(1 << (12 - self.bits()))
    }

    /// Maximum conversion time, in microseconds.
    pub fn conversion_time_us(&self) -> u32 {
        use Resolution::*;
        match self {
            Bits9 => 93750,
            Bits10 => 187500,
            Bits11 => 375000,
            Bits12 => 750000,
        }
    }

    /// Value of the R1:R0 configuration bits.
    pub(crate) fn code(&self) -> u8 {
        (*self as u8 >> 5) & 0x3
    }

    pub(crate) fn from_code(code: u8) -> Self {
        use Resolution::*;
        match code & 0x3 {
            0 => Bits9,
            1 => Bits10,
            2 => Bits11,
            _ => Bits12,
        }
    }

    /// Mask of the temperature register bits that are defined at this resolution.
    fn mask(&self) -> u16 {
        !((1u16 << (12 - self.bits())) - 1)
    }
}

impl From<Configuration> for Resolution {
    fn from(value: Configuration) -> Self {
        Resolution::from_code(value.resolution_code())
    }
}

/// Configuration register (byte 4 of the scratchpad).
///
/// Only the R1:R0 bits are meaningful; the low five bits always read as 1 and bit 7 as 0.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Configuration {
    #[bits(5, default = 0x1f)]
    __: u8,
    /// R1:R0 conversion resolution code, 0 (9 bits) to 3 (12 bits).
    #[bits(2)]
    pub resolution_code: u8,
    __: bool,
}

impl Configuration {
    /// Configuration register selecting `resolution`.
    pub fn with_resolution(self, resolution: Resolution) -> Self {
        self.with_resolution_code(resolution.code())
    }

    /// Conversion resolution selected by this register.
    pub fn resolution(&self) -> Resolution {
        Resolution::from(*self)
    }
}

/// Contents of the DS18B20 scratchpad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scratchpad {
    /// Raw temperature register, two's complement with 4 fractional bits.
    pub temperature: u16,
    /// TH alarm register, °C.
    pub alarm_high: i8,
    /// TL alarm register, °C.
    pub alarm_low: i8,
    /// Configuration register.
    pub config: Configuration,
    /// Reserved bytes 5 to 7.
    pub reserved: [u8; 3],
    /// CRC of bytes 0 to 7.
    pub crc: u8,
}

impl Scratchpad {
    /// Temperature decoded at the configured resolution.
    pub fn temperature(&self) -> Temperature {
        decode_temperature(self.temperature, self.config.resolution())
    }

    /// Configured resolution.
    pub fn resolution(&self) -> Resolution {
        self.config.resolution()
    }
}

impl From<[u8; 9]> for Scratchpad {
    fn from(buf: [u8; 9]) -> Self {
        Self {
            temperature: u16::from_le_bytes([buf[0], buf[1]]),
            alarm_high: buf[2] as i8,
            alarm_low: buf[3] as i8,
            config: Configuration::from_bits(buf[4]),
            reserved: [buf[5], buf[6], buf[7]],
            crc: buf[8],
        }
    }
}

/// Decode a raw temperature register value.
///
/// At resolutions below 12 bits the lowest bits are undefined; they are dropped from the
/// magnitude, so the result is truncated towards zero.
pub fn decode_temperature(raw: u16, resolution: Resolution) -> Temperature {
    let negative = raw & 0x8000 != 0;
    let magnitude = if negative { raw.wrapping_neg() } else { raw } & resolution.mask();
    let bits = magnitude as i16;
    Temperature::from_bits(if negative { bits.wrapping_neg() } else { bits })
}

/// Clamp an alarm threshold into the range of the alarm registers.
pub fn clamp_alarm(temp: i8) -> i8 {
    temp.clamp(ALARM_MIN, ALARM_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(v: f64) -> Temperature {
        Temperature::from_num(v)
    }

    #[test]
    fn datasheet_conversions() {
        use Resolution::Bits12;
        assert_eq!(decode_temperature(0x07d0, Bits12), t(125.0));
        assert_eq!(decode_temperature(0x0550, Bits12), t(85.0));
        assert_eq!(decode_temperature(0x0191, Bits12), t(25.0625));
        assert_eq!(decode_temperature(0x00a2, Bits12), t(10.125));
        assert_eq!(decode_temperature(0x0008, Bits12), t(0.5));
        assert_eq!(decode_temperature(0x0000, Bits12), t(0.0));
        assert_eq!(decode_temperature(0xfff8, Bits12), t(-0.5));
        assert_eq!(decode_temperature(0xff5e, Bits12), t(-10.125));
        assert_eq!(decode_temperature(0xfe6f, Bits12), t(-25.0625));
        assert_eq!(decode_temperature(0xfc90, Bits12), t(-55.0));
    }

    #[test]
    fn lower_resolutions_drop_undefined_bits() {
        use Resolution::*;
        let cases = [
            (0x0191, [25.0, 25.0, 25.0, 25.0625]),
            (0x019c, [25.5, 25.75, 25.75, 25.75]),
            (0x019e, [25.5, 25.75, 25.875, 25.875]),
            (0xff5e, [-10.0, -10.0, -10.125, -10.125]),
            (0xfff8, [-0.5, -0.5, -0.5, -0.5]),
        ];
        for (raw, expected) in cases {
            for (res, exp) in [Bits9, Bits10, Bits11, Bits12].into_iter().zip(expected) {
                assert_eq!(decode_temperature(raw, res), t(exp), "{raw:#06x} at {res:?}");
            }
        }
    }

    #[test]
    fn resolution_codes() {
        use Resolution::*;
        for (res, bits, step) in [
            (Bits9, 9, 0.5),
            (Bits10, 10, 0.25),
            (Bits11, 11, 0.125),
            (Bits12, 12, 0.0625),
        ] {
            assert_eq!(res.bits(), bits);
            assert_eq!(Resolution::from_bits(bits), Some(res));
            assert_eq!(res.step(), t(step));
            assert_eq!(Configuration::new().with_resolution(res).into_bits(), res as u8);
            assert_eq!(Configuration::from_bits(res as u8).resolution(), res);
        }
        assert_eq!(Resolution::from_bits(8), None);
        assert_eq!(Resolution::default(), Bits12);
    }

    #[test]
    fn configuration_keeps_other_bits() {
        let conf = Configuration::from_bits(0x7f).with_resolution(Resolution::Bits10);
        assert_eq!(conf.into_bits(), 0x3f);
    }

    #[test]
    fn scratchpad_layout() {
        let sp = Scratchpad::from([0x91, 0x01, 0x4b, 0xc9, 0x5f, 0xff, 0x0c, 0x10, 0x00]);
        assert_eq!(sp.temperature(), t(25.0));
        assert_eq!(sp.alarm_high, 75);
        assert_eq!(sp.alarm_low, -55);
        assert_eq!(sp.resolution(), Resolution::Bits11);
    }

    #[test]
    fn alarm_clamp() {
        assert_eq!(clamp_alarm(127), 125);
        assert_eq!(clamp_alarm(-128), -55);
        assert_eq!(clamp_alarm(27), 27);
    }
}
