use crate::{LineStatus, OneWireGpio, OneWireGpioError};
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use embedded_onewire::{OneWire, OneWireError, OneWireResult};

impl<P: InputPin + OutputPin, D: DelayNs> OneWire for OneWireGpio<P, D> {
    type Status = LineStatus;

    type BusError = OneWireGpioError<P::Error>;

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        let t = self.timing;
        self.drive_low()?;
        self.delay.delay_us(t.reset_low);
        self.release()?;
        self.delay.delay_us(t.presence_sample);
        // devices answer by holding the line low
        let presence = !self.sample()?;
        self.delay.delay_us(t.reset_recovery);
        let shorted = !self.sample()?;
        if shorted {
            log::warn!("1-Wire line still low after reset, bus shorted");
            Err(OneWireError::ShortCircuit)
        } else if !presence {
            log::debug!("no presence pulse on 1-Wire bus");
            Err(OneWireError::NoDevicePresent)
        } else {
            Ok(LineStatus { presence, shorted })
        }
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        let t = self.timing;
        self.drive_low()?;
        self.delay.delay_us(t.slot_start);
        if bit {
            self.release()?;
            self.delay.delay_us(t.slot);
        } else {
            self.delay.delay_us(t.slot);
            self.release()?;
        }
        self.delay.delay_us(t.recovery);
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        let t = self.timing;
        self.drive_low()?;
        self.delay.delay_us(t.slot_start);
        self.release()?;
        self.delay.delay_us(t.read_sample);
        let bit = self.sample()?;
        // wait out the rest of the slot
        self.delay
            .delay_us(t.slot.saturating_sub(t.read_sample) + t.recovery);
        Ok(bit)
    }
}
