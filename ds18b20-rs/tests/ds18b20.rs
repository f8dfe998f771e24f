mod common;

use common::SimDs18b20;
use ds18b20::{Ds18b20, Ds18b20Error, Resolution, Temperature};
use embedded_onewire::{ONEWIRE_MATCH_ROM_CMD, RomCode, mock::SimBus};

fn t(v: f64) -> Temperature {
    Temperature::from_num(v)
}

fn single(sim: SimDs18b20) -> (Ds18b20, SimBus<SimDs18b20>) {
    let dev = Ds18b20::new(sim_rom(&sim));
    (dev, SimBus::new([sim]))
}

fn sim_rom(sim: &SimDs18b20) -> RomCode {
    use embedded_onewire::mock::SimDevice;
    sim.rom()
}

fn wait_done(bus: &mut SimBus<SimDs18b20>) {
    while !Ds18b20::all_conversions_done(bus).unwrap() {}
}

#[test]
fn is_device_checks_family_only() {
    for family in 0..=255u8 {
        let rom = RomCode::from([family, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(Ds18b20::is_device(&rom), family == 0x28);
    }
}

#[test]
fn other_families_are_rejected_without_bus_traffic() {
    let (dev, mut bus) = single(SimDs18b20::with_rom(RomCode::new(0x10, [1; 6])));
    assert_eq!(dev.start_conversion(&mut bus), Err(Ds18b20Error::NotDs18b20));
    assert_eq!(dev.read_temperature(&mut bus), Err(Ds18b20Error::NotDs18b20));
    assert_eq!(
        dev.set_resolution(&mut bus, Resolution::Bits9),
        Err(Ds18b20Error::NotDs18b20)
    );
    assert_eq!(dev.set_alarm_high(&mut bus, 30), Err(Ds18b20Error::NotDs18b20));
    assert_eq!(bus.resets(), 0);
    assert!(bus.written().is_empty());
}

#[test]
fn start_conversion_selects_device() {
    let (dev, mut bus) = single(SimDs18b20::new(1));
    dev.start_conversion(&mut bus).unwrap();
    let mut expected = vec![ONEWIRE_MATCH_ROM_CMD];
    expected.extend_from_slice(dev.rom().as_bytes());
    expected.push(0x44);
    assert_eq!(bus.written(), expected);
}

#[test]
fn conversions_done_when_line_released() {
    let mut a = SimDs18b20::new(1);
    a.conversion_slots = 2;
    let mut b = SimDs18b20::new(2);
    b.conversion_slots = 4;
    let mut bus = SimBus::new([a, b]);
    Ds18b20::start_conversion_all(&mut bus).unwrap();
    for _ in 0..4 {
        assert!(!Ds18b20::all_conversions_done(&mut bus).unwrap());
    }
    assert!(Ds18b20::all_conversions_done(&mut bus).unwrap());
}

#[test]
fn read_before_conversion_done_is_pending() {
    let (dev, mut bus) = single(SimDs18b20::new(1));
    dev.start_conversion(&mut bus).unwrap();
    let err = dev.read_temperature(&mut bus).unwrap_err();
    assert_eq!(err, Ds18b20Error::ConversionPending);
    assert!(err.is_retryable());
    wait_done(&mut bus);
    assert_eq!(dev.read_temperature(&mut bus), Ok(t(25.0625)));
}

#[test]
fn negative_temperature() {
    let (dev, mut bus) = single(SimDs18b20::new(1).with_temperature(0xff5e));
    dev.start_conversion(&mut bus).unwrap();
    wait_done(&mut bus);
    assert_eq!(dev.read_temperature(&mut bus), Ok(t(-10.125)));
}

#[test]
fn corrupted_scratchpad_fails_crc() {
    let mut sim = SimDs18b20::new(1);
    sim.corrupt_crc = true;
    let (dev, mut bus) = single(sim);
    dev.start_conversion(&mut bus).unwrap();
    wait_done(&mut bus);
    let err = dev.read_temperature(&mut bus).unwrap_err();
    assert_eq!(err, Ds18b20Error::InvalidCrc);
    assert!(err.is_retryable());
}

#[test]
fn scratchpad_contents() {
    let (dev, mut bus) = single(SimDs18b20::new(1));
    let sp = dev.read_scratchpad(&mut bus).unwrap();
    assert_eq!(sp.temperature(), t(85.0));
    assert_eq!(sp.alarm_high, 75);
    assert_eq!(sp.alarm_low, 70);
    assert_eq!(sp.resolution(), Resolution::Bits12);
}

#[test]
fn set_resolution_keeps_alarms_and_persists() {
    let (dev, mut bus) = single(SimDs18b20::new(1));
    dev.set_resolution(&mut bus, Resolution::Bits9).unwrap();
    let sim = &bus.devices()[0];
    assert_eq!(sim.config(), 0x1f);
    assert_eq!((sim.alarm_high(), sim.alarm_low()), (75, 70));
    assert_eq!(sim.eeprom, [0x4b, 0x46, 0x1f]);
    assert_eq!(sim.copies, 1);
    assert_eq!(dev.resolution(&mut bus), Ok(Resolution::Bits9));

    dev.start_conversion(&mut bus).unwrap();
    wait_done(&mut bus);
    assert_eq!(dev.read_temperature(&mut bus), Ok(t(25.0)));
}

#[test]
fn alarm_thresholds_are_clamped() {
    let (dev, mut bus) = single(SimDs18b20::new(1));
    dev.set_alarm_high(&mut bus, 127).unwrap();
    dev.set_alarm_low(&mut bus, -100).unwrap();
    assert_eq!(dev.alarm_thresholds(&mut bus), Ok((125, -55)));
    dev.set_alarm_high(&mut bus, 27).unwrap();
    dev.set_alarm_low(&mut bus, -5).unwrap();
    assert_eq!(dev.alarm_thresholds(&mut bus), Ok((27, -5)));
    let sim = &bus.devices()[0];
    assert_eq!(sim.config(), 0x7f);
    assert_eq!(sim.copies, 4);
    assert_eq!(sim.eeprom, [27, -5i8 as u8, 0x7f]);
}

#[test]
fn disable_alarms_opens_window() {
    let (dev, mut bus) = single(SimDs18b20::new(1));
    dev.disable_alarms(&mut bus).unwrap();
    assert_eq!(dev.alarm_thresholds(&mut bus), Ok((125, -55)));
}

#[test]
fn recall_eeprom_restores_registers() {
    let (dev, mut bus) = single(SimDs18b20::new(1));
    dev.write_scratchpad(&mut bus, 10, 0, Resolution::Bits10).unwrap();
    assert_eq!(dev.alarm_thresholds(&mut bus), Ok((10, 0)));
    dev.recall_eeprom(&mut bus).unwrap();
    assert_eq!(dev.alarm_thresholds(&mut bus), Ok((75, 70)));
    assert_eq!(dev.resolution(&mut bus), Ok(Resolution::Bits12));
}

#[test]
fn power_supply_mode() {
    let mut sim = SimDs18b20::new(1);
    sim.parasite = true;
    let (dev, mut bus) = single(sim);
    assert_eq!(dev.is_parasite_powered(&mut bus), Ok(true));
    bus.devices_mut()[0].parasite = false;
    assert_eq!(dev.is_parasite_powered(&mut bus), Ok(false));
}

#[test]
fn missing_device_is_a_bus_fault() {
    let (dev, _) = single(SimDs18b20::new(1));
    let mut empty = SimBus::<SimDs18b20>::new([]);
    let err = dev.start_conversion(&mut empty).unwrap_err();
    assert_eq!(
        err,
        Ds18b20Error::OneWire(embedded_onewire::OneWireError::NoDevicePresent)
    );
    assert!(!err.is_retryable());
    assert_eq!(empty.resets(), 1);
}

/// A device that holds the data line low in every function-layer read slot.
struct StuckLow(RomCode);

impl embedded_onewire::mock::SimDevice for StuckLow {
    fn rom(&self) -> RomCode {
        self.0
    }

    fn read_bit(&mut self) -> bool {
        false
    }
}

#[test]
fn line_held_low_is_not_a_scratchpad() {
    let rom = RomCode::new(0x28, [1; 6]);
    let dev = Ds18b20::new(rom);
    let mut bus = SimBus::new([StuckLow(rom)]);
    let err = dev.read_scratchpad(&mut bus).unwrap_err();
    assert_eq!(err, Ds18b20Error::InvalidCrc);
    assert!(err.is_retryable());

    bus.clear_written();
    assert_eq!(dev.set_alarm_high(&mut bus, 40), Err(Ds18b20Error::InvalidCrc));
    assert_eq!(dev.set_resolution(&mut bus, Resolution::Bits9), Err(Ds18b20Error::InvalidCrc));
    let mut read = vec![ONEWIRE_MATCH_ROM_CMD];
    read.extend_from_slice(rom.as_bytes());
    read.push(0xbe);
    assert_eq!(bus.written(), [read.clone(), read].concat());
}
