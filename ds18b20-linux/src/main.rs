use clap::Parser;
use ds18b20::{Ds18b20Group, Resolution};
use embedded_hal::delay::DelayNs;
use embedded_onewire::RomCode;
use linux_embedded_hal::{
    CdevPin,
    gpio_cdev::{Chip, LineRequestFlags},
};
use onewire_gpio::{OneWireGpioBuilder, Timing};

/// Read DS18B20 temperature sensors on a GPIO line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the GPIO character device
    #[arg(short, long, default_value = "/dev/gpiochip0")]
    chip: String,
    /// Offset of the 1-Wire data line on the chip
    #[arg(short, long)]
    line: u32,
    /// Conversion resolution in bits
    #[arg(short, long, default_value_t = 12, value_parser = clap::value_parser!(u8).range(9..=12))]
    resolution: u8,
    /// High alarm threshold in °C
    #[arg(long, default_value_t = 50, allow_negative_numbers = true)]
    t_high: i8,
    /// Low alarm threshold in °C
    #[arg(long, default_value_t = -40, allow_negative_numbers = true)]
    t_low: i8,
    /// Number of conversion cycles, forever if omitted
    #[arg(short = 'n', long)]
    count: Option<u64>,
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    let resolution = Resolution::from_bits(args.resolution).expect("Resolution out of range");
    // Request the line as an open-drain output, released
    let mut chip = Chip::new(&args.chip).expect("Failed to open GPIO chip");
    let handle = chip
        .get_line(args.line)
        .expect("Failed to get GPIO line")
        .request(
            LineRequestFlags::OUTPUT | LineRequestFlags::OPEN_DRAIN,
            1,
            "ds18b20",
        )
        .expect("Failed to request GPIO line");
    let pin = CdevPin::new(handle).expect("Failed to create GPIO pin");
    // Every character device access already takes a few microseconds
    let timing = Timing {
        presence_sample: 60,
        slot_start: 0,
        read_sample: 5,
        slot: 50,
        ..Timing::standard()
    };
    let mut bus = OneWireGpioBuilder::default()
        .with_timing(timing)
        .build(pin, linux_embedded_hal::Delay)
        .expect("Failed to create 1-Wire bus");
    let mut delay = linux_embedded_hal::Delay;
    // Create a DS18B20 temperature sensor group
    let mut sensors = Ds18b20Group::<16>::default()
        .with_resolution(resolution)
        .with_t_low(args.t_low)
        .with_t_high(args.t_high);
    // Enumerate devices on the 1-Wire bus
    let devices = sensors
        .enumerate(&mut bus)
        .expect("Failed to enumerate devices");
    log::info!("Found {} devices", devices);
    let mut cycle = 0;
    while args.count.is_none_or(|count| cycle < count) {
        cycle += 1;
        // Trigger temperature conversion
        match sensors.trigger_temperature_conversion(&mut bus, &mut delay) {
            Ok(()) => {}
            Err(e) if e.is_retryable() => {
                log::warn!("Conversion incomplete: {:?}", e);
                continue;
            }
            Err(e) => panic!("Failed to trigger temperature conversion: {:?}", e),
        }
        // Read temperatures from the sensors
        sensors
            .read_temperatures(&mut bus)
            .expect("Failed to read temperatures");
        for (rom, temp) in sensors.roms().iter().zip(sensors.temperatures()) {
            match temp {
                Some(temp) => log::info!("ROM: {}, Temperature: {}", rom, temp),
                None => log::warn!("ROM: {}, no reading", rom),
            }
        }
        let mut alarmed = [RomCode::default(); 16];
        let count = sensors
            .alarm_search(&mut bus, &mut alarmed)
            .expect("Failed to search alarms");
        for rom in &alarmed[..count] {
            log::warn!("ROM: {} outside [{}, {}] °C", rom, args.t_low, args.t_high);
        }
        delay.delay_ms(1000);
    }
}
