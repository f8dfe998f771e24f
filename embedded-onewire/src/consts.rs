//! Command constants for 1-Wire communication.

/// Command to read the ROM of the only device on the bus.
///
/// Only usable on a single-drop bus: with several devices present the
/// wired-AND of all ROMs is returned and the CRC check fails.
pub const ONEWIRE_READ_ROM_CMD: u8 = 0x33;

/// Command to match a specific ROM address in 1-Wire communication
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM address in 1-Wire communication
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;

/// Command to search for devices on the 1-Wire bus
pub const ONEWIRE_SEARCH_CMD: u8 = 0xf0;

/// Command to search for devices in alarm state on the 1-Wire bus
pub const ONEWIRE_CONDITIONAL_SEARCH_CMD: u8 = 0xec;
