#![no_std]
#![deny(missing_docs)]
//! # embedded-onewire
//! A no-std implementation of the 1-Wire protocol.
//!
//! This crate provides a trait-based interface for 1-Wire communication, allowing you to implement the protocol on various platforms.
//! [OneWire] trait defines the basic operations required for 1-Wire communication: resetting the bus and reading and writing
//! single time slots. Byte transfers and ROM addressing are provided on top of those.
//!
//! The crate also provides the [search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html)
//! for discovering devices on the bus in [OneWireSearch], the Dallas/Maxim CRC-8 in [OneWireCrc], and, with the `mock`
//! feature, an in-memory bus ([`mock::SimBus`]) for testing drivers without hardware.

#[cfg(any(test, feature = "mock"))]
extern crate std;

mod consts;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod rom;
mod search;
mod traits;
mod utils;
pub use consts::*;
pub use error::OneWireError;
pub use rom::RomCode;
pub use search::{OneWireSearch, OneWireSearchKind};
pub use traits::{OneWire, OneWireStatus};
pub use utils::OneWireCrc;

/// Error type for 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;
