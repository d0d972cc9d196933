// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::fmt;

use crate::config;

pub mod address;
pub mod error;
pub mod i2c;
pub mod mock;
pub mod register;
pub mod sequencer;

pub use address::{resolve, Target};
pub use error::{BusError, ConversionError};
pub use register::{ConversionConfig, DataRate, Register};
pub use sequencer::Sequencer;

/// A register level connection to the ADC pair. Implementations perform exactly the
/// requested bus transaction and never retry.
pub trait Bus: fmt::Display + Send {
    /// Binds subsequent register operations to the device at the given address.
    fn select_device(&mut self, address: u8) -> Result<(), BusError>;

    /// Writes the bytes to the register of the selected device.
    fn write_register(&mut self, register: Register, bytes: &[u8]) -> Result<(), BusError>;

    /// Points at the register of the selected device and reads `length` bytes from it.
    fn read_register(&mut self, register: Register, length: usize) -> Result<Vec<u8>, BusError>;
}

/// Opens the bus with the given device name.
pub fn open(config: &config::Adc) -> Result<Box<dyn Bus>, BusError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Box::new(mock::Bus::new(device, config.base_address())));
    }

    Ok(Box::new(i2c::Bus::open(device)?))
}
