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

use embedded_hal::i2c::{self, ErrorKind, I2c};
use linux_embedded_hal::I2cdev;
use tracing::info;

use super::{BusError, Register};

/// An ADC bus on top of any embedded-hal I2C implementation.
pub struct Bus<I2C> {
    name: String,
    i2c: I2C,
    selected: Option<u8>,
}

impl Bus<I2cdev> {
    /// Opens the Linux I2C character device at the given path, e.g. /dev/i2c-3.
    pub fn open(path: &str) -> Result<Bus<I2cdev>, BusError> {
        let i2c = I2cdev::new(path).map_err(|e| BusError::Open {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        info!(path, "Opened I2C bus.");
        Ok(Bus::new(path, i2c))
    }
}

impl<I2C: I2c> Bus<I2C> {
    /// Wraps the given I2C implementation.
    pub fn new(name: &str, i2c: I2C) -> Bus<I2C> {
        Bus {
            name: name.to_string(),
            i2c,
            selected: None,
        }
    }

    fn selected(&self) -> Result<u8, BusError> {
        self.selected.ok_or(BusError::NoDeviceSelected)
    }

    /// Maps an I2C error onto a bus error. A missing acknowledge means the device is gone.
    fn bus_error(address: u8, register: Register, error: I2C::Error) -> BusError {
        match i2c::Error::kind(&error) {
            ErrorKind::NoAcknowledge(_) => BusError::NoAcknowledge(address),
            kind => BusError::Transfer {
                address,
                register,
                reason: format!("{:?}", kind),
            },
        }
    }
}

impl<I2C: I2c + Send> super::Bus for Bus<I2C> {
    /// Selects the device by pointing it at its config register. The write is harmless and
    /// fails when nothing acknowledges the address.
    fn select_device(&mut self, address: u8) -> Result<(), BusError> {
        self.selected = None;
        self.i2c
            .write(address, &[Register::Config.id()])
            .map_err(|e| Self::bus_error(address, Register::Config, e))?;
        self.selected = Some(address);
        Ok(())
    }

    fn write_register(&mut self, register: Register, bytes: &[u8]) -> Result<(), BusError> {
        let address = self.selected()?;
        let mut frame = Vec::with_capacity(bytes.len() + 1);
        frame.push(register.id());
        frame.extend_from_slice(bytes);
        self.i2c
            .write(address, &frame)
            .map_err(|e| Self::bus_error(address, register, e))
    }

    fn read_register(&mut self, register: Register, length: usize) -> Result<Vec<u8>, BusError> {
        let address = self.selected()?;
        let mut buf = vec![0u8; length];
        self.i2c
            .write_read(address, &[register.id()], &mut buf)
            .map_err(|e| Self::bus_error(address, register, e))?;
        Ok(buf)
    }
}

impl<I2C> fmt::Display for Bus<I2C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (I2C)", self.name)
    }
}
