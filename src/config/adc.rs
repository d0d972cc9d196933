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
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use crate::adc::{
    address::DEVICE_COUNT,
    sequencer::{DEFAULT_CONVERSION_TIMEOUT, DEFAULT_POLL_INTERVAL},
    DataRate,
};

use super::error::ConfigError;

/// 0x48, the address of an ADS1115 with ADDR tied to ground.
pub const DEFAULT_BASE_ADDRESS: u8 = 0x48;

/// The highest valid 7-bit I2C address.
const MAX_ADDRESS: u8 = 0x7f;

/// A YAML representation of the ADC pair.
#[derive(Deserialize, Clone, Debug)]
pub struct Adc {
    /// The I2C bus device, e.g. /dev/i2c-3.
    device: String,

    /// The address of the first ADC. The second one sits at the next address.
    base_address: Option<u8>,

    /// The data rate in samples per second.
    data_rate: Option<u16>,

    /// How long to wait for a single conversion.
    conversion_timeout: Option<String>,

    /// How long to wait between ready polls.
    poll_interval: Option<String>,
}

impl Adc {
    /// New will create a new ADC configuration with defaults for everything but the device.
    pub fn new(device: &str) -> Adc {
        Adc {
            device: device.to_string(),
            base_address: None,
            data_rate: None,
            conversion_timeout: None,
            poll_interval: None,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the base address (default: 0x48).
    pub fn base_address(&self) -> u8 {
        self.base_address.unwrap_or(DEFAULT_BASE_ADDRESS)
    }

    /// Returns the data rate (default: 860 SPS).
    pub fn data_rate(&self) -> Result<DataRate, ConfigError> {
        match self.data_rate {
            Some(sps) => DataRate::from_sps(sps).ok_or_else(|| {
                ConfigError::Invalid(format!("{} is not a supported data rate", sps))
            }),
            None => Ok(DataRate::default()),
        }
    }

    /// Returns the conversion timeout (default: 100ms).
    pub fn conversion_timeout(&self) -> Result<Duration, ConfigError> {
        match &self.conversion_timeout {
            Some(timeout) => Ok(DurationString::from_string(timeout.clone())?.into()),
            None => Ok(DEFAULT_CONVERSION_TIMEOUT),
        }
    }

    /// Returns the interval between ready polls (default: 100us).
    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        match &self.poll_interval {
            Some(interval) => Ok(DurationString::from_string(interval.clone())?.into()),
            None => Ok(DEFAULT_POLL_INTERVAL),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        let base_address = self.base_address();
        let last_address = usize::from(base_address) + DEVICE_COUNT - 1;
        if last_address > usize::from(MAX_ADDRESS) {
            return Err(ConfigError::Invalid(format!(
                "base address 0x{:02x} leaves no room for {} devices",
                base_address, DEVICE_COUNT
            )));
        }

        self.data_rate()?;
        if self.conversion_timeout()?.is_zero() {
            return Err(ConfigError::Invalid(
                "conversion timeout must be positive".to_string(),
            ));
        }
        self.poll_interval()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::adc::DataRate;

    use super::{Adc, DEFAULT_BASE_ADDRESS};

    #[test]
    fn test_defaults() {
        let adc = Adc::new("/dev/i2c-3");
        assert_eq!("/dev/i2c-3", adc.device());
        assert_eq!(DEFAULT_BASE_ADDRESS, adc.base_address());
        assert_eq!(DataRate::Sps860, adc.data_rate().unwrap());
        assert_eq!(Duration::from_millis(100), adc.conversion_timeout().unwrap());
        assert_eq!(Duration::from_micros(100), adc.poll_interval().unwrap());
        assert!(adc.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let mut adc = Adc::new("mock");
        adc.base_address = Some(0x7f);
        assert!(adc.validate().is_err());
        adc.base_address = Some(0x7e);
        assert!(adc.validate().is_ok());

        adc.data_rate = Some(1000);
        assert!(adc.data_rate().is_err());
        assert!(adc.validate().is_err());
        adc.data_rate = Some(128);
        assert_eq!(DataRate::Sps128, adc.data_rate().unwrap());

        adc.conversion_timeout = Some("forever".to_string());
        assert!(adc.validate().is_err());
        adc.conversion_timeout = Some("0ms".to_string());
        assert!(adc.validate().is_err());
    }
}
