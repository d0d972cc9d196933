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
use std::{
    fmt,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::channel::Channel;

use super::{
    address::{self, Target},
    register::READY_FLAG,
    Bus, BusError, ConversionConfig, ConversionError, DataRate, Register,
};

/// How long to wait for the ready flag before giving up on a conversion.
pub const DEFAULT_CONVERSION_TIMEOUT: Duration = Duration::from_millis(100);

/// How long to wait between ready flag polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Both registers are 16 bits wide.
const REGISTER_LENGTH: usize = 2;

/// Runs single-shot conversions, one channel at a time.
///
/// Every conversion writes its own config and waits for it to finish before returning, so
/// there is never more than one conversion in flight on a device.
pub struct Sequencer {
    bus: Box<dyn Bus>,
    base_address: u8,
    data_rate: DataRate,
    timeout: Duration,
    poll_interval: Duration,
}

impl Sequencer {
    /// Creates a new sequencer for the ADC pair at base_address and base_address + 1.
    pub fn new(
        bus: Box<dyn Bus>,
        base_address: u8,
        data_rate: DataRate,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Sequencer {
        Sequencer {
            bus,
            base_address,
            data_rate,
            timeout,
            poll_interval,
        }
    }

    /// Makes sure that every ADC answers on the bus.
    pub fn initialize(&mut self) -> Result<(), BusError> {
        for address in address::addresses(self.base_address) {
            self.bus.select_device(address)?;
            debug!(address = format!("0x{:02x}", address), "ADC present.");
        }
        Ok(())
    }

    /// Converts the given channel and returns the raw signed result.
    pub fn convert(&mut self, channel: Channel) -> Result<i16, ConversionError> {
        self.convert_target(Target::for_channel(self.base_address, channel))
    }

    /// Converts a channel given as a raw index. Out of range indices read channel 0.
    pub fn convert_index(&mut self, channel: usize) -> Result<i16, ConversionError> {
        let target = address::resolve(self.base_address, channel).unwrap_or_else(|e| {
            warn!(channel, err = %e, "Invalid channel.");
            e.fallback
        });
        self.convert_target(target)
    }

    fn convert_target(&mut self, target: Target) -> Result<i16, ConversionError> {
        self.bus.select_device(target.address)?;

        let config = ConversionConfig::single_shot(target.local, self.data_rate);
        self.bus
            .write_register(Register::Config, &config.to_bytes())?;

        self.wait_for_ready(target)?;

        let result = self
            .bus
            .read_register(Register::Conversion, REGISTER_LENGTH)?;
        match result[..] {
            [high, low] => Ok(i16::from_be_bytes([high, low])),
            _ => Err(ConversionError::ShortRead {
                register: Register::Conversion,
                expected: REGISTER_LENGTH,
                actual: result.len(),
            }),
        }
    }

    /// Polls the config register until the device reports that it is idle again.
    fn wait_for_ready(&mut self, target: Target) -> Result<(), ConversionError> {
        let start = Instant::now();
        loop {
            let status = self.bus.read_register(Register::Config, REGISTER_LENGTH)?;
            if status.first().is_some_and(|high| high & READY_FLAG != 0) {
                return Ok(());
            }

            if start.elapsed() >= self.timeout {
                return Err(ConversionError::Timeout {
                    address: target.address,
                    local: target.local,
                    timeout: self.timeout,
                });
            }
            spin_sleep::sleep(self.poll_interval);
        }
    }
}

impl fmt::Display for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (base 0x{:02x})", self.bus, self.base_address)
    }
}

#[cfg(test)]
mod test {
    use std::{
        error::Error,
        time::{Duration, Instant},
    };

    use crate::{
        adc::{mock, mock::Transaction, BusError, ConversionError, DataRate, Register},
        channel::Channel,
    };

    use super::{Sequencer, DEFAULT_CONVERSION_TIMEOUT, DEFAULT_POLL_INTERVAL};

    const BASE: u8 = 0x48;

    fn sequencer() -> (mock::Bus, Sequencer) {
        let bus = mock::Bus::new("mock-bus", BASE);
        let sequencer = Sequencer::new(
            Box::new(bus.clone()),
            BASE,
            DataRate::Sps860,
            DEFAULT_CONVERSION_TIMEOUT,
            DEFAULT_POLL_INTERVAL,
        );
        (bus, sequencer)
    }

    #[test]
    fn test_convert() -> Result<(), Box<dyn Error>> {
        let (bus, mut sequencer) = sequencer();
        bus.set_samples(5, &[-200]);
        bus.set_busy_polls(2);

        assert_eq!(-200, sequencer.convert(Channel::new(5)?)?);

        let transactions = bus.transactions();
        assert_eq!(Transaction::Select(BASE + 1), transactions[0]);
        assert_eq!(
            Transaction::Write {
                address: BASE + 1,
                register: Register::Config,
                bytes: vec![0xD1, 0xE3],
            },
            transactions[1]
        );
        // Two busy polls, one ready poll, then the result.
        assert_eq!(
            3,
            transactions
                .iter()
                .filter(|t| matches!(
                    t,
                    Transaction::Read {
                        register: Register::Config,
                        ..
                    }
                ))
                .count()
        );
        assert_eq!(
            Some(&Transaction::Read {
                address: BASE + 1,
                register: Register::Conversion,
            }),
            transactions.last()
        );
        Ok(())
    }

    #[test]
    fn test_convert_sign() -> Result<(), Box<dyn Error>> {
        let (bus, mut sequencer) = sequencer();
        bus.set_samples(0, &[i16::MIN, -1, 0x7FFF]);

        let channel = Channel::new(0)?;
        assert_eq!(i16::MIN, sequencer.convert(channel)?);
        assert_eq!(-1, sequencer.convert(channel)?);
        assert_eq!(0x7FFF, sequencer.convert(channel)?);
        Ok(())
    }

    #[test]
    fn test_convert_timeout() -> Result<(), Box<dyn Error>> {
        let (bus, mut sequencer) = sequencer();
        bus.set_samples(3, &[1000]);
        bus.set_stuck(3, true);

        let start = Instant::now();
        let result = sequencer.convert(Channel::new(3)?);
        assert!(start.elapsed() >= Duration::from_millis(100));

        match result {
            Err(ConversionError::Timeout { address, local, .. }) => {
                assert_eq!(BASE, address);
                assert_eq!(3, local);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(!bus.transactions().contains(&Transaction::Read {
            address: BASE,
            register: Register::Conversion,
        }));
        Ok(())
    }

    #[test]
    fn test_convert_no_acknowledge() -> Result<(), Box<dyn Error>> {
        let (bus, mut sequencer) = sequencer();
        bus.set_absent(BASE + 1, true);

        let result = sequencer.convert(Channel::new(6)?);
        assert!(matches!(
            result,
            Err(ConversionError::Bus(BusError::NoAcknowledge(0x49)))
        ));
        // Never configured and never polled.
        assert_eq!(vec![Transaction::Select(BASE + 1)], bus.transactions());
        Ok(())
    }

    #[test]
    fn test_convert_index_out_of_range_reads_channel_0() -> Result<(), Box<dyn Error>> {
        let (bus, mut sequencer) = sequencer();
        bus.set_samples(0, &[42]);
        bus.set_samples(1, &[7]);

        assert_eq!(42, sequencer.convert_index(12)?);
        assert_eq!(7, sequencer.convert_index(1)?);
        Ok(())
    }

    #[test]
    fn test_initialize() {
        let (bus, mut sequencer) = sequencer();
        assert!(sequencer.initialize().is_ok());
        assert_eq!(
            vec![Transaction::Select(BASE), Transaction::Select(BASE + 1)],
            bus.transactions()
        );

        bus.set_absent(BASE + 1, true);
        assert!(matches!(
            sequencer.initialize(),
            Err(BusError::NoAcknowledge(0x49))
        ));
    }
}
