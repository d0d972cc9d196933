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
use crate::channel::{Channel, InvalidArgument, CHANNEL_COUNT};

/// The number of inputs on each ADC.
pub const CHANNELS_PER_DEVICE: usize = 4;

/// The number of ADCs on the bus.
pub const DEVICE_COUNT: usize = CHANNEL_COUNT / CHANNELS_PER_DEVICE;

/// A physical input: the bus address of the ADC and the input on that ADC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub address: u8,
    pub local: u8,
}

impl Target {
    /// Gets the physical input for a logical channel.
    pub fn for_channel(base: u8, channel: Channel) -> Target {
        let index = channel.index();
        Target {
            address: base + (index / CHANNELS_PER_DEVICE) as u8,
            local: (index % CHANNELS_PER_DEVICE) as u8,
        }
    }
}

/// An out of range channel was resolved. Carries the channel 0 target that the caller
/// should fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{error}, reading from channel 0")]
pub struct OutOfRange {
    pub error: InvalidArgument,
    pub fallback: Target,
}

/// Resolves a raw channel index into its physical input.
pub fn resolve(base: u8, channel: usize) -> Result<Target, OutOfRange> {
    match Channel::new(channel) {
        Ok(channel) => Ok(Target::for_channel(base, channel)),
        Err(error) => Err(OutOfRange {
            error,
            fallback: Target { address: base, local: 0 },
        }),
    }
}

/// Every bus address used by the ADC pair.
pub fn addresses(base: u8) -> impl Iterator<Item = u8> {
    (0..DEVICE_COUNT as u8).map(move |offset| base + offset)
}

#[cfg(test)]
mod test {
    use super::*;

    const BASE: u8 = 0x48;

    #[test]
    fn test_resolve_first_device() {
        for channel in 0..4 {
            assert_eq!(
                Ok(Target {
                    address: BASE,
                    local: channel as u8
                }),
                resolve(BASE, channel)
            );
        }
    }

    #[test]
    fn test_resolve_second_device() {
        for channel in 4..8 {
            assert_eq!(
                Ok(Target {
                    address: BASE + 1,
                    local: (channel - 4) as u8
                }),
                resolve(BASE, channel)
            );
        }
    }

    #[test]
    fn test_resolve_out_of_range_falls_back_to_channel_0() {
        let zero = resolve(BASE, 0).expect("channel 0 is valid");
        for channel in [8, 9, 100, usize::MAX] {
            let err = resolve(BASE, channel).expect_err("channel should be out of range");
            assert_eq!(zero, err.fallback);
            assert_eq!(InvalidArgument::Channel(channel), err.error);
        }
    }

    #[test]
    fn test_addresses() {
        assert_eq!(vec![0x48, 0x49], addresses(BASE).collect::<Vec<u8>>());
    }
}
