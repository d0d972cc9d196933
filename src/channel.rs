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

/// The number of logical sensor channels exposed by the two ADCs.
pub const CHANNEL_COUNT: usize = 8;

/// Rejected input at a component boundary. Nothing is mutated when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("invalid channel {0}, must be between 0 and {max}", max = CHANNEL_COUNT - 1)]
    Channel(usize),

    #[error("invalid sound {0}, must be between 0 and {max}", max = crate::sounds::SOUND_COUNT - 1)]
    Sound(usize),
}

/// A logical sensor channel. Always within 0..CHANNEL_COUNT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
    /// Creates a channel from a raw index.
    pub fn new(index: usize) -> Result<Channel, InvalidArgument> {
        if index < CHANNEL_COUNT {
            Ok(Channel(index as u8))
        } else {
            Err(InvalidArgument::Channel(index))
        }
    }

    /// Returns the index of this channel.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Returns every channel in ascending order.
    pub fn all() -> impl Iterator<Item = Channel> {
        (0..CHANNEL_COUNT as u8).map(Channel)
    }

    /// Maps an ADC channel onto the sound mapping domain.
    ///
    /// The sensor wiring is mirrored relative to the sound mapping, so ADC channel 0 feeds
    /// sound channel 7 and so on.
    pub fn mirrored(self) -> Channel {
        Channel((CHANNEL_COUNT as u8 - 1) - self.0)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(7, Channel::new(7).unwrap().index());
        assert_eq!(Err(InvalidArgument::Channel(8)), Channel::new(8));
        assert_eq!(Err(InvalidArgument::Channel(usize::MAX)), Channel::new(usize::MAX));
    }

    #[test]
    fn test_mirrored() {
        let mirrored: Vec<usize> = Channel::all().map(|c| c.mirrored().index()).collect();
        assert_eq!(vec![7, 6, 5, 4, 3, 2, 1, 0], mirrored);
    }
}
