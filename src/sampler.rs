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
use tracing::warn;

use crate::{
    adc::{address::CHANNELS_PER_DEVICE, Sequencer},
    channel::{Channel, CHANNEL_COUNT},
};

/// The samples captured during one tick. Channels whose conversion failed are unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Samples([Option<i16>; CHANNEL_COUNT]);

impl Samples {
    /// Gets the sample for the channel, if it was captured.
    pub fn get(&self, channel: Channel) -> Option<i16> {
        self.0[channel.index()]
    }

    /// Records a sample for the channel.
    pub fn set(&mut self, channel: Channel, value: i16) {
        self.0[channel.index()] = Some(value);
    }

    /// The number of channels that produced a sample.
    pub fn available(&self) -> usize {
        self.0.iter().filter(|sample| sample.is_some()).count()
    }
}

/// Channel i on the first ADC followed by channel i on the second ADC, so the two devices
/// take turns.
pub fn interleaved() -> Vec<Channel> {
    (0..CHANNELS_PER_DEVICE)
        .flat_map(|i| [i, i + CHANNELS_PER_DEVICE])
        .filter_map(|index| Channel::new(index).ok())
        .collect()
}

/// Samples every channel once per tick.
pub struct Sampler {
    sequencer: Sequencer,
}

impl Sampler {
    /// Creates a sampler on top of the given sequencer.
    pub fn new(sequencer: Sequencer) -> Sampler {
        Sampler { sequencer }
    }

    /// Converts the channels in the given order. A failed channel is logged and left
    /// unavailable without affecting the rest of the tick.
    pub fn sample_all(&mut self, order: &[Channel]) -> Samples {
        let mut samples = Samples::default();
        for &channel in order {
            match self.sequencer.convert(channel) {
                Ok(value) => samples.set(channel, value),
                Err(e) => warn!(
                    channel = channel.index(),
                    err = %e,
                    "Conversion failed, channel unavailable this tick."
                ),
            }
        }
        samples
    }

    /// The underlying sequencer.
    pub fn sequencer(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }
}
