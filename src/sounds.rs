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
use std::{fmt, str::FromStr};

use serde::Deserialize;
use tracing::info;

use crate::channel::{Channel, InvalidArgument, CHANNEL_COUNT};

/// The number of sounds the synthesizer exposes.
pub const SOUND_COUNT: usize = 8;

/// A sound the synthesizer can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Sound {
    Kick,
    Snare,
    Hihat,
    OpenHihat,
    BassTom,
    MedTom,
    HighTom,
    Crash,
}

impl Sound {
    /// All sounds, ordered by index.
    pub const ALL: [Sound; SOUND_COUNT] = [
        Sound::Kick,
        Sound::Snare,
        Sound::Hihat,
        Sound::OpenHihat,
        Sound::BassTom,
        Sound::MedTom,
        Sound::HighTom,
        Sound::Crash,
    ];

    /// Gets the sound at the given index.
    pub fn from_index(index: usize) -> Result<Sound, InvalidArgument> {
        Sound::ALL
            .get(index)
            .copied()
            .ok_or(InvalidArgument::Sound(index))
    }

    /// Returns the index of this sound.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The name used in OSC addresses and on screen.
    pub fn display_name(self) -> &'static str {
        match self {
            Sound::Kick => "Kick",
            Sound::Snare => "Snare",
            Sound::Hihat => "Hihat",
            Sound::OpenHihat => "OpenHihat",
            Sound::BassTom => "BassTom",
            Sound::MedTom => "MedTom",
            Sound::HighTom => "HighTom",
            Sound::Crash => "Crash",
        }
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Sound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sound::ALL
            .iter()
            .find(|sound| sound.display_name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown sound {}", s))
    }
}

/// The mapping from logical channels to sounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundMap {
    mapping: [Sound; CHANNEL_COUNT],
}

impl SoundMap {
    /// Creates a sound map from a list of sounds, one per channel starting at channel 0.
    /// Channels not covered by the list keep their default sound.
    pub fn new(sounds: &[Sound]) -> Result<SoundMap, InvalidArgument> {
        if sounds.len() > CHANNEL_COUNT {
            return Err(InvalidArgument::Channel(sounds.len() - 1));
        }

        let mut map = SoundMap::default();
        map.mapping[..sounds.len()].copy_from_slice(sounds);
        Ok(map)
    }

    /// Gets the sound mapped to the given channel.
    pub fn get(&self, channel: Channel) -> Sound {
        self.mapping[channel.index()]
    }

    /// Maps the channel to the sound. Both are raw indices as they arrive from the UI.
    pub fn set(&mut self, channel: usize, sound: usize) -> Result<(), InvalidArgument> {
        let channel = Channel::new(channel)?;
        let sound = Sound::from_index(sound)?;

        self.mapping[channel.index()] = sound;
        info!(channel = channel.index(), sound = %sound, "Channel mapped.");
        Ok(())
    }
}

impl Default for SoundMap {
    /// Channel n plays sound n.
    fn default() -> Self {
        SoundMap {
            mapping: Sound::ALL,
        }
    }
}

impl fmt::Display for SoundMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .mapping
            .iter()
            .enumerate()
            .map(|(channel, sound)| format!("{}={}", channel, sound))
            .collect();
        write!(f, "{}", pairs.join(","))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn channel(index: usize) -> Channel {
        Channel::new(index).expect("valid channel")
    }

    #[test]
    fn test_default_mapping() {
        let map = SoundMap::default();
        assert_eq!(Sound::Kick, map.get(channel(0)));
        assert_eq!(Sound::OpenHihat, map.get(channel(3)));
        assert_eq!(Sound::Crash, map.get(channel(7)));
    }

    #[test]
    fn test_set() {
        let mut map = SoundMap::default();
        assert!(map.set(0, Sound::HighTom.index()).is_ok());
        assert_eq!(Sound::HighTom, map.get(channel(0)));
    }

    #[test]
    fn test_set_rejects_without_mutating() {
        let mut map = SoundMap::default();
        assert_eq!(Err(InvalidArgument::Channel(8)), map.set(8, 0));
        assert_eq!(Err(InvalidArgument::Sound(8)), map.set(2, 8));
        assert_eq!(SoundMap::default(), map);
    }

    #[test]
    fn test_new_partial() {
        let map = SoundMap::new(&[Sound::Crash, Sound::Crash]).expect("valid sounds");
        assert_eq!(Sound::Crash, map.get(channel(0)));
        assert_eq!(Sound::Crash, map.get(channel(1)));
        assert_eq!(Sound::Hihat, map.get(channel(2)));

        assert!(SoundMap::new(&[Sound::Kick; 9]).is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Ok(Sound::OpenHihat), "openhihat".parse::<Sound>());
        assert_eq!(Ok(Sound::Kick), "Kick".parse::<Sound>());
        assert!("cowbell".parse::<Sound>().is_err());
    }
}
