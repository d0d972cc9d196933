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

//! ADS1115 register map and the typed form of the config register.

/// Bit 15 of the config register. Starts a single conversion when written, reads back as
/// set once the device is idle.
const OS: u16 = 0x8000;
/// Selects AINx against GND. The local channel is added to this selector.
const MUX_SINGLE_ENDED: u16 = 0x4;
const MUX_SHIFT: u16 = 12;
/// Bit 8 of the config register.
const MODE_SINGLE_SHOT: u16 = 0x0100;
const DATA_RATE_SHIFT: u16 = 5;
/// Bits 1-0 of the config register.
const COMPARATOR_QUEUE_DISABLE: u16 = 0x0003;

/// The ready flag as seen in the first (high) byte of a config register read.
pub const READY_FLAG: u8 = (OS >> 8) as u8;

/// Registers that the sequencer talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// The signed 16-bit conversion result.
    Conversion,
    /// The 16-bit config register.
    Config,
}

impl Register {
    /// The register pointer value.
    pub fn id(self) -> u8 {
        match self {
            Register::Conversion => 0x00,
            Register::Config => 0x01,
        }
    }
}

/// Conversion rate in samples per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataRate {
    Sps8,
    Sps16,
    Sps32,
    Sps64,
    Sps128,
    Sps250,
    Sps475,
    #[default]
    Sps860,
}

impl DataRate {
    /// Gets the data rate for a samples per second figure.
    pub fn from_sps(sps: u16) -> Option<DataRate> {
        match sps {
            8 => Some(DataRate::Sps8),
            16 => Some(DataRate::Sps16),
            32 => Some(DataRate::Sps32),
            64 => Some(DataRate::Sps64),
            128 => Some(DataRate::Sps128),
            250 => Some(DataRate::Sps250),
            475 => Some(DataRate::Sps475),
            860 => Some(DataRate::Sps860),
            _ => None,
        }
    }

    /// The 3-bit field value.
    fn bits(self) -> u16 {
        match self {
            DataRate::Sps8 => 0b000,
            DataRate::Sps16 => 0b001,
            DataRate::Sps32 => 0b010,
            DataRate::Sps64 => 0b011,
            DataRate::Sps128 => 0b100,
            DataRate::Sps250 => 0b101,
            DataRate::Sps475 => 0b110,
            DataRate::Sps860 => 0b111,
        }
    }
}

/// Conversion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Continuous,
    SingleShot,
}

/// The contents of the config register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionConfig {
    /// Start a conversion when written.
    pub start: bool,
    /// The local input (0-3) measured against ground.
    pub input: u8,
    pub mode: Mode,
    pub data_rate: DataRate,
    /// Disables the comparator and puts ALERT/RDY in high impedance.
    pub comparator_disabled: bool,
}

impl ConversionConfig {
    /// A config that starts one single-ended conversion of the given local input.
    pub fn single_shot(input: u8, data_rate: DataRate) -> ConversionConfig {
        ConversionConfig {
            start: true,
            input,
            mode: Mode::SingleShot,
            data_rate,
            comparator_disabled: true,
        }
    }

    /// Packs the config into its register value.
    pub fn to_word(&self) -> u16 {
        let mut word = ((MUX_SINGLE_ENDED | u16::from(self.input & 0x3)) << MUX_SHIFT)
            | (self.data_rate.bits() << DATA_RATE_SHIFT);
        if self.start {
            word |= OS;
        }
        if self.mode == Mode::SingleShot {
            word |= MODE_SINGLE_SHOT;
        }
        if self.comparator_disabled {
            word |= COMPARATOR_QUEUE_DISABLE;
        }
        word
    }

    /// The register value as written on the wire, high byte first.
    pub fn to_bytes(&self) -> [u8; 2] {
        self.to_word().to_be_bytes()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_single_shot_words() {
        assert_eq!(
            0xC1E3,
            ConversionConfig::single_shot(0, DataRate::Sps860).to_word()
        );
        assert_eq!(
            0xD1E3,
            ConversionConfig::single_shot(1, DataRate::Sps860).to_word()
        );
        assert_eq!(
            0xF1E3,
            ConversionConfig::single_shot(3, DataRate::Sps860).to_word()
        );
        assert_eq!(
            0xC183,
            ConversionConfig::single_shot(0, DataRate::Sps128).to_word()
        );
    }

    #[test]
    fn test_to_bytes_high_byte_first() {
        assert_eq!(
            [0xE1, 0xE3],
            ConversionConfig::single_shot(2, DataRate::Sps860).to_bytes()
        );
    }

    #[test]
    fn test_ready_flag_is_top_bit() {
        assert_eq!(0x80, READY_FLAG);
    }

    #[test]
    fn test_data_rate_from_sps() {
        assert_eq!(Some(DataRate::Sps860), DataRate::from_sps(860));
        assert_eq!(Some(DataRate::Sps8), DataRate::from_sps(8));
        assert_eq!(None, DataRate::from_sps(100));
    }
}
