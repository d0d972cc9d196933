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
use std::path::Path;

use config::{Config, File};
use serde::Deserialize;

use crate::sounds::{Sound, SoundMap};

mod adc;
pub mod error;
mod endpoint;
mod panel;

pub use self::adc::Adc;
pub use self::endpoint::Endpoint;
pub use self::error::ConfigError;
pub use self::panel::Panel;

/// Where manual input comes from.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Input {
    /// Line commands on stdin.
    Keyboard,

    #[default]
    #[serde(rename = "none")]
    Disabled,
}

/// The configuration for the whole kit.
#[derive(Deserialize, Clone, Debug)]
pub struct Kit {
    adc: Adc,
    endpoint: Option<Endpoint>,
    panel: Option<Panel>,
    input: Option<Input>,
    /// The sounds of channels 0 onwards at startup.
    sounds: Option<Vec<Sound>>,
}

impl Kit {
    /// Creates a kit configuration for the given ADC with everything else defaulted.
    pub fn new(adc: Adc) -> Kit {
        Kit {
            adc,
            endpoint: None,
            panel: None,
            input: None,
            sounds: None,
        }
    }

    /// Parse and validate a kit from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Kit, ConfigError> {
        let kit = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Kit>()?;
        kit.validate()?;
        Ok(kit)
    }

    pub fn adc(&self) -> &Adc {
        &self.adc
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint.clone().unwrap_or_default()
    }

    pub fn panel(&self) -> Panel {
        self.panel.clone().unwrap_or_default()
    }

    pub fn input(&self) -> Input {
        self.input.unwrap_or_default()
    }

    /// The channel to sound mapping the kit starts with. Channels past the end of the
    /// configured list keep their default sound.
    pub fn sound_map(&self) -> Result<SoundMap, ConfigError> {
        match &self.sounds {
            Some(sounds) => SoundMap::new(sounds)
                .map_err(|e| ConfigError::Invalid(format!("sounds: {}", e))),
            None => Ok(SoundMap::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.adc.validate()?;
        self.panel().validate()?;
        self.sound_map()?;
        Ok(())
    }
}
