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

use crate::channel::Channel;

use super::error::ConfigError;

pub const DEFAULT_IDLE_BUDGET: Duration = Duration::from_millis(30);

/// The panel configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Panel {
    /// The idle budget the panel reports every tick.
    idle_budget: Option<String>,

    /// The channel wired to the volume potentiometer, if any.
    volume_channel: Option<usize>,
}

impl Panel {
    /// Returns the idle budget (default: 30ms).
    pub fn idle_budget(&self) -> Result<Duration, ConfigError> {
        match &self.idle_budget {
            Some(idle_budget) => Ok(DurationString::from_string(idle_budget.clone())?.into()),
            None => Ok(DEFAULT_IDLE_BUDGET),
        }
    }

    /// Returns the volume channel. The channel no longer acts as a pad when set.
    pub fn volume_channel(&self) -> Result<Option<Channel>, ConfigError> {
        self.volume_channel
            .map(Channel::new)
            .transpose()
            .map_err(|e| ConfigError::Invalid(format!("volume channel: {}", e)))
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.idle_budget()?;
        self.volume_channel()?;
        Ok(())
    }
}
