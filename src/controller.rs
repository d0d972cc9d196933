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
use std::{io, sync::Arc};

use tokio::{sync::mpsc::Sender, task::JoinHandle};

use crate::config;

pub mod keyboard;

/// Input events that the control loop acts on. Channels and sounds are raw indices and are
/// validated by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Sends a trigger for the channel as if its pad was hit.
    Trigger(usize),

    /// Sends a release for the channel.
    Release(usize),

    /// Maps the channel to a different sound.
    Remap { channel: usize, sound: usize },

    /// Highlights the channel's panel.
    Select(usize),
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Creates the input driver from the config, if input is enabled.
pub fn driver(config: &config::Input) -> Option<Arc<dyn Driver>> {
    match config {
        config::Input::Keyboard => Some(Arc::new(keyboard::Driver::new())),
        config::Input::Disabled => None,
    }
}
