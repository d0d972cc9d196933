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

use crate::channel::{Channel, CHANNEL_COUNT};

/// Raw ADC value that a pad has to exceed to count as hit.
pub const THRESHOLD: i16 = 500;

/// The kind of edge seen on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The pad went above the threshold.
    Trigger,
    /// The pad fell back to or below the threshold.
    Release,
}

impl EventKind {
    /// The OSC payload for this event.
    pub fn payload(self) -> f32 {
        match self {
            EventKind::Trigger => 1.0,
            EventKind::Release => 0.0,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Trigger => f.write_str("trigger"),
            EventKind::Release => f.write_str("release"),
        }
    }
}

/// An edge on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub channel: Channel,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelState {
    pub previous_sample: i16,
    pub triggered: bool,
}

/// Detects threshold crossings per channel. There is no debounce: a single sample on
/// either side of the threshold is enough.
#[derive(Debug, Default)]
pub struct Detector {
    states: [ChannelState; CHANNEL_COUNT],
}

impl Detector {
    /// Creates a detector with every channel idle at 0.
    pub fn new() -> Detector {
        Detector::default()
    }

    /// Feeds a new sample for the channel and returns the edge it produced, if any.
    pub fn update(&mut self, channel: Channel, sample: i16) -> Option<TriggerEvent> {
        let state = &mut self.states[channel.index()];
        let previous = state.previous_sample;

        let kind = if !state.triggered && sample > THRESHOLD && previous <= THRESHOLD {
            state.triggered = true;
            Some(EventKind::Trigger)
        } else if state.triggered && sample <= THRESHOLD && previous > THRESHOLD {
            state.triggered = false;
            Some(EventKind::Release)
        } else {
            None
        };

        state.previous_sample = sample;
        kind.map(|kind| TriggerEvent { channel, kind })
    }

    /// The current state of a channel.
    pub fn state(&self, channel: Channel) -> ChannelState {
        self.states[channel.index()]
    }
}
