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
use std::{fmt, io};

use rosc::{OscMessage, OscPacket, OscType};
use tracing::debug;

use crate::{
    channel::Channel,
    sounds::{Sound, SoundMap},
    trigger::EventKind,
};

pub mod mock;
pub mod udp;

/// Errors raised while sending an event.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("error encoding OSC message: {0}")]
    Encode(String),

    #[error("error sending OSC message: {0}")]
    Send(#[from] io::Error),
}

/// Somewhere to send OSC packets to.
pub trait Transport: fmt::Display + Send {
    /// Sends the packet without waiting for any acknowledgement.
    fn send(&mut self, packet: &OscPacket) -> Result<(), DispatchError>;
}

/// Turns channel events into OSC messages for the synthesizer.
pub struct Dispatcher {
    transport: Box<dyn Transport>,
    namespace: String,
}

impl Dispatcher {
    /// Creates a dispatcher that sends messages under /<namespace>/.
    pub fn new(transport: Box<dyn Transport>, namespace: &str) -> Dispatcher {
        Dispatcher {
            transport,
            namespace: namespace.trim_matches('/').to_string(),
        }
    }

    /// The OSC address of the given sound.
    pub fn address(&self, sound: Sound) -> String {
        format!("/{}/{}", self.namespace, sound.display_name())
    }

    /// Sends the event for the sound currently mapped to the channel.
    pub fn dispatch(
        &mut self,
        sounds: &SoundMap,
        channel: Channel,
        kind: EventKind,
    ) -> Result<(), DispatchError> {
        let sound = sounds.get(channel);
        let packet = OscPacket::Message(OscMessage {
            addr: self.address(sound),
            args: vec![OscType::Float(kind.payload())],
        });

        debug!(
            channel = channel.index(),
            sound = %sound,
            event = %kind,
            "Dispatching event."
        );
        self.transport.send(&packet)
    }
}

impl fmt::Display for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{} -> {}", self.namespace, self.transport)
    }
}
