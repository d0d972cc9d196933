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
use std::{fmt, io, sync::Arc};

use parking_lot::Mutex;
use rosc::{OscMessage, OscPacket};

use super::DispatchError;

/// A transport that records messages instead of sending them.
#[derive(Clone, Default)]
pub struct Transport {
    sent: Arc<Mutex<Vec<OscMessage>>>,
    failing: Arc<Mutex<bool>>,
}

impl Transport {
    pub fn new() -> Transport {
        Transport::default()
    }

    /// Makes every send fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    /// Returns every message sent so far, bundles flattened.
    pub fn messages(&self) -> Vec<OscMessage> {
        self.sent.lock().clone()
    }

    /// Forgets all recorded messages.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    fn record(sent: &mut Vec<OscMessage>, packet: &OscPacket) {
        match packet {
            OscPacket::Message(message) => sent.push(message.clone()),
            OscPacket::Bundle(bundle) => {
                for packet in &bundle.content {
                    Self::record(sent, packet);
                }
            }
        }
    }
}

impl super::Transport for Transport {
    fn send(&mut self, packet: &OscPacket) -> Result<(), DispatchError> {
        if *self.failing.lock() {
            return Err(DispatchError::Send(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "mock transport failure",
            )));
        }

        Self::record(&mut self.sent.lock(), packet);
        Ok(())
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mock")
    }
}
