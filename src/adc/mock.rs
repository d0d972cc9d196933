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
use std::{
    collections::{HashSet, VecDeque},
    fmt,
    sync::Arc,
};

use parking_lot::Mutex;

use crate::channel::CHANNEL_COUNT;

use super::{address::CHANNELS_PER_DEVICE, BusError, Register};

const OS: u16 = 0x8000;

/// A bus transaction, as recorded by the mock bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Select(u8),
    Write {
        address: u8,
        register: Register,
        bytes: Vec<u8>,
    },
    Read {
        address: u8,
        register: Register,
    },
}

/// The sample script for one channel. The last value repeats once the queue runs dry.
#[derive(Default)]
struct Script {
    queue: VecDeque<i16>,
    last: i16,
    stuck: bool,
}

impl Script {
    fn next(&mut self) -> i16 {
        if let Some(value) = self.queue.pop_front() {
            self.last = value;
        }
        self.last
    }
}

/// A single ADC on the mock bus.
#[derive(Default, Clone, Copy)]
struct Device {
    config: u16,
    /// The logical channel currently being converted.
    converting: Option<usize>,
    busy_polls: u32,
}

struct State {
    base: u8,
    selected: Option<u8>,
    devices: [Device; CHANNEL_COUNT / CHANNELS_PER_DEVICE],
    scripts: [Script; CHANNEL_COUNT],
    absent: HashSet<u8>,
    busy_polls: u32,
    transactions: Vec<Transaction>,
}

impl State {
    fn device_index(&self, address: u8) -> Option<usize> {
        let index = usize::from(address.checked_sub(self.base)?);
        (index < self.devices.len()).then_some(index)
    }

    fn selected_device(&self) -> Result<(u8, usize), BusError> {
        let address = self.selected.ok_or(BusError::NoDeviceSelected)?;
        if self.absent.contains(&address) {
            return Err(BusError::NoAcknowledge(address));
        }
        let index = self
            .device_index(address)
            .ok_or(BusError::NoAcknowledge(address))?;
        Ok((address, index))
    }
}

/// A simulated pair of ADS1115 ADCs. Clones share the same state, so a test can keep a
/// handle to script samples and inspect transactions while the sequencer owns the bus.
#[derive(Clone)]
pub struct Bus {
    name: String,
    state: Arc<Mutex<State>>,
}

impl Bus {
    /// Creates a mock bus with ADCs at base and base + 1. Every channel reads 0 until
    /// scripted otherwise.
    pub fn new(name: &str, base: u8) -> Bus {
        Bus {
            name: name.to_string(),
            state: Arc::new(Mutex::new(State {
                base,
                selected: None,
                devices: Default::default(),
                scripts: Default::default(),
                absent: HashSet::new(),
                busy_polls: 0,
                transactions: Vec::new(),
            })),
        }
    }

    /// Queues the given values for the channel. The last value is held once they run out.
    pub fn set_samples(&self, channel: usize, values: &[i16]) {
        let mut state = self.state.lock();
        state.scripts[channel].queue.extend(values.iter().copied());
    }

    /// A stuck channel never finishes converting.
    pub fn set_stuck(&self, channel: usize, stuck: bool) {
        self.state.lock().scripts[channel].stuck = stuck;
    }

    /// An absent device never acknowledges its address.
    pub fn set_absent(&self, address: u8, absent: bool) {
        let mut state = self.state.lock();
        if absent {
            state.absent.insert(address);
        } else {
            state.absent.remove(&address);
        }
    }

    /// Sets how many status polls report busy before a conversion completes.
    pub fn set_busy_polls(&self, busy_polls: u32) {
        self.state.lock().busy_polls = busy_polls;
    }

    /// Returns every transaction since the last clear.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().transactions.clone()
    }

    /// Forgets all recorded transactions.
    pub fn clear_transactions(&self) {
        self.state.lock().transactions.clear();
    }
}

impl super::Bus for Bus {
    fn select_device(&mut self, address: u8) -> Result<(), BusError> {
        let mut state = self.state.lock();
        state.transactions.push(Transaction::Select(address));
        if state.absent.contains(&address) || state.device_index(address).is_none() {
            state.selected = None;
            return Err(BusError::NoAcknowledge(address));
        }
        state.selected = Some(address);
        Ok(())
    }

    fn write_register(&mut self, register: Register, bytes: &[u8]) -> Result<(), BusError> {
        let mut state = self.state.lock();
        let (address, index) = state.selected_device()?;
        state.transactions.push(Transaction::Write {
            address,
            register,
            bytes: bytes.to_vec(),
        });

        if let (Register::Config, [high, low]) = (register, bytes) {
            let word = u16::from_be_bytes([*high, *low]);
            let busy_polls = state.busy_polls;
            let device = &mut state.devices[index];
            device.config = word & !OS;
            if word & OS != 0 {
                let local = usize::from((word >> 12) & 0x3);
                device.converting = Some(index * CHANNELS_PER_DEVICE + local);
                device.busy_polls = busy_polls;
            }
        }
        Ok(())
    }

    fn read_register(&mut self, register: Register, length: usize) -> Result<Vec<u8>, BusError> {
        let mut state = self.state.lock();
        let (address, index) = state.selected_device()?;
        state.transactions.push(Transaction::Read { address, register });

        let word = match register {
            Register::Config => {
                let device = state.devices[index];
                let busy = match device.converting {
                    Some(channel) if state.scripts[channel].stuck => true,
                    Some(_) if device.busy_polls > 0 => {
                        state.devices[index].busy_polls -= 1;
                        true
                    }
                    _ => false,
                };
                if busy {
                    device.config
                } else {
                    device.config | OS
                }
            }
            Register::Conversion => match state.devices[index].converting {
                Some(channel) => state.scripts[channel].next() as u16,
                None => 0,
            },
        };

        let mut bytes = word.to_be_bytes().to_vec();
        bytes.resize(length, 0);
        Ok(bytes)
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
