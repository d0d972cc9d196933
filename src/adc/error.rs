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

use super::Register;

/// Errors raised by a bus transaction.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to open bus {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("no device acknowledged address 0x{0:02x}")]
    NoAcknowledge(u8),

    #[error("no device selected")]
    NoDeviceSelected,

    #[error("bus transfer with 0x{address:02x} ({register:?}) failed: {reason}")]
    Transfer {
        address: u8,
        register: Register,
        reason: String,
    },
}

/// Errors raised while converting a single channel.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("timed out after {timeout:?} waiting for conversion of input {local} on 0x{address:02x}")]
    Timeout {
        address: u8,
        local: u8,
        timeout: Duration,
    },

    #[error("expected {expected} bytes from {register:?}, got {actual}")]
    ShortRead {
        register: Register,
        expected: usize,
        actual: usize,
    },
}
