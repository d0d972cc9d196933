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
    fmt, io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
};

use rosc::OscPacket;
use tracing::info;

use super::DispatchError;

/// Sends OSC packets over UDP.
pub struct Transport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl Transport {
    /// Resolves host:port and binds a local socket to send from.
    pub fn connect(host: &str, port: u16) -> Result<Transport, io::Error> {
        let target = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}:{} did not resolve to an address", host, port),
            )
        })?;
        let bind_addr: SocketAddr = match target {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(bind_addr)?;
        // Sending must never hold up the control loop.
        socket.set_nonblocking(true)?;
        info!(endpoint = %target, "OSC endpoint ready.");

        Ok(Transport { socket, target })
    }

    /// The address packets are sent to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl super::Transport for Transport {
    fn send(&mut self, packet: &OscPacket) -> Result<(), DispatchError> {
        let buf =
            rosc::encoder::encode(packet).map_err(|e| DispatchError::Encode(e.to_string()))?;
        self.socket.send_to(&buf, self.target)?;
        Ok(())
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "udp://{}", self.target)
    }
}
