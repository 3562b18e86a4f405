//! Wake-on-LAN.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::info;

use crate::{Error, Result};

/// Fire-and-forget wake signal for the recorder host.
#[async_trait]
pub trait WakeSender: Send + Sync + 'static {
    async fn wake(&self) -> Result<()>;
}

/// Hardware address, parsed from `aa:bb:cc:dd:ee:ff`, `aa-bb-...` or 12 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// 6 bytes of `0xFF` followed by the address 16 times.
    pub fn magic_packet(&self) -> [u8; 102] {
        let mut packet = [0xFF; 102];
        for chunk in packet[6..].chunks_exact_mut(6) {
            chunk.copy_from_slice(&self.0);
        }
        packet
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex: String = s.chars().filter(|c| !matches!(c, ':' | '-')).collect();
        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::config(format!("invalid MAC address: {s}")));
        }

        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            *octet = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| Error::config(format!("invalid MAC address: {s}")))?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Sends the magic packet over UDP broadcast.
#[derive(Debug, Clone)]
pub struct MagicPacketSender {
    mac: MacAddress,
    destination: SocketAddr,
}

impl MagicPacketSender {
    pub fn new(mac: MacAddress) -> Self {
        Self {
            mac,
            destination: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::BROADCAST, 9)),
        }
    }

    pub fn with_destination(mut self, destination: SocketAddr) -> Self {
        self.destination = destination;
        self
    }
}

#[async_trait]
impl WakeSender for MagicPacketSender {
    async fn wake(&self) -> Result<()> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_broadcast(true)?;
        socket
            .send_to(&self.mac.magic_packet(), self.destination)
            .await?;
        info!("Sent wake-on-LAN packet to {} via {}", self.mac, self.destination);
        Ok(())
    }
}
