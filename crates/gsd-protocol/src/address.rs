//! Server addresses: an IPv4 host plus a UDP port.
//!
//! Mirrors `serverstf.cache.Address` from the original implementation:
//! structural equality, a canonical `<ip>:<port>` string form, and a parser
//! that is the exact inverse of that string form.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::str::FromStr;

use thiserror::Error;

/// Errors constructing or parsing an [`Address`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("malformed IP address: {0}")]
    MalformedIp(String),
    #[error("addresses must be in the form <ip>:<port>, got {0:?}")]
    MalformedAddress(String),
    #[error("port number is out of range: {0}")]
    PortOutOfRange(u32),
    #[error("port number is not an integer: {0}")]
    InvalidPort(String),
}

/// The identity of a game server: an IPv4 address plus a UDP port.
///
/// Equality is structural. `Display`/`FromStr` round-trip through the
/// canonical `<dotted-ip>:<port>` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    ip: Ipv4Addr,
    port: u16,
}

impl Address {
    /// Construct an address, rejecting port 0.
    pub fn new(ip: Ipv4Addr, port: u16) -> Result<Self, AddressError> {
        if port == 0 {
            return Err(AddressError::PortOutOfRange(0));
        }
        Ok(Self { ip, port })
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.ip, self.port)
    }

    /// Parse the canonical `<ip>:<port>` form. The inverse of [`Display`].
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let mut split = address.splitn(2, ':');
        let ip_part = split
            .next()
            .ok_or_else(|| AddressError::MalformedAddress(address.to_owned()))?;
        let port_part = split
            .next()
            .ok_or_else(|| AddressError::MalformedAddress(address.to_owned()))?;

        let ip = Ipv4Addr::from_str(ip_part)
            .map_err(|_| AddressError::MalformedIp(ip_part.to_owned()))?;
        let port: u32 = port_part
            .parse()
            .map_err(|_| AddressError::InvalidPort(port_part.to_owned()))?;
        if port < 1 || port > 65535 {
            return Err(AddressError::PortOutOfRange(port));
        }
        Self::new(ip, port as u16)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_then_parse_round_trips() {
        let addr = Address::new(Ipv4Addr::new(192, 0, 2, 1), 27015).unwrap();
        let s = addr.to_string();
        assert_eq!(s, "192.0.2.1:27015");
        assert_eq!(Address::parse(&s).unwrap(), addr);
    }

    #[test]
    fn port_zero_is_rejected() {
        assert_eq!(
            Address::new(Ipv4Addr::new(0, 0, 0, 0), 0),
            Err(AddressError::PortOutOfRange(0))
        );
        assert!(Address::parse("0.0.0.0:0").is_err());
    }

    #[test]
    fn port_65536_is_rejected() {
        assert!(Address::parse("0.0.0.0:65536").is_err());
    }

    #[test]
    fn malformed_ip_is_rejected() {
        assert!(matches!(
            Address::parse("not-an-ip:1234"),
            Err(AddressError::MalformedIp(_))
        ));
    }

    #[test]
    fn missing_port_is_rejected() {
        assert!(matches!(
            Address::parse("192.0.2.1"),
            Err(AddressError::MalformedAddress(_))
        ));
    }

    #[test]
    fn equality_is_structural() {
        let a = Address::new(Ipv4Addr::new(10, 0, 0, 1), 80).unwrap();
        let b = Address::new(Ipv4Addr::new(10, 0, 0, 1), 80).unwrap();
        let c = Address::new(Ipv4Addr::new(10, 0, 0, 2), 80).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
