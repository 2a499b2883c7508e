// netsim: a deterministic discrete-event simulator for packet-level IP forwarding
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! IPv4 addresses and prefixes: parsing, masking and containment.

use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

/// A 32-bit IPv4 address, stored big-endian as a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IpAddress(u32);

impl IpAddress {
    pub fn from_octets(a: u8, b: u8, c: u8, d: u8) -> Self {
        IpAddress(u32::from_be_bytes([a, b, c, d]))
    }

    pub fn from_int(v: u32) -> Self {
        IpAddress(v)
    }

    pub fn to_int(self) -> u32 {
        self.0
    }

    pub fn octets(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl FromStr for IpAddress {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 4 {
            return Err(SimError::InvalidArgument(format!(
                "'{s}' is not a dotted-quad IPv4 address"
            )));
        }
        let mut octets = [0u8; 4];
        for (i, part) in parts.iter().enumerate() {
            octets[i] = part.parse::<u16>().ok().filter(|v| *v <= 255).ok_or_else(|| {
                SimError::InvalidArgument(format!("'{part}' is not a valid octet in '{s}'"))
            })? as u8;
        }
        Ok(IpAddress::from_octets(octets[0], octets[1], octets[2], octets[3]))
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets();
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

/// An IPv4 network prefix: a network address already masked to `prefix_len` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpPrefix {
    network: IpAddress,
    prefix_len: u8,
}

impl IpPrefix {
    pub fn new(network: IpAddress, prefix_len: u8) -> Result<Self, SimError> {
        if prefix_len > 32 {
            return Err(SimError::InvalidArgument(format!(
                "prefix length {prefix_len} exceeds 32"
            )));
        }
        let mask = Self::mask_for(prefix_len);
        Ok(IpPrefix {
            network: IpAddress::from_int(network.to_int() & mask),
            prefix_len,
        })
    }

    fn mask_for(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            0xFFFF_FFFFu32 << (32 - prefix_len)
        }
    }

    pub fn prefix_len(self) -> u8 {
        self.prefix_len
    }

    pub fn network(self) -> IpAddress {
        self.network
    }

    pub fn contains(self, ip: IpAddress) -> bool {
        let mask = Self::mask_for(self.prefix_len);
        (ip.to_int() & mask) == (self.network.to_int() & mask)
    }
}

impl FromStr for IpPrefix {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s.split_once('/').ok_or_else(|| {
            SimError::InvalidArgument(format!("'{s}' is not a A.B.C.D/N prefix"))
        })?;
        let network: IpAddress = addr.parse()?;
        let prefix_len: u8 = len
            .parse()
            .map_err(|_| SimError::InvalidArgument(format!("'{len}' is not a valid prefix length")))?;
        IpPrefix::new(network, prefix_len)
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_quad() {
        let ip: IpAddress = "10.1.2.3".parse().unwrap();
        assert_eq!(ip.octets(), [10, 1, 2, 3]);
    }

    #[test]
    fn rejects_out_of_range_octet() {
        assert!("10.1.2.300".parse::<IpAddress>().is_err());
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!("10.1.2".parse::<IpAddress>().is_err());
    }

    #[test]
    fn int_round_trip() {
        let ip = IpAddress::from_octets(192, 168, 1, 1);
        assert_eq!(IpAddress::from_int(ip.to_int()), ip);
    }

    #[test]
    fn prefix_round_trip() {
        let p: IpPrefix = "10.1.2.0/24".parse().unwrap();
        assert_eq!(p.to_string().parse::<IpPrefix>().unwrap(), p);
    }

    #[test]
    fn prefix_contains() {
        let p: IpPrefix = "10.1.2.0/24".parse().unwrap();
        assert!(p.contains("10.1.2.5".parse().unwrap()));
        assert!(!p.contains("10.1.3.5".parse().unwrap()));
    }

    #[test]
    fn prefix_zero_length_contains_everything() {
        let p: IpPrefix = "0.0.0.0/0".parse().unwrap();
        assert!(p.contains("255.255.255.255".parse().unwrap()));
    }

    #[test]
    fn prefix_normalizes_network_to_mask() {
        let p: IpPrefix = "10.1.2.123/24".parse().unwrap();
        assert_eq!(p.network(), "10.1.2.0".parse::<IpAddress>().unwrap());
    }
}
