//! The Source engine master-server query protocol: a single UDP
//! request/response pair per page, paged by re-seeding with the last
//! address received until the server returns the `0.0.0.0:0` sentinel.
//!
//! Wire shapes (all integers big-endian, strings are NUL-terminated):
//! request `0x31 <region:u8> <seed-address>\0 <filter>\0`; response
//! `0xFFFFFFFF 'f' '\n'` followed by a run of 6-byte entries (4-byte IPv4
//! + 2-byte port), the last of which is the `0.0.0.0:0` sentinel.

use std::net::Ipv4Addr;

use gsd_protocol::Address;

use crate::error::SyncError;

const RESPONSE_HEADER: [u8; 6] = [0xFF, 0xFF, 0xFF, 0xFF, b'f', b'\n'];

/// Geographic region filter, per the original protocol's single-byte
/// region codes. `All` is what `hl2master.steampowered.com` treats as
/// "every region."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Region {
    UsEastCoast = 0x00,
    UsWestCoast = 0x01,
    SouthAmerica = 0x02,
    Europe = 0x03,
    Asia = 0x04,
    Australia = 0x05,
    MiddleEast = 0x06,
    Africa = 0x07,
    All = 0xFF,
}

/// Build one page request. `seed` is `"0.0.0.0:0"` for the first page of
/// a region, or the last address received on the previous page
/// thereafter. `filter` is the raw Source filter string, e.g.
/// `\gamedir\tf`; an empty string matches every server.
pub fn build_request(region: Region, seed: &str, filter: &str) -> Vec<u8> {
    let mut request = Vec::with_capacity(3 + seed.len() + filter.len());
    request.push(0x31);
    request.push(region as u8);
    request.extend_from_slice(seed.as_bytes());
    request.push(0);
    request.extend_from_slice(filter.as_bytes());
    request.push(0);
    request
}

/// The outcome of parsing one response page.
pub struct Page {
    /// Addresses received, in order, excluding the sentinel.
    pub addresses: Vec<Address>,
    /// Whether the sentinel was seen, i.e. this region is exhausted.
    pub exhausted: bool,
}

/// Parse one response packet into a page of addresses.
pub fn parse_response(data: &[u8]) -> Result<Page, SyncError> {
    if data.len() < RESPONSE_HEADER.len() || data[..RESPONSE_HEADER.len()] != RESPONSE_HEADER {
        return Err(SyncError::MalformedResponse);
    }
    let body = &data[RESPONSE_HEADER.len()..];
    if body.len() % 6 != 0 {
        return Err(SyncError::MalformedResponse);
    }

    let mut addresses = Vec::with_capacity(body.len() / 6);
    let mut exhausted = false;
    for entry in body.chunks_exact(6) {
        let ip = Ipv4Addr::new(entry[0], entry[1], entry[2], entry[3]);
        let port = u16::from_be_bytes([entry[4], entry[5]]);
        if ip.is_unspecified() && port == 0 {
            exhausted = true;
            break;
        }
        match Address::new(ip, port) {
            Ok(addr) => addresses.push(addr),
            Err(_) => return Err(SyncError::MalformedResponse),
        }
    }

    Ok(Page {
        addresses,
        exhausted,
    })
}

/// The seed string for the first page of a region.
pub const FIRST_SEED: &str = "0.0.0.0:0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_frames_region_seed_and_filter() {
        let request = build_request(Region::Europe, "0.0.0.0:0", "\\gamedir\\tf");
        assert_eq!(request[0], 0x31);
        assert_eq!(request[1], Region::Europe as u8);
        assert!(request.ends_with(b"\\gamedir\\tf\0"));
    }

    #[test]
    fn response_without_the_magic_header_is_malformed() {
        assert!(parse_response(&[1, 2, 3]).is_err());
    }

    #[test]
    fn trailing_sentinel_marks_region_exhausted() {
        let mut packet = RESPONSE_HEADER.to_vec();
        packet.extend_from_slice(&[192, 0, 2, 1, 0x69, 0x87]); // 192.0.2.1:27015
        packet.extend_from_slice(&[0, 0, 0, 0, 0, 0]); // sentinel
        let page = parse_response(&packet).unwrap();
        assert!(page.exhausted);
        assert_eq!(page.addresses.len(), 1);
        assert_eq!(page.addresses[0].port(), 27015);
    }

    #[test]
    fn page_with_no_sentinel_is_not_exhausted() {
        let mut packet = RESPONSE_HEADER.to_vec();
        packet.extend_from_slice(&[192, 0, 2, 1, 0x69, 0x87]);
        let page = parse_response(&packet).unwrap();
        assert!(!page.exhausted);
        assert_eq!(page.addresses.len(), 1);
    }

    #[test]
    fn truncated_entry_is_malformed() {
        let mut packet = RESPONSE_HEADER.to_vec();
        packet.extend_from_slice(&[192, 0, 2, 1]);
        assert!(parse_response(&packet).is_err());
    }
}
