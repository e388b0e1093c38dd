//! The observed state of one server.

use std::collections::BTreeSet;

use crate::address::Address;
use crate::players::Players;

/// Immutable observed state of one server.
///
/// A `None` field means "unknown since last observation" — the cache never
/// fails to produce a `Status` for an address, it just returns one with
/// nulls where data hasn't been observed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub address: Address,
    pub interest: u64,
    pub name: Option<String>,
    pub map: Option<String>,
    pub application_id: Option<i64>,
    pub players: Players,
    pub tags: BTreeSet<String>,
}

impl Status {
    /// A status with all-null fields, as returned by `get` for an address
    /// the cache has never observed.
    pub fn unknown(address: Address) -> Self {
        Self {
            address,
            interest: 0,
            name: None,
            map: None,
            application_id: None,
            players: Players::empty(),
            tags: BTreeSet::new(),
        }
    }
}

/// GeoIP location attached to a `Status` at serialization time.
///
/// Conclusive only when all three fields are present; this crate never
/// produces a populated `GeoLocation` itself (GeoIP lookup is out of
/// scope) but the wire format still carries the field so a collaborator
/// can be slotted in later without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoLocation {
    pub country: Option<&'static str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoLocation {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_conclusive(&self) -> bool {
        self.country.is_some() && self.latitude.is_some() && self.longitude.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn unknown_status_has_all_null_fields() {
        let addr = Address::new(Ipv4Addr::new(127, 0, 0, 1), 27015).unwrap();
        let status = Status::unknown(addr);
        assert_eq!(status.interest, 0);
        assert!(status.name.is_none());
        assert!(status.map.is_none());
        assert!(status.application_id.is_none());
        assert_eq!(status.players, Players::empty());
        assert!(status.tags.is_empty());
    }

    #[test]
    fn geo_location_is_conclusive_only_when_complete() {
        assert!(!GeoLocation::unknown().is_conclusive());
        let partial = GeoLocation {
            country: Some("CA"),
            latitude: Some(45.0),
            longitude: None,
        };
        assert!(!partial.is_conclusive());
        let full = GeoLocation {
            country: Some("CA"),
            latitude: Some(45.0),
            longitude: Some(-75.0),
        };
        assert!(full.is_conclusive());
    }
}
