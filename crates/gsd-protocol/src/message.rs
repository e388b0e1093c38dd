//! The WebSocket wire envelope.
//!
//! Every message, in either direction, is a UTF-8 JSON object with a `type`
//! and an `entity` whose shape depends on `type`. We model this as a Rust
//! enum with `#[serde(tag = "type", content = "entity")]` rather than a
//! flat struct, so malformed/unknown `type` values fall out of
//! deserialization instead of being hand-checked.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::players::Players;
use crate::status::Status;

/// `{ip: string, port: integer}`, used by `subscribe` and `unsubscribe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressEntity {
    pub ip: String,
    pub port: u32,
}

impl AddressEntity {
    pub fn to_address(&self) -> Result<Address, crate::address::AddressError> {
        use std::net::Ipv4Addr;
        use std::str::FromStr;

        let ip = Ipv4Addr::from_str(&self.ip)
            .map_err(|_| crate::address::AddressError::MalformedIp(self.ip.clone()))?;
        if self.port < 1 || self.port > 65535 {
            return Err(crate::address::AddressError::PortOutOfRange(self.port));
        }
        Address::new(ip, self.port as u16)
    }
}

impl From<Address> for AddressEntity {
    fn from(addr: Address) -> Self {
        Self {
            ip: addr.ip().to_string(),
            port: u32::from(addr.port()),
        }
    }
}

/// `{include: [string], exclude: [string]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEntity {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// `{ip, port, name, map, tags, players, country, latitude, longitude}`,
/// sent server-to-client. Null fields serialize as empty string / empty
/// list per the wire schema (the original never emits JSON `null` for
/// `name`/`map` — missing data is the empty string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntity {
    pub ip: String,
    pub port: u32,
    pub name: String,
    pub map: String,
    pub tags: Vec<String>,
    pub players: serde_json::Value,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl StatusEntity {
    /// Build the wire representation of a [`Status`], with no GeoIP data
    /// attached.
    pub fn from_status(status: &Status) -> Self {
        Self {
            ip: status.address.ip().to_string(),
            port: u32::from(status.address.port()),
            name: status.name.clone().unwrap_or_default(),
            map: status.map.clone().unwrap_or_default(),
            tags: status.tags.iter().cloned().collect(),
            players: status.players.to_json(),
            country: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn players(&self) -> Option<Players> {
        Players::from_json(&self.players)
    }
}

/// `{ip, port}`, sent server-to-client in response to a `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntity {
    pub ip: String,
    pub port: u32,
}

impl From<Address> for MatchEntity {
    fn from(addr: Address) -> Self {
        Self {
            ip: addr.ip().to_string(),
            port: u32::from(addr.port()),
        }
    }
}

/// A single WebSocket message, either direction.
///
/// Serializes as `{"type": "...", "entity": ...}`. Deserializing an
/// unrecognized `type` or mismatched `entity` shape fails, which callers
/// turn into a `MessageError` and reply with one `error` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "entity")]
#[serde(rename_all = "snake_case")]
pub enum WsMessage {
    Subscribe(AddressEntity),
    Unsubscribe(AddressEntity),
    Query(QueryEntity),
    Status(StatusEntity),
    Match(MatchEntity),
    Error(String),
}

impl WsMessage {
    /// Parse one incoming frame. Any JSON error or schema mismatch is
    /// folded into a single `MessageError` string, matching the cache of
    /// distinct failure causes the spec only asks us to surface as one
    /// `error` message.
    pub fn parse(raw: &str) -> Result<Self, MessageError> {
        serde_json::from_str(raw).map_err(|e| MessageError(e.to_string()))
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).expect("WsMessage always serializes")
    }

    pub fn error(description: impl Into<String>) -> Self {
        WsMessage::Error(description.into())
    }
}

/// A malformed envelope or entity. Reported back to the client as one
/// `error` message; the connection is never dropped for this.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed websocket message: {0}")]
pub struct MessageError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn subscribe_round_trips() {
        let msg = WsMessage::Subscribe(AddressEntity {
            ip: "192.0.2.1".to_owned(),
            port: 27015,
        });
        let json = msg.to_json_string();
        assert_eq!(WsMessage::parse(&json).unwrap(), msg);
    }

    #[test]
    fn query_round_trips() {
        let msg = WsMessage::Query(QueryEntity {
            include: vec!["mode:koth".to_owned()],
            exclude: vec![],
        });
        let json = msg.to_json_string();
        assert_eq!(WsMessage::parse(&json).unwrap(), msg);
    }

    #[test]
    fn unknown_type_is_a_message_error() {
        assert!(WsMessage::parse(r#"{"type":"bogus","entity":{}}"#).is_err());
    }

    #[test]
    fn non_json_is_a_message_error() {
        assert!(WsMessage::parse("not json").is_err());
    }

    #[test]
    fn address_entity_rejects_out_of_range_port() {
        let entity = AddressEntity {
            ip: "192.0.2.1".to_owned(),
            port: 65536,
        };
        assert!(entity.to_address().is_err());
    }

    #[test]
    fn status_entity_from_status_uses_empty_string_for_unknown_fields() {
        let addr = Address::new(Ipv4Addr::new(192, 0, 2, 1), 27015).unwrap();
        let status = Status::unknown(addr);
        let entity = StatusEntity::from_status(&status);
        assert_eq!(entity.name, "");
        assert_eq!(entity.map, "");
        assert!(entity.tags.is_empty());
        assert_eq!(entity.players().unwrap(), Players::empty());
    }
}
