//! Wire types shared by the cache, poller, tagger and websocket gateway.
//!
//! Nothing in this crate performs I/O; it exists so that every other crate
//! agrees on one definition of an address, a player roster, a server
//! status, and the WebSocket envelope.

pub mod address;
pub mod message;
pub mod players;
pub mod status;

pub use address::{Address, AddressError};
pub use message::{AddressEntity, MatchEntity, MessageError, QueryEntity, StatusEntity, WsMessage};
pub use players::{PlayerScore, Players};
pub use status::{GeoLocation, Status};
