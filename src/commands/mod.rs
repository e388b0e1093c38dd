pub mod cache;
pub mod poller;
pub mod sync;
pub mod ui;
pub mod websocket;
