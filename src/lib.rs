//! The `gsd` CLI: subcommands for administering the state cache, running
//! the poller pool, synchronising from the upstream master server, and
//! serving the WebSocket fan-out gateway.

pub mod cli;
pub mod commands;
pub mod exit;
