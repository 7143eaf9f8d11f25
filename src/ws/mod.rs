//! WebSocket transport: upgrade, per-connection session, wire types

pub mod handler;
pub mod protocol;
