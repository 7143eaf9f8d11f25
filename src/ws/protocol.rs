//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::physics::Ball;
use crate::game::PlayerId;

/// Message sent from client to server: desired paddle position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientMsg {
    pub y: f32,
}

/// Game state broadcast to every client once per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerMsg {
    pub ball: Ball,
    pub players: BTreeMap<PlayerId, PlayerSnapshot>,
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    /// Peer address the player connected from
    pub ip: String,
    /// Paddle position
    pub y: f32,
    pub score: u32,
}
