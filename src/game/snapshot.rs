//! Snapshot building for network transmission

use tracing::error;

use crate::ws::protocol::{PlayerSnapshot, ServerMsg};

use super::physics::Ball;
use super::registry::{Frame, PlayerView};

/// Builds the per-tick state message
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Build a snapshot message from the ball and a registry snapshot
    pub fn build(ball: &Ball, players: &[PlayerView]) -> ServerMsg {
        let players = players
            .iter()
            .map(|p| {
                (
                    p.id.clone(),
                    PlayerSnapshot {
                        ip: p.addr.clone(),
                        y: p.y,
                        score: p.score,
                    },
                )
            })
            .collect();

        ServerMsg {
            ball: *ball,
            players,
        }
    }

    /// Serialize once for all recipients. Failures are logged and yield no frame.
    pub fn encode(msg: &ServerMsg) -> Option<Frame> {
        match serde_json::to_string(msg) {
            Ok(json) => Some(Frame::from(json)),
            Err(e) => {
                error!(error = %e, "Failed to serialize state snapshot");
                None
            }
        }
    }
}
