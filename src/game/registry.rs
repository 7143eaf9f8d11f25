//! Registry of connected players
//!
//! The registry is the single source of truth for who is connected. Each entry
//! carries the player's paddle, score and the sending half of its outbox. All
//! operations take one lock, so a snapshot never observes a half-built or
//! half-removed entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::physics::{clamp_paddle, PADDLE_START_Y};

/// A serialized outbound frame, shared by every recipient of a broadcast
pub type Frame = Arc<str>;

/// Opaque player identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Random 8-character hex id
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Entry {
    addr: String,
    y: f32,
    score: u32,
    outbox: mpsc::Sender<Frame>,
}

/// Point-in-time copy of one registry entry
#[derive(Debug, Clone)]
pub struct PlayerView {
    pub id: PlayerId,
    pub addr: String,
    pub y: f32,
    pub score: u32,
    pub outbox: mpsc::Sender<Frame>,
}

/// Returned to the connection that registered a player
#[derive(Debug)]
pub struct PlayerHandle {
    pub id: PlayerId,
    /// Frames queued for this connection by the broadcast loop
    pub outbox: mpsc::Receiver<Frame>,
}

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Player already registered: {0}")]
    DuplicatePlayer(PlayerId),
}

/// Concurrency-safe map of connected players
#[derive(Debug)]
pub struct ConnectionRegistry {
    players: RwLock<HashMap<PlayerId, Entry>>,
    outbox_capacity: usize,
}

impl ConnectionRegistry {
    pub fn new(outbox_capacity: usize) -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    /// Register a player under a chosen id with a centered paddle and no score
    pub fn register(
        &self,
        id: PlayerId,
        addr: impl Into<String>,
    ) -> Result<PlayerHandle, RegistryError> {
        let mut players = self.players.write();
        if players.contains_key(&id) {
            return Err(RegistryError::DuplicatePlayer(id));
        }

        let (outbox_tx, outbox_rx) = mpsc::channel(self.outbox_capacity);
        players.insert(
            id.clone(),
            Entry {
                addr: addr.into(),
                y: PADDLE_START_Y,
                score: 0,
                outbox: outbox_tx,
            },
        );

        Ok(PlayerHandle {
            id,
            outbox: outbox_rx,
        })
    }

    /// Register a player under a freshly generated id
    pub fn join(&self, addr: impl Into<String>) -> PlayerHandle {
        let addr = addr.into();
        loop {
            match self.register(PlayerId::generate(), addr.clone()) {
                Ok(handle) => return handle,
                Err(RegistryError::DuplicatePlayer(id)) => {
                    debug!(player_id = %id, "Generated id collided, retrying");
                }
            }
        }
    }

    /// Store a new paddle position, clamped into the field.
    ///
    /// Returns false if the player is unknown. NaN leaves the paddle where it was.
    pub fn update_position(&self, id: &PlayerId, y: f32) -> bool {
        let mut players = self.players.write();
        match players.get_mut(id) {
            Some(entry) => {
                if let Some(y) = clamp_paddle(y) {
                    entry.y = y;
                }
                true
            }
            None => false,
        }
    }

    /// Remove a player. Unknown ids are ignored.
    pub fn remove(&self, id: &PlayerId) -> bool {
        self.players.write().remove(id).is_some()
    }

    /// Remove several players under one lock, returning how many were present
    pub fn remove_many(&self, ids: &[PlayerId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let mut players = self.players.write();
        ids.iter().filter(|id| players.remove(*id).is_some()).count()
    }

    /// Add one point to each listed player still connected
    pub fn award_point(&self, ids: &[PlayerId]) {
        let mut players = self.players.write();
        for id in ids {
            if let Some(entry) = players.get_mut(id) {
                entry.score = entry.score.saturating_add(1);
            }
        }
    }

    /// Consistent copy of every entry, ordered by id
    pub fn snapshot(&self) -> Vec<PlayerView> {
        let players = self.players.read();
        let mut views: Vec<PlayerView> = players
            .iter()
            .map(|(id, entry)| PlayerView {
                id: id.clone(),
                addr: entry.addr.clone(),
                y: entry.y,
                score: entry.score,
                outbox: entry.outbox.clone(),
            })
            .collect();
        drop(players);

        views.sort_by(|a, b| a.id.cmp(&b.id));
        views
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_generated_ids_are_short_hex() {
        let id = PlayerId::generate();
        assert_eq!(id.as_str().len(), 8);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_register_defaults() {
        let registry = ConnectionRegistry::new(4);
        let handle = registry.register("p1".into(), "10.0.0.1").unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, handle.id);
        assert_eq!(snapshot[0].addr, "10.0.0.1");
        assert_eq!(snapshot[0].y, PADDLE_START_Y);
        assert_eq!(snapshot[0].score, 0);
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let registry = ConnectionRegistry::new(4);
        let _first = registry.register("p1".into(), "a").unwrap();
        let err = registry.register("p1".into(), "b").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePlayer(_)));
        assert_eq!(registry.snapshot()[0].addr, "a");
    }

    #[test]
    fn test_update_position_clamps() {
        let registry = ConnectionRegistry::new(4);
        let handle = registry.join("a");

        for (input, expected) in [(-5.0, 0.0), (123.0, 123.0), (599.0, 550.0), (1e30, 550.0)] {
            assert!(registry.update_position(&handle.id, input));
            assert_eq!(registry.snapshot()[0].y, expected);
        }

        assert!(registry.update_position(&handle.id, f32::NAN));
        assert_eq!(registry.snapshot()[0].y, 550.0);
    }

    #[test]
    fn test_update_unknown_player() {
        let registry = ConnectionRegistry::new(4);
        assert!(!registry.update_position(&"ghost".into(), 10.0));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = ConnectionRegistry::new(4);
        let handle = registry.join("a");
        assert!(registry.remove(&handle.id));
        assert!(!registry.remove(&handle.id));
        assert!(!registry.remove(&"ghost".into()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_award_point_skips_departed() {
        let registry = ConnectionRegistry::new(4);
        let a = registry.register("a".into(), "x").unwrap();
        let b = registry.register("b".into(), "y").unwrap();
        registry.remove(&b.id);

        registry.award_point(&[a.id.clone(), b.id.clone()]);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].score, 1);
    }

    #[test]
    fn test_snapshot_sorted_by_id() {
        let registry = ConnectionRegistry::new(4);
        let _c = registry.register("c".into(), "x").unwrap();
        let _a = registry.register("a".into(), "x").unwrap();
        let _b = registry.register("b".into(), "x").unwrap();

        let ids: Vec<String> = registry
            .snapshot()
            .into_iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_remove_many() {
        let registry = ConnectionRegistry::new(4);
        let a = registry.join("a");
        let b = registry.join("b");
        let c = registry.join("c");

        let removed = registry.remove_many(&[a.id.clone(), c.id.clone(), "ghost".into()]);
        assert_eq!(removed, 2);
        assert!(registry.contains(&b.id));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_update_remove() {
        let registry = Arc::new(ConnectionRegistry::new(4));

        let mut tasks = Vec::new();
        for worker in 0..32 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let id = PlayerId::from(format!("w{worker:02}").as_str());
                let _handle = registry.register(id.clone(), "127.0.0.1").unwrap();
                for step in 0..200 {
                    registry.update_position(&id, (step * 5) as f32 - 100.0);
                    if step % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
                if worker % 2 == 0 {
                    registry.remove(&id);
                }
                id
            }));
        }

        let reader = {
            let registry = registry.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    for view in registry.snapshot() {
                        assert!((0.0..=550.0).contains(&view.y));
                        assert_eq!(view.addr, "127.0.0.1");
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        let mut removed = Vec::new();
        for (worker, task) in tasks.into_iter().enumerate() {
            let id = task.await.unwrap();
            if worker % 2 == 0 {
                removed.push(id);
            }
        }
        reader.await.unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 16);
        for view in &snapshot {
            assert!(!removed.contains(&view.id));
            assert_eq!(view.y, 550.0);
            assert_eq!(view.score, 0);
        }
    }
}
