//! Match state and authoritative tick loop

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::util::time::tick_duration;

use super::physics::{Ball, Goal, PhysicsSystem};
use super::registry::{ConnectionRegistry, PlayerId};
use super::snapshot::SnapshotBuilder;

/// Match state (owned by the match task)
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    pub ball: Ball,
    pub tick: u64,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(Ball::default())
    }
}

impl MatchState {
    pub fn new(ball: Ball) -> Self {
        Self { ball, tick: 0 }
    }

    /// Advance one tick against the given paddle positions
    pub fn step(&mut self, paddles: &[f32]) -> Option<Goal> {
        self.tick += 1;
        PhysicsSystem::step(&mut self.ball, paddles)
    }
}

/// Read-only view of a running match for other tasks
#[derive(Clone, Debug, Default)]
pub struct MatchHandle {
    tick: Arc<AtomicU64>,
}

impl MatchHandle {
    /// Ticks simulated so far
    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub goal: Option<Goal>,
    /// Connections the frame was queued for
    pub delivered: usize,
    /// Connections whose outbox was full
    pub dropped: usize,
    /// Connections found closed and removed
    pub pruned: usize,
}

/// The authoritative game match
pub struct GameMatch {
    state: MatchState,
    registry: Arc<ConnectionRegistry>,
    tick_duration: Duration,
    tick: Arc<AtomicU64>,
}

impl GameMatch {
    /// Create the match with a freshly served ball
    pub fn new(registry: Arc<ConnectionRegistry>, tick_rate: u32) -> (Self, MatchHandle) {
        Self::with_state(registry, tick_rate, MatchState::default())
    }

    pub fn with_state(
        registry: Arc<ConnectionRegistry>,
        tick_rate: u32,
        state: MatchState,
    ) -> (Self, MatchHandle) {
        let tick = Arc::new(AtomicU64::new(state.tick));
        let handle = MatchHandle { tick: tick.clone() };

        let game_match = Self {
            state,
            registry,
            tick_duration: tick_duration(tick_rate),
            tick,
        };

        (game_match, handle)
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Run the authoritative tick loop for the lifetime of the process
    pub async fn run(mut self) {
        info!(tick_ms = self.tick_duration.as_secs_f64() * 1000.0, "Match started");

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;
            self.run_cycle();
        }
    }

    /// Simulate one tick and fan the resulting state out to every connection.
    ///
    /// Never waits on a connection: frames are queued without blocking and
    /// closed connections are removed only after the whole pass.
    pub fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let before = self.registry.snapshot();
        let paddles: Vec<f32> = before.iter().map(|p| p.y).collect();

        report.goal = self.state.step(&paddles);
        self.tick.store(self.state.tick, Ordering::Relaxed);

        if let Some(goal) = report.goal {
            let scorers: Vec<PlayerId> = before.into_iter().map(|p| p.id).collect();
            self.registry.award_point(&scorers);
            debug!(tick = self.state.tick, ?goal, players = scorers.len(), "Point scored");
        }

        let players = self.registry.snapshot();
        let msg = SnapshotBuilder::build(&self.state.ball, &players);
        let Some(frame) = SnapshotBuilder::encode(&msg) else {
            return report;
        };

        let mut closed: Vec<PlayerId> = Vec::new();
        for player in &players {
            match player.outbox.try_send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(player_id = %player.id, "Outbox full, dropping frame");
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => closed.push(player.id.clone()),
            }
        }

        report.pruned = self.registry.remove_many(&closed);
        for id in &closed {
            info!(player_id = %id, "Pruned closed connection");
        }

        report
    }
}
