//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{ConnectionRegistry, GameMatch, MatchHandle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ConnectionRegistry>,
    pub game_match: MatchHandle,
}

impl AppState {
    /// Build the shared state together with the match that drives it.
    ///
    /// The returned `GameMatch` is the only writer of the ball; the caller
    /// spawns it.
    pub fn new(config: Config) -> (Self, GameMatch) {
        let config = Arc::new(config);

        // Initialize connection registry
        let registry = Arc::new(ConnectionRegistry::new(config.outbox_capacity));

        // Initialize the single global match
        let (game_match, match_handle) = GameMatch::new(registry.clone(), config.tick_rate);

        let state = Self {
            config,
            registry,
            game_match: match_handle,
        };

        (state, game_match)
    }
}
