//! Game simulation modules

pub mod physics;
pub mod r#match;
pub mod registry;
pub mod snapshot;

pub use r#match::{GameMatch, MatchHandle, MatchState};
pub use registry::{ConnectionRegistry, Frame, PlayerHandle, PlayerId, PlayerView};
