//! Authoritative Pong server
//!
//! One global match: a ball bounced between paddles, one paddle per connected
//! WebSocket client. A single task owns the ball and ticks it at a fixed rate;
//! connection tasks only write paddle positions into the shared registry. Each
//! tick the full state is serialized once and queued for every connection
//! without waiting on any of them.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
