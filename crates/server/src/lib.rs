//! HTTP surface for the snake-draft engine.

pub mod api;
pub mod metrics;
pub mod state;
