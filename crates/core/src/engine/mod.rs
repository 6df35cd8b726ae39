//! Draft engine: the single writer of draft state.

mod draft_engine;
mod types;

pub use draft_engine::DraftEngine;
pub use types::*;
