//! Streaming: the resident tile cache, radius-driven load/unload, and
//! subscriber notification.
//!
//! # Invariants
//! - No two resident tiles share a key.
//! - All cache mutations of an update complete before any listener runs.
//! - A `Load` event precedes the `Unload` event of the same update.
//! - A failing listener never disturbs the cache or other listeners.

mod events;
mod manager;
mod stats;
mod tile;

pub use events::{
    DispatchReport, ListenerError, ListenerResult, Subscription, TileEvent, TileEventKind,
};
pub use manager::{StreamError, TileManager};
pub use stats::{StreamTotals, UpdateStats};
pub use tile::Tile;

pub fn crate_info() -> &'static str {
    "tilestream-stream v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("stream"));
    }
}
