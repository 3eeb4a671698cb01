//! Developer tooling: resident tile inspector and summaries.
//!
//! # Invariants
//! - Tools only read manager state; they never load or evict tiles.

mod inspector;

pub use inspector::{ResidentSummary, TileInfo, TileInspector};

pub fn crate_info() -> &'static str {
    "tilestream-tools v0.1.0"
}
