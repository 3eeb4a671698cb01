//! Procedural generation: heightfields and contextual items synthesized from
//! a tile's grid coordinate.
//!
//! # Invariants
//! - Generation is a pure function of (grid coordinate, configuration).
//! - Elevation samples are clamped to the configured range.
//! - Item ids are derived from the tile key and item index.

mod generator;
mod heightfield;
mod items;
pub mod random;

pub use generator::{Generator, TileContent};
pub use heightfield::Heightfield;
pub use items::{ContextualItem, ItemKind, item_count, place_items};

pub fn crate_info() -> &'static str {
    "tilestream-procgen v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("procgen"));
    }
}
