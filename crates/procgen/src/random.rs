//! Seed derivation and seeded random draws.
//!
//! Everything here is a pure function of its input so regenerated tiles are
//! bit-for-bit identical across runs and platforms.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// FNV-1a over a byte string. Order-sensitive.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |h, &b| {
        (h ^ b as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Splitmix64 finalizer. Adjacent inputs map to unrelated outputs.
pub fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Deterministic value in [0, 1) for `seed`.
pub fn seeded_random(seed: u64) -> f64 {
    // top 53 bits fill an f64 mantissa exactly
    (splitmix64(seed) >> 11) as f64 / (1u64 << 53) as f64
}

/// Seed for a tile, hashed from its grid coordinate rendered at micro-degree
/// precision.
pub fn tile_seed(grid_lat: f64, grid_lon: f64) -> u64 {
    fnv1a(format!("{grid_lat:.6},{grid_lon:.6}").as_bytes())
}
