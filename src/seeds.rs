//! Seed derivation for star generation
//!
//! Every random stream in the generator is re-seeded from a pure hash of the
//! global seed and a cell address, never advanced from shared state. This is
//! what makes generation independent of call order and safe to parallelize.
//!
//! Mixing is splitmix64 based so results are stable across platforms and
//! compiler versions (std's `DefaultHasher` makes no such promise).

use crate::coords::Cell;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// splitmix64 finalizer. A bijection on `u64`.
#[inline]
pub fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Fold one value into a running hash
#[inline]
fn combine(hash: u64, value: u64) -> u64 {
    mix64(hash.wrapping_add(GOLDEN_GAMMA).wrapping_add(value))
}

/// Derive a sub-seed from a master seed and a system name.
///
/// The label is folded byte by byte, FNV-1a style, before the final mix.
pub fn derive_seed(master: u64, label: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in label.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    combine(mix64(master), hash)
}

/// Seed of the random stream for one cell.
///
/// Depends only on the global seed and the cell address (level included), so
/// the same cell always yields the same stream regardless of what else has
/// been generated.
pub fn cell_seed(global_seed: u64, cell: &Cell) -> u64 {
    let mut hash = derive_seed(global_seed, "stars");
    hash = combine(hash, cell.level.tag());
    for v in [cell.quadrant, cell.sector_local, cell.subsector_local] {
        hash = combine(hash, v.x as u32 as u64);
        hash = combine(hash, v.y as u32 as u64);
        hash = combine(hash, v.z as u32 as u64);
    }
    hash
}

/// Identity seed of the `index`-th star of a cell.
///
/// For a fixed cell seed this is injective in `index`: the pre-image
/// `cell_seed + (index + 1) * GOLDEN_GAMMA` is distinct for every index since
/// the gamma is odd, and `mix64` is a bijection. Stars of one cell can
/// therefore never share a seed.
pub fn star_seed(cell_seed: u64, index: u64) -> u64 {
    mix64(cell_seed.wrapping_add(index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA)))
}
