// Deterministic, portable randomness for Loomsong.
//
// Two kinds of randomness live here, and the generator keeps them apart:
//
// - `SongRng`: a stateful xoshiro256++ stream (Blackman & Vigna, 2019) with
//   SplitMix64 seeding. Used for tie-breaks between equidistant scale tones
//   and for rest/no-rest decisions.
// - `lattice_hash`: a stateless mix of `(seed, ix, iy)` into 64 bits. The
//   noise field in `loomsong_music` builds its lattice on this, so a noise
//   sample never depends on how many samples were taken before it.
//
// `derive_seed` splits one top-level composition seed into independent
// sub-seeds (noise field, uniform stream, per-track streams).
//
// **Critical constraint: determinism.** Every function here must produce
// identical output for identical input regardless of platform, compiler
// version, or optimization level. The core generator and the hashes use only
// integer arithmetic; floats appear only in the final unit-interval mapping.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG, the uniform generator of a composition.
///
/// Each track builder owns its own `SongRng`, derived from the composition
/// seed with [`SongRng::from_stream`], so tracks can be built in any order
/// (or in parallel) without changing each other's draws.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SongRng {
    s: [u64; 4],
}

impl SongRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// SplitMix64 expands the seed into the 256-bit state. Two generators
    /// built from the same seed produce identical sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Create a generator for sub-stream `stream` of `root`.
    pub fn from_stream(root: u64, stream: u64) -> Self {
        Self::new(derive_seed(root, stream))
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        unit_f64(self.next_u64())
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Rejection sampling avoids modulo bias. Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Generate a uniform random `usize` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }
}

/// Derive an independent sub-seed for `stream` from a `root` seed.
///
/// Streams are numbered by convention at the call site (the composer uses
/// 0 for the noise field and 1 for the uniform generator).
pub fn derive_seed(root: u64, stream: u64) -> u64 {
    let mut sm = root ^ stream.wrapping_mul(0xd1b5_4a32_d192_ed03);
    // One warm-up round so that adjacent streams don't share low bits.
    splitmix64(&mut sm);
    splitmix64(&mut sm)
}

/// Stateless hash of a 2D integer lattice point under `seed`.
pub fn lattice_hash(seed: u64, ix: i64, iy: i64) -> u64 {
    let mut h = seed;
    h ^= (ix as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    h = mix64(h);
    h ^= (iy as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
    mix64(h)
}

/// Map a 64-bit value onto [0, 1) using its upper 53 bits.
pub fn unit_f64(bits: u64) -> f64 {
    (bits >> 11) as f64 / (1u64 << 53) as f64
}

/// SplitMix64 step, used for seeding and stream derivation.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    mix64(*state)
}

/// SplitMix64 finalizer.
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
