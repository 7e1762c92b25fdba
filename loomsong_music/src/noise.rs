// Deterministic 2D noise field: the "shape" source of every composition.
//
// Value noise on the integer lattice. Each lattice point gets a value in
// [-1, 1] from `loomsong_prng::lattice_hash(seed, ix, iy)`, and points in
// between blend the four surrounding corners with a quintic fade. Because
// the blend is convex the output never leaves [-1, 1], and because the
// lattice is hashed (not drawn from a stream) a sample is a pure function of
// `(seed, x, y)`.
//
// Coordinate rows are assigned by convention so different musical dimensions
// read decorrelated parts of the field: the melody reads rows 1 (pitch,
// duration) and 2 (base velocity); motifs read rows derived from their index
// (see motif.rs).

use loomsong_prng::{lattice_hash, unit_f64};

/// Step used by the forward finite-difference slope estimate.
pub const SLOPE_STEP: f64 = 0.1;

/// A seeded 2D noise field. Cheap to copy; holds no mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseField {
    seed: u64,
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        NoiseField { seed }
    }

    /// Sample the field at `(x, y)`. Always in [-1, 1].
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let ix = x0 as i64;
        let iy = y0 as i64;
        let u = fade(x - x0);
        let v = fade(y - y0);

        let v00 = self.lattice(ix, iy);
        let v10 = self.lattice(ix + 1, iy);
        let v01 = self.lattice(ix, iy + 1);
        let v11 = self.lattice(ix + 1, iy + 1);

        let bottom = lerp(v00, v10, u);
        let top = lerp(v01, v11, u);
        lerp(bottom, top, v).clamp(-1.0, 1.0)
    }

    /// Sample the field and estimate `d(value)/dx` by a forward difference
    /// of [`SLOPE_STEP`].
    pub fn sample_with_slope(&self, x: f64, y: f64) -> (f64, f64) {
        let value = self.sample(x, y);
        let ahead = self.sample(x + SLOPE_STEP, y);
        (value, (ahead - value) / SLOPE_STEP)
    }

    fn lattice(&self, ix: i64, iy: i64) -> f64 {
        unit_f64(lattice_hash(self.seed, ix, iy)) * 2.0 - 1.0
    }
}

/// Map a noise value in [-1, 1] linearly onto `[low, high]`.
pub fn map_range(value: f64, low: f64, high: f64) -> f64 {
    let t = (value.clamp(-1.0, 1.0) + 1.0) / 2.0;
    low + t * (high - low)
}

/// Quintic smoothstep, `6t^5 - 15t^4 + 10t^3`.
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_in_range() {
        let field = NoiseField::new(62);
        for i in 0..2000 {
            let x = i as f64 * 0.37 - 100.0;
            let y = (i % 13) as f64 * 1.7;
            let v = field.sample(x, y);
            assert!((-1.0..=1.0).contains(&v), "sample out of range: {v}");
        }
    }

    #[test]
    fn test_sample_is_pure() {
        let field = NoiseField::new(7);
        let first = field.sample(3.25, 1.0);
        for i in 0..50 {
            field.sample(i as f64, 2.0);
        }
        assert_eq!(first, field.sample(3.25, 1.0));
        assert_eq!(first, NoiseField::new(7).sample(3.25, 1.0));
    }

    #[test]
    fn test_seeds_differ() {
        let a = NoiseField::new(1);
        let b = NoiseField::new(2);
        let differs = (0..20).any(|i| a.sample(i as f64 + 0.5, 1.0) != b.sample(i as f64 + 0.5, 1.0));
        assert!(differs);
    }

    #[test]
    fn test_not_flat_on_integer_lattice() {
        // The melody samples at x = elapsed_beats * 2, which is an integer for
        // most onsets; the field must still vary there.
        let field = NoiseField::new(62);
        let values: Vec<f64> = (0..16).map(|i| field.sample(i as f64, 1.0)).collect();
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        assert!(max - min > 0.2, "lattice values too flat: {values:?}");
    }

    #[test]
    fn test_slope_is_forward_difference() {
        let field = NoiseField::new(11);
        let (value, slope) = field.sample_with_slope(4.3, 1.0);
        let expected = (field.sample(4.3 + SLOPE_STEP, 1.0) - value) / SLOPE_STEP;
        assert_eq!(value, field.sample(4.3, 1.0));
        assert!((slope - expected).abs() < 1e-12);
    }

    #[test]
    fn test_map_range() {
        assert_eq!(map_range(-1.0, 80.0, 110.0), 80.0);
        assert_eq!(map_range(1.0, 80.0, 110.0), 110.0);
        assert_eq!(map_range(0.0, 0.0, 10.0), 5.0);
        assert_eq!(map_range(5.0, 0.0, 10.0), 10.0); // clamped
    }
}
