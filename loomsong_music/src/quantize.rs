// Scale quantization: snap a raw chromatic pitch onto the configured scale.
//
// The raw pitch is split into an octave and a pitch class, the pitch class is
// folded into the scale's reference octave, and every scale tone at the
// minimum absolute distance is collected. A single nearest tone wins outright;
// when several tie, one is drawn uniformly from the uniform generator (never
// from the noise field). The winner is moved back to the raw pitch's octave
// and transposed by the key signature.

use crate::scale::{KeySignature, Scale};
use loomsong_prng::SongRng;

/// Binds a scale and key for repeated quantization.
#[derive(Debug, Clone, Copy)]
pub struct ScaleQuantizer<'a> {
    scale: &'a Scale,
    key: KeySignature,
}

impl<'a> ScaleQuantizer<'a> {
    pub fn new(scale: &'a Scale, key: KeySignature) -> Self {
        ScaleQuantizer { scale, key }
    }

    /// Quantize `raw_pitch` to a MIDI pitch whose pitch class, before the key
    /// offset, is a scale member.
    pub fn quantize(&self, raw_pitch: i32, rng: &mut SongRng) -> u8 {
        let octave = raw_pitch.div_euclid(12);
        let pitch_class = raw_pitch.rem_euclid(12);
        let reference = self.scale.reference_octave();

        let ties = nearest_tones(self.scale, pitch_class);
        let tone = if ties.len() == 1 {
            ties[0]
        } else {
            ties[rng.range_usize(0, ties.len())]
        };

        let pitch = tone + 12 * (octave - reference) + self.key.offset() as i32;
        fold_into_midi_range(pitch)
    }
}

/// All scale tones at the minimum absolute distance from `pitch_class`
/// (folded into the scale's reference octave), in scale order.
pub fn nearest_tones(scale: &Scale, pitch_class: i32) -> Vec<i32> {
    let folded = pitch_class.rem_euclid(12) + 12 * scale.reference_octave();
    let min_distance = scale
        .tones()
        .iter()
        .map(|&t| (t - folded).abs())
        .min()
        .unwrap_or(0);
    scale
        .tones()
        .iter()
        .copied()
        .filter(|&t| (t - folded).abs() == min_distance)
        .collect()
}

/// Shift by whole octaves until the pitch is a valid MIDI note.
fn fold_into_midi_range(mut pitch: i32) -> u8 {
    while pitch < 0 {
        pitch += 12;
    }
    while pitch > 127 {
        pitch -= 12;
    }
    pitch as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pentatonic() -> Scale {
        Scale::named("pentatonic").unwrap()
    }

    #[test]
    fn test_in_scale_pitches_unchanged() {
        let scale = pentatonic();
        let q = ScaleQuantizer::new(&scale, KeySignature::default());
        let mut rng = SongRng::new(1);
        for &p in &[60, 62, 65, 67, 69, 48, 81] {
            assert_eq!(q.quantize(p, &mut rng) as i32, p);
        }
    }

    #[test]
    fn test_nearest_tone_and_key_offset() {
        let scale = pentatonic();
        let q = ScaleQuantizer::new(&scale, KeySignature::new(6).unwrap());
        let mut rng = SongRng::new(1);
        // 64 = E: distance 1 to F (5), 2 to D (2) -> F, then +6.
        assert_eq!(q.quantize(64, &mut rng), 65 + 6);
        // 71 = B: absolute distance within the octave, so A (9) wins.
        assert_eq!(q.quantize(71, &mut rng), 69 + 6);
    }

    #[test]
    fn test_ties_are_collected() {
        let scale = pentatonic();
        assert_eq!(nearest_tones(&scale, 1), vec![0, 2]);
        assert_eq!(nearest_tones(&scale, 8), vec![7, 9]);
        assert_eq!(nearest_tones(&scale, 4), vec![5]);
    }

    #[test]
    fn test_single_nearest_draws_nothing() {
        let scale = pentatonic();
        let q = ScaleQuantizer::new(&scale, KeySignature::default());
        let mut rng = SongRng::new(5);
        let mut untouched = SongRng::new(5);
        q.quantize(64, &mut rng);
        assert_eq!(rng.next_u64(), untouched.next_u64());
    }

    #[test]
    fn test_non_zero_reference_octave() {
        let scale = Scale::new(vec![60, 62, 65, 67, 69]).unwrap();
        let q = ScaleQuantizer::new(&scale, KeySignature::default());
        let mut rng = SongRng::new(3);
        assert_eq!(q.quantize(40, &mut rng), 41); // E2 -> F2
        assert_eq!(q.quantize(74, &mut rng), 74); // D5 stays
    }

    #[test]
    fn test_negative_and_high_raw_pitches_stay_in_midi_range() {
        let scale = pentatonic();
        let q = ScaleQuantizer::new(&scale, KeySignature::new(11).unwrap());
        let mut rng = SongRng::new(9);
        for raw in [-30, -1, 0, 126, 127, 200] {
            let p = q.quantize(raw, &mut rng);
            assert!(p <= 127);
            assert!(scale.contains_pitch_class(p as i32 - 11));
        }
    }

    #[test]
    fn test_tie_break_fairness() {
        let scale = pentatonic();
        let q = ScaleQuantizer::new(&scale, KeySignature::default());
        let trials = 20_000;
        let mut low = 0;
        for seed in 0..trials {
            let mut rng = SongRng::new(seed);
            // 61 = C#, equidistant from C (60) and D (62).
            if q.quantize(61, &mut rng) == 60 {
                low += 1;
            }
        }
        let pct = low as f64 / trials as f64;
        assert!(
            (0.47..0.53).contains(&pct),
            "tie-break should be ~50%, got {:.1}%",
            pct * 100.0
        );
    }
}
