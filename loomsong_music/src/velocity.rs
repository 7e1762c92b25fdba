// Velocity and rest dynamics.
//
// Both policies share one rest rule: draw `u` uniformly from [0, 1) and rest
// when `u - 0.05 * consecutive_rests > 0.75`. Each rest raises the bar for
// the next one, so a run of rests can't grow past five (u would have to
// exceed 1.0). A rest is velocity 0; the caller still emits the event so the
// timeline keeps its length.
//
// - Continuous stream (melody): noise-driven base velocity, boosted by the
//   noise slope when it is steep (an accent), capped at 110.
// - Motif (rhythm): strong beats always sound, loud; weak beats may rest and
//   sound softer when they don't.

use crate::duration::TICKS_PER_BEAT;
use crate::noise::map_range;
use loomsong_prng::SongRng;

/// Velocity value reserved for rests.
pub const REST: u8 = 0;
/// Hard ceiling for generated velocities.
pub const MAX_VELOCITY: u8 = 110;

const REST_THRESHOLD: f64 = 0.75;
const REST_ESCALATION: f64 = 0.05;
const ACCENT_THRESHOLD: f64 = 0.5;
const ACCENT_GAIN: f64 = 0.2;

const STREAM_RANGE: (f64, f64) = (64.0, 96.0);
const STRONG_RANGE: (f64, f64) = (80.0, 110.0);
const WEAK_RANGE: (f64, f64) = (45.0, 75.0);

/// Metric weight of an event's onset within its measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatStrength {
    Strong,
    Weak,
}

impl BeatStrength {
    /// Strong on the downbeat and on beat `ceil(numerator / 2)` (0-indexed).
    pub fn at(offset_ticks: u32, numerator: u32) -> Self {
        let secondary = numerator.div_ceil(2) * TICKS_PER_BEAT;
        if offset_ticks == 0 || offset_ticks == secondary {
            BeatStrength::Strong
        } else {
            BeatStrength::Weak
        }
    }
}

/// Tracks rest runs and turns noise values into velocities.
#[derive(Debug, Clone, Default)]
pub struct VelocityModel {
    consecutive_rests: u32,
}

impl VelocityModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_rests(&self) -> u32 {
        self.consecutive_rests
    }

    /// Continuous-stream policy. `level` is a noise value in [-1, 1] for the
    /// base velocity, `slope` the local noise slope used for accents.
    pub fn stream(&mut self, rng: &mut SongRng, level: f64, slope: f64) -> u8 {
        if self.roll_rest(rng) {
            return REST;
        }
        let base = map_range(level, STREAM_RANGE.0, STREAM_RANGE.1);
        accented(base, slope)
    }

    /// Motif policy. `level` is a noise value in [-1, 1] sampled from the
    /// row matching `strength`.
    pub fn motif(&mut self, rng: &mut SongRng, strength: BeatStrength, level: f64) -> u8 {
        match strength {
            BeatStrength::Strong => {
                self.consecutive_rests = 0;
                to_velocity(map_range(level, STRONG_RANGE.0, STRONG_RANGE.1))
            }
            BeatStrength::Weak => {
                if self.roll_rest(rng) {
                    return REST;
                }
                to_velocity(map_range(level, WEAK_RANGE.0, WEAK_RANGE.1))
            }
        }
    }

    /// Apply the rest rule to a fresh uniform draw.
    fn roll_rest(&mut self, rng: &mut SongRng) -> bool {
        self.decide_rest(rng.next_f64())
    }

    fn decide_rest(&mut self, u: f64) -> bool {
        let rest = u - REST_ESCALATION * self.consecutive_rests as f64 > REST_THRESHOLD;
        if rest {
            self.consecutive_rests += 1;
        } else {
            self.consecutive_rests = 0;
        }
        rest
    }
}

/// Boost `base` by the slope magnitude when it passes the accent threshold.
fn accented(base: f64, slope: f64) -> u8 {
    let steepness = slope.abs();
    if steepness > ACCENT_THRESHOLD {
        to_velocity(base * (1.0 + ACCENT_GAIN * steepness))
    } else {
        to_velocity(base)
    }
}

/// Round into a sounding velocity, 1..=MAX_VELOCITY.
fn to_velocity(v: f64) -> u8 {
    v.round().clamp(1.0, MAX_VELOCITY as f64) as u8
}
