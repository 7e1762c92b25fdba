// One-measure rhythmic motifs for the looped accompaniment.
//
// A motif is generated by walking a fresh measure budget down to zero. At
// each step the noise field is read at `x = beats remaining` on four rows
// (duration, pitch, strong-beat velocity, weak-beat velocity). Each row is
// `base + motif_index * stride`, with a different base and stride per
// dimension, so motif 0 and motif 1 read unrelated parts of the field and
// none of them touch the melody's rows (1 and 2).
//
// Pitches are stored raw (unquantized); the rhythm builder snaps them to the
// live scale and key when the motif is emitted.

use crate::config::PartParams;
use crate::duration::{Duration, DurationSelector, MeasureBudget, TICKS_PER_BEAT};
use crate::error::Result;
use crate::noise::NoiseField;
use crate::velocity::{BeatStrength, VelocityModel};
use loomsong_prng::SongRng;
use tracing::debug;

/// Row assignment for one sampled dimension.
#[derive(Debug, Clone, Copy)]
struct MotifAxis {
    base: f64,
    stride: f64,
}

impl MotifAxis {
    fn row(self, motif_index: usize) -> f64 {
        self.base + motif_index as f64 * self.stride
    }
}

// Bases sit far apart and off the integer lattice; strides differ so rows of
// different dimensions don't line up for small motif counts.
const DURATION_AXIS: MotifAxis = MotifAxis { base: 100.125, stride: 2.9 };
const PITCH_AXIS: MotifAxis = MotifAxis { base: 200.25, stride: 3.7 };
const STRONG_AXIS: MotifAxis = MotifAxis { base: 300.5, stride: 5.3 };
const WEAK_AXIS: MotifAxis = MotifAxis { base: 400.75, stride: 7.1 };

/// One step of a motif, pitch not yet quantized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotifStep {
    pub raw_pitch: i32,
    pub velocity: u8,
    pub duration: Duration,
}

/// Exactly one measure of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motif {
    pub steps: Vec<MotifStep>,
}

impl Motif {
    pub fn total_ticks(&self) -> u32 {
        self.steps.iter().map(|s| s.duration.ticks()).sum()
    }
}

pub struct MeasureMotifGenerator<'a> {
    field: &'a NoiseField,
    part: &'a PartParams,
}

impl<'a> MeasureMotifGenerator<'a> {
    pub fn new(field: &'a NoiseField, part: &'a PartParams) -> Self {
        MeasureMotifGenerator { field, part }
    }

    /// Generate motif `motif_index` for a measure of `numerator` beats.
    /// `rng` decides weak-beat rests.
    pub fn generate(
        &self,
        numerator: u32,
        motif_index: usize,
        rng: &mut SongRng,
    ) -> Result<Motif> {
        let selector = DurationSelector::new(self.field);
        let mut budget = MeasureBudget::new(numerator);
        let mut velocity = VelocityModel::new();
        let mut steps = Vec::new();

        loop {
            let remaining = budget.remaining();
            let x = remaining as f64 / TICKS_PER_BEAT as f64;

            let duration = selector.select_at(
                &self.part.durations,
                remaining,
                x,
                DURATION_AXIS.row(motif_index),
            )?;

            let pitch_value = self.field.sample(x, PITCH_AXIS.row(motif_index));
            let raw_pitch =
                self.part.center_pitch + (pitch_value * self.part.pitch_span as f64).round() as i32;

            let strength = BeatStrength::at(budget.offset_in_measure(), numerator);
            let axis = match strength {
                BeatStrength::Strong => STRONG_AXIS,
                BeatStrength::Weak => WEAK_AXIS,
            };
            let level = self.field.sample(x, axis.row(motif_index));

            steps.push(MotifStep {
                raw_pitch,
                velocity: velocity.motif(rng, strength, level),
                duration,
            });

            budget.consume(duration)?;
            if budget.remaining() == budget.measure_ticks() {
                break;
            }
        }

        debug!(motif_index, steps = steps.len(), "generated motif");
        Ok(Motif { steps })
    }

    /// Generate motifs `0..count`, in order.
    pub fn generate_all(&self, numerator: u32, count: usize, rng: &mut SongRng) -> Result<Vec<Motif>> {
        (0..count)
            .map(|i| self.generate(numerator, i, rng))
            .collect()
    }
}
