// Track construction: the melody and rhythm strategies.
//
// Both strategies run inside a `TrackContext`, which carries everything
// that changes while a track grows: the measure budget, the elapsed-tick
// accumulator, the rest tracker, and the track's own uniform generator.
// The noise field is shared read-only.
//
// - Melody: one event per iteration. Pitch value and slope come from
//   `(elapsed_beats * 2, 1)`, the duration from the same coordinate through
//   the `DurationSelector`, the base velocity from row 2.
// - Rhythm: generate the motifs once, then replay their steps in a cycle,
//   quantizing each raw pitch as it is emitted.
//
// Both stop as soon as the elapsed time reaches the target length, and both
// treat `max_events` as a hard bound on iterations.

use crate::config::{MusicalFrame, PartParams};
use crate::duration::{Duration, DurationSelector, MeasureBudget, TICKS_PER_BEAT};
use crate::error::{ComposeError, Result};
use crate::motif::MeasureMotifGenerator;
use crate::noise::NoiseField;
use crate::quantize::ScaleQuantizer;
use crate::song::{NoteEvent, Track};
use crate::velocity::VelocityModel;
use loomsong_prng::SongRng;
use tracing::{debug, trace};

/// Noise row for melody pitch and accent slope.
pub const MELODY_PITCH_ROW: f64 = 1.0;
/// Noise row for melody base velocity.
pub const MELODY_VELOCITY_ROW: f64 = 2.0;

/// Mutable state for building one track.
pub struct TrackContext<'a> {
    field: &'a NoiseField,
    frame: &'a MusicalFrame,
    rng: SongRng,
    tempo_bpm: f64,
    target_seconds: f64,
    max_events: usize,
    budget: MeasureBudget,
    elapsed_ticks: u64,
    velocity: VelocityModel,
}

impl<'a> TrackContext<'a> {
    pub fn new(
        field: &'a NoiseField,
        frame: &'a MusicalFrame,
        rng: SongRng,
        tempo_bpm: f64,
        target_seconds: f64,
        max_events: usize,
    ) -> Self {
        TrackContext {
            field,
            frame,
            rng,
            tempo_bpm,
            target_seconds,
            max_events,
            budget: MeasureBudget::new(frame.time_signature.numerator),
            elapsed_ticks: 0,
            velocity: VelocityModel::new(),
        }
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn elapsed_beats(&self) -> f64 {
        self.elapsed_ticks as f64 / TICKS_PER_BEAT as f64
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.frame
            .time_signature
            .ticks_to_seconds(self.elapsed_ticks, self.tempo_bpm)
    }

    fn reached_target(&self) -> bool {
        self.elapsed_seconds() >= self.target_seconds
    }

    fn check_bound(&self, track: &Track) -> Result<()> {
        if track.events().len() >= self.max_events {
            return Err(ComposeError::InvariantViolation(format!(
                "track '{}' hit the {}-event bound at {:.2}s of {:.2}s",
                track.name,
                self.max_events,
                self.elapsed_seconds(),
                self.target_seconds
            )));
        }
        Ok(())
    }

    /// Append an event at the current position and advance.
    fn append(&mut self, track: &mut Track, pitch: u8, velocity: u8, duration: Duration) -> Result<()> {
        self.budget.consume(duration)?;
        let event = NoteEvent {
            pitch,
            velocity,
            duration,
            start_tick: self.elapsed_ticks,
        };
        trace!(track = %track.name, ?event, "append");
        track.push(event);
        self.elapsed_ticks += duration.ticks() as u64;
        Ok(())
    }
}

/// How a track's events are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStrategy {
    /// Continuous per-event generation.
    Melody,
    /// A cycle of `motif_count` pre-generated one-measure motifs.
    Rhythm { motif_count: usize },
}

impl TrackStrategy {
    /// Build a track into `shell` (name and metadata already set).
    pub fn build(self, ctx: &mut TrackContext<'_>, part: &PartParams, shell: Track) -> Result<Track> {
        let track = match self {
            TrackStrategy::Melody => build_melody(ctx, part, shell)?,
            TrackStrategy::Rhythm { motif_count } => build_rhythm(ctx, part, motif_count, shell)?,
        };
        debug!(
            track = %track.name,
            events = track.events().len(),
            seconds = ctx.elapsed_seconds(),
            "built track"
        );
        Ok(track)
    }
}

fn build_melody(ctx: &mut TrackContext<'_>, part: &PartParams, mut track: Track) -> Result<Track> {
    let field = ctx.field;
    let frame = ctx.frame;
    let selector = DurationSelector::new(field);
    let quantizer = ScaleQuantizer::new(&frame.scale, frame.key);

    while !ctx.reached_target() {
        ctx.check_bound(&track)?;
        let time = ctx.elapsed_beats();
        let x = time * 2.0;

        let (value, slope) = field.sample_with_slope(x, MELODY_PITCH_ROW);
        let duration = selector.select(&part.durations, ctx.budget.remaining(), time)?;
        let level = field.sample(x, MELODY_VELOCITY_ROW);
        let velocity = ctx.velocity.stream(&mut ctx.rng, level, slope);

        let raw_pitch = part.center_pitch + (value * part.pitch_span as f64).round() as i32;
        let pitch = quantizer.quantize(raw_pitch, &mut ctx.rng);

        ctx.append(&mut track, pitch, velocity, duration)?;
    }
    Ok(track)
}

fn build_rhythm(
    ctx: &mut TrackContext<'_>,
    part: &PartParams,
    motif_count: usize,
    mut track: Track,
) -> Result<Track> {
    let frame = ctx.frame;
    let motifs = MeasureMotifGenerator::new(ctx.field, part).generate_all(
        frame.time_signature.numerator,
        motif_count,
        &mut ctx.rng,
    )?;
    let steps: Vec<_> = motifs.iter().flat_map(|m| m.steps.iter().copied()).collect();
    let quantizer = ScaleQuantizer::new(&frame.scale, frame.key);

    for step in steps.iter().cycle() {
        if ctx.reached_target() {
            break;
        }
        ctx.check_bound(&track)?;
        let pitch = quantizer.quantize(step.raw_pitch, &mut ctx.rng);
        ctx.append(&mut track, pitch, step.velocity, step.duration)?;
    }

    if !ctx.reached_target() {
        return Err(ComposeError::InvariantViolation(format!(
            "track '{}' has no motif steps to cycle",
            track.name
        )));
    }
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompositionParams;
    use crate::song::TimeSignature;

    fn frame() -> MusicalFrame {
        CompositionParams::f_sharp_pentatonic().validate().unwrap()
    }

    fn shell(name: &str, ts: TimeSignature) -> Track {
        Track::new(name, 0, 0, 120.0, ts)
    }

    #[test]
    fn test_melody_reaches_target_without_overshooting() {
        let frame = frame();
        let field = NoiseField::new(62);
        let mut ctx = TrackContext::new(&field, &frame, SongRng::new(1), 120.0, 20.0, 10_000);
        let track = TrackStrategy::Melody
            .build(&mut ctx, &PartParams::melody(), shell("Melody", frame.time_signature))
            .unwrap();
        let seconds = track.elapsed_seconds();
        // A whole note at 120 bpm in 4/4 lasts two seconds.
        assert!(seconds >= 20.0 && seconds < 22.0, "{seconds}");
        assert_eq!(track.end_tick(), ctx.elapsed_ticks());
    }

    #[test]
    fn test_events_are_contiguous_and_within_measures() {
        let frame = frame();
        let field = NoiseField::new(7);
        let mut ctx = TrackContext::new(&field, &frame, SongRng::new(2), 120.0, 30.0, 10_000);
        let track = TrackStrategy::Melody
            .build(&mut ctx, &PartParams::melody(), shell("Melody", frame.time_signature))
            .unwrap();
        let measure = frame.time_signature.measure_ticks() as u64;
        let mut expected_start = 0;
        for event in track.events() {
            assert_eq!(event.start_tick, expected_start);
            // No event crosses a bar line.
            assert_eq!(event.start_tick / measure, (event.end_tick() - 1) / measure);
            expected_start = event.end_tick();
        }
    }

    #[test]
    fn test_rhythm_cycles_motifs() {
        let frame = frame();
        let field = NoiseField::new(62);
        let part = PartParams::rhythm();
        let mut ctx = TrackContext::new(&field, &frame, SongRng::new(3), 120.0, 20.0, 10_000);
        let track = TrackStrategy::Rhythm { motif_count: 2 }
            .build(&mut ctx, &part, shell("Rhythm", frame.time_signature))
            .unwrap();
        assert!(track.elapsed_seconds() >= 20.0);

        // Velocities and durations repeat with the two-measure period; pitches
        // may differ only where a quantizer tie was broken differently.
        let measure = frame.time_signature.measure_ticks() as u64;
        let period = 2 * measure;
        let events = track.events();
        for event in events {
            if let Some(later) = events.iter().find(|e| e.start_tick == event.start_tick + period) {
                assert_eq!(later.duration, event.duration);
                assert_eq!(later.velocity, event.velocity);
            }
        }
    }

    #[test]
    fn test_event_bound_is_invariant_violation() {
        let frame = frame();
        let field = NoiseField::new(62);
        let mut ctx = TrackContext::new(&field, &frame, SongRng::new(1), 120.0, 20.0, 5);
        let result = TrackStrategy::Melody.build(
            &mut ctx,
            &PartParams::melody(),
            shell("Melody", frame.time_signature),
        );
        assert!(matches!(result, Err(ComposeError::InvariantViolation(_))));
    }
}
