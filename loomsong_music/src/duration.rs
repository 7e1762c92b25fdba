// Note durations, the measure budget, and noise-driven duration selection.
//
// Durations are a closed set of tags, each carrying an exact integer number
// of ticks (4 ticks per beat), so every measure-boundary check is integer
// arithmetic. A beat is one unit of the time signature's denominator: in 6/8
// a `Quarter` lasts one eighth note of wall-clock time.
//
// The measure budget counts ticks left in the current measure and refills to
// a full measure the moment it reaches zero. Selection never picks a
// duration longer than what remains, so the budget can't go negative.

use crate::error::{ComposeError, Result};
use crate::noise::NoiseField;
use serde::{Deserialize, Serialize};

/// Ticks per beat. The shortest duration (a sixteenth) is one tick.
pub const TICKS_PER_BEAT: u32 = 4;

/// Noise row read by [`DurationSelector::select`].
pub const DURATION_ROW: f64 = 1.0;

/// A note length, from a sixteenth (0.25 beats) to a whole (4 beats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Duration {
    Sixteenth,
    Eighth,
    Quarter,
    Half,
    Whole,
}

impl Duration {
    pub const ALL: [Duration; 5] = [
        Duration::Sixteenth,
        Duration::Eighth,
        Duration::Quarter,
        Duration::Half,
        Duration::Whole,
    ];

    /// Exact length in ticks.
    pub fn ticks(self) -> u32 {
        match self {
            Duration::Sixteenth => 1,
            Duration::Eighth => 2,
            Duration::Quarter => 4,
            Duration::Half => 8,
            Duration::Whole => 16,
        }
    }

    /// Length in beats (0.25, 0.5, 1, 2 or 4). For display and timing only.
    pub fn beats(self) -> f64 {
        self.ticks() as f64 / TICKS_PER_BEAT as f64
    }

    /// Single-character symbol used by `Song::summary`.
    pub fn symbol(self) -> char {
        match self {
            Duration::Sixteenth => 's',
            Duration::Eighth => 'e',
            Duration::Quarter => 'q',
            Duration::Half => 'h',
            Duration::Whole => 'w',
        }
    }
}

/// Ticks remaining in the current measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureBudget {
    measure_ticks: u32,
    remaining: u32,
}

impl MeasureBudget {
    /// A fresh budget for a measure of `numerator` beats. The numerator is
    /// bounded by `TimeSignature::new`.
    pub fn new(numerator: u32) -> Self {
        let measure_ticks = numerator * TICKS_PER_BEAT;
        MeasureBudget {
            measure_ticks,
            remaining: measure_ticks,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn measure_ticks(&self) -> u32 {
        self.measure_ticks
    }

    /// Ticks already used in the current measure.
    pub fn offset_in_measure(&self) -> u32 {
        self.measure_ticks - self.remaining
    }

    /// Spend `duration` and refill once the measure is exhausted.
    pub fn consume(&mut self, duration: Duration) -> Result<()> {
        let ticks = duration.ticks();
        if ticks > self.remaining {
            return Err(ComposeError::InvariantViolation(format!(
                "{duration:?} ({ticks} ticks) overruns a measure with {} ticks left",
                self.remaining
            )));
        }
        self.remaining -= ticks;
        if self.remaining == 0 {
            self.remaining = self.measure_ticks;
        }
        Ok(())
    }
}

/// Check that a candidate set can never starve a measure budget.
///
/// Durations are powers of two, so the shortest candidate divides every
/// longer one; if it also divides a full measure, every reachable
/// remainder is a positive multiple of it.
pub fn check_candidates(
    param: &'static str,
    candidates: &[Duration],
    measure_ticks: u32,
) -> Result<()> {
    let Some(shortest) = candidates.iter().map(|d| d.ticks()).min() else {
        return Err(ComposeError::config(param, "duration candidate set is empty"));
    };
    if measure_ticks % shortest != 0 {
        return Err(ComposeError::config(
            param,
            format!(
                "shortest candidate ({shortest} ticks) does not divide a {measure_ticks}-tick measure"
            ),
        ));
    }
    Ok(())
}

/// Picks durations from a candidate list using the noise field.
#[derive(Debug, Clone, Copy)]
pub struct DurationSelector<'a> {
    field: &'a NoiseField,
}

impl<'a> DurationSelector<'a> {
    pub fn new(field: &'a NoiseField) -> Self {
        DurationSelector { field }
    }

    /// Select a duration for an event starting `time` beats into the track.
    /// Samples the field at `(time * 2, 1)`.
    pub fn select(&self, candidates: &[Duration], remaining: u32, time: f64) -> Result<Duration> {
        self.select_at(candidates, remaining, time * 2.0, DURATION_ROW)
    }

    /// Select a duration by sampling the field at an explicit coordinate.
    pub fn select_at(
        &self,
        candidates: &[Duration],
        remaining: u32,
        x: f64,
        y: f64,
    ) -> Result<Duration> {
        let fitting: Vec<Duration> = candidates
            .iter()
            .copied()
            .filter(|d| d.ticks() <= remaining)
            .collect();
        if fitting.is_empty() {
            return Err(ComposeError::InvariantViolation(format!(
                "no duration in {candidates:?} fits the {remaining} ticks left in the measure"
            )));
        }
        let value = self.field.sample(x, y);
        let index = (((value + 1.0) / 2.0) * fitting.len() as f64).floor() as usize;
        Ok(fitting[index.min(fitting.len() - 1)])
    }
}
