// Loomsong Music Generator
//
// Generates a melody and a looped bass/rhythm line from a seeded noise field.
// Nothing is pre-authored: pitch contour, note lengths and dynamics are all
// read off a deterministic 2D noise field, snapped to a scale and key, and
// packed into measures whose beat budget is never overrun.
//
// Architecture:
// - noise.rs: Seeded 2D value-noise field with forward-difference slope
// - scale.rs: Scale tone sets, named scales, key signatures
// - quantize.rs: Nearest-scale-tone snapping with uniform tie-break
// - duration.rs: Exact duration tags, measure budget, noise-driven selection
// - velocity.rs: Velocity policies and the escalating rest rule
// - motif.rs: One-measure motif generation for the rhythm track
// - track.rs: Track context and the melody/rhythm build strategies
// - compose.rs: Top-level `compose(params) -> Song`
// - song.rs: NoteEvent / Track / Song timeline, text summary
// - config.rs: JSON-loadable composition parameters and validation
// - midi.rs: Standard MIDI File output
// - error.rs: ComposeError
//
// Randomness comes from `loomsong_prng`: one composition seed is split into a
// noise-field seed and a uniform-generator seed. The generator is
// deterministic given the parameters, so output is reproducible.

pub mod compose;
pub mod config;
pub mod duration;
pub mod error;
pub mod midi;
pub mod motif;
pub mod noise;
pub mod quantize;
pub mod scale;
pub mod song;
pub mod track;
pub mod velocity;

pub use compose::compose;
pub use config::CompositionParams;
pub use error::{ComposeError, Result};
pub use song::{NoteEvent, Song, Track};
