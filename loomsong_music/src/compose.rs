// Top-level composition: parameters in, song out.
//
// `compose` validates the parameters, splits the seed into two sub-seeds
// (stream 0 seeds the noise field, stream 1 the uniform generators), and
// builds the melody and rhythm tracks. Each track gets its own uniform
// generator, derived from the uniform sub-seed (stream 0 for the melody,
// stream 1 for the rhythm), so the two tracks share nothing mutable and are
// built in parallel with `rayon::join` without affecting the result.
//
// Nothing is cached between calls: the same parameters always give the same
// song.

use crate::config::CompositionParams;
use crate::error::Result;
use crate::noise::NoiseField;
use crate::song::{Song, Track};
use crate::track::{TrackContext, TrackStrategy};
use loomsong_prng::{SongRng, derive_seed};
use tracing::info;

/// Sub-seed streams of the composition seed.
pub const NOISE_STREAM: u64 = 0;
pub const UNIFORM_STREAM: u64 = 1;

/// Per-track streams of the uniform sub-seed.
pub const MELODY_STREAM: u64 = 0;
pub const RHYTHM_STREAM: u64 = 1;

pub const MELODY_CHANNEL: u8 = 0;
pub const RHYTHM_CHANNEL: u8 = 1;

/// Generate a song from `params`.
///
/// Fails with a configuration error before any generation if a parameter is
/// invalid, or with an invariant violation if a track can't be completed.
pub fn compose(params: &CompositionParams) -> Result<Song> {
    let frame = params.validate()?;
    let field = NoiseField::new(derive_seed(params.seed, NOISE_STREAM));
    let uniform_seed = derive_seed(params.seed, UNIFORM_STREAM);
    let time_signature = frame.time_signature;

    info!(
        seed = params.seed,
        tempo_bpm = params.tempo_bpm,
        key = frame.key.name(),
        time = %format!("{}/{}", time_signature.numerator, time_signature.denominator),
        seconds = params.melody_length_seconds,
        "composing"
    );

    let context = |stream: u64| {
        TrackContext::new(
            &field,
            &frame,
            SongRng::from_stream(uniform_seed, stream),
            params.tempo_bpm,
            params.melody_length_seconds,
            params.max_events,
        )
    };

    let (melody, rhythm) = rayon::join(
        || {
            let shell = Track::new(
                "Melody",
                params.melody.instrument,
                MELODY_CHANNEL,
                params.tempo_bpm,
                time_signature,
            );
            TrackStrategy::Melody.build(&mut context(MELODY_STREAM), &params.melody, shell)
        },
        || {
            let shell = Track::new(
                "Rhythm",
                params.rhythm.instrument,
                RHYTHM_CHANNEL,
                params.tempo_bpm,
                time_signature,
            );
            TrackStrategy::Rhythm {
                motif_count: params.rhythm_motif_count,
            }
            .build(&mut context(RHYTHM_STREAM), &params.rhythm, shell)
        },
    );

    let song = Song {
        tempo_bpm: params.tempo_bpm,
        time_signature,
        tracks: vec![melody?, rhythm?],
    };

    let stats = song.stats();
    info!(
        events = stats.total_events,
        rests = stats.rests,
        measures = stats.measures,
        "composition finished"
    );
    Ok(song)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComposeError;

    #[test]
    fn test_compose_two_tracks_with_metadata() {
        let params = CompositionParams::f_sharp_pentatonic();
        let song = compose(&params).unwrap();
        assert_eq!(song.tracks.len(), 2);
        let melody = &song.tracks[0];
        let rhythm = &song.tracks[1];
        assert_eq!(melody.name, "Melody");
        assert_eq!(melody.instrument, 12);
        assert_eq!(melody.channel, MELODY_CHANNEL);
        assert_eq!(rhythm.instrument, 33);
        assert_eq!(rhythm.channel, RHYTHM_CHANNEL);
        for track in &song.tracks {
            assert_eq!(track.tempo_bpm, 120.0);
            assert_eq!(track.time_signature, song.time_signature);
            assert!(!track.events().is_empty());
        }
    }

    #[test]
    fn test_seed_changes_output() {
        let a = compose(&CompositionParams { seed: 1, ..Default::default() }).unwrap();
        let b = compose(&CompositionParams { seed: 2, ..Default::default() }).unwrap();
        assert_ne!(a.tracks[0].events(), b.tracks[0].events());
    }

    #[test]
    fn test_invalid_params_fail_before_generation() {
        let params = CompositionParams {
            scale: vec![],
            ..Default::default()
        };
        assert!(matches!(
            compose(&params),
            Err(ComposeError::Configuration { param: "scale", .. })
        ));
    }
}
