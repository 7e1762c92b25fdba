// Whole-pipeline properties of `compose`, checked over a spread of seeds,
// scales and time signatures.

use loomsong_music::config::PartParams;
use loomsong_music::duration::{Duration, TICKS_PER_BEAT};
use loomsong_music::motif::MeasureMotifGenerator;
use loomsong_music::noise::NoiseField;
use loomsong_music::quantize::ScaleQuantizer;
use loomsong_music::scale::{KeySignature, Scale};
use loomsong_music::{CompositionParams, Song, compose};
use loomsong_prng::SongRng;

fn variants() -> Vec<CompositionParams> {
    let mut out = Vec::new();
    let scales: [&[i32]; 3] = [&[0, 2, 5, 7, 9], &[0, 2, 3, 5, 7, 8, 10], &[60, 63, 67]];
    let times = [(4, 4), (3, 4), (6, 8), (5, 16), (1, 2)];
    for (i, scale) in scales.iter().enumerate() {
        for (j, &(n, d)) in times.iter().enumerate() {
            out.push(CompositionParams {
                seed: (i * 10 + j) as u64,
                scale: scale.to_vec(),
                key_signature: ((i + j * 5) % 12) as u8,
                time_sig_numerator: n,
                time_sig_denominator: d,
                tempo_bpm: 90.0 + 10.0 * j as f64,
                melody_length_seconds: 12.5,
                rhythm_motif_count: 1 + i,
                ..Default::default()
            });
        }
    }
    out
}

#[test]
fn compose_is_deterministic() {
    for params in variants() {
        let a = compose(&params).unwrap();
        let b = compose(&params).unwrap();
        assert_eq!(a, b, "seed {}", params.seed);
    }
}

#[test]
fn every_pitch_is_in_scale_after_removing_key() {
    for params in variants() {
        let song = compose(&params).unwrap();
        let scale = Scale::new(params.scale.clone()).unwrap();
        for track in &song.tracks {
            for event in track.events() {
                let pc = event.pitch as i32 - params.key_signature as i32;
                assert!(
                    scale.contains_pitch_class(pc),
                    "{} pitch {} not in {:?} + {}",
                    track.name,
                    event.pitch,
                    params.scale,
                    params.key_signature
                );
            }
        }
    }
}

#[test]
fn events_fill_measures_without_crossing_bar_lines() {
    for params in variants() {
        let song = compose(&params).unwrap();
        let measure = song.time_signature.measure_ticks() as u64;
        for track in &song.tracks {
            let mut expected = 0;
            for event in track.events() {
                assert_eq!(event.start_tick, expected);
                assert!(Duration::ALL.contains(&event.duration));
                assert_eq!(
                    event.start_tick / measure,
                    (event.end_tick() - 1) / measure,
                    "{} event at {} crosses a bar line",
                    track.name,
                    event.start_tick
                );
                expected = event.end_tick();
            }
        }
    }
}

#[test]
fn motifs_sum_to_one_measure() {
    let part = PartParams::rhythm();
    for seed in 0..20 {
        let field = NoiseField::new(seed);
        let generator = MeasureMotifGenerator::new(&field, &part);
        let mut rng = SongRng::new(seed);
        for numerator in [1, 2, 3, 4, 5, 7, 12] {
            for motif in generator.generate_all(numerator, 3, &mut rng).unwrap() {
                let beats: f64 = motif.steps.iter().map(|s| s.duration.beats()).sum();
                assert_eq!(motif.total_ticks(), numerator * TICKS_PER_BEAT);
                assert_eq!(beats, numerator as f64);
            }
        }
    }
}

fn longest_rest_run(song: &Song) -> usize {
    let mut longest = 0;
    for track in &song.tracks {
        let mut run = 0;
        for event in track.events() {
            if event.is_rest() {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
    }
    longest
}

#[test]
fn rest_runs_stay_short() {
    for seed in 0..30 {
        let params = CompositionParams {
            seed,
            melody_length_seconds: 60.0,
            ..Default::default()
        };
        let song = compose(&params).unwrap();
        assert!(longest_rest_run(&song) <= 15);
    }
}

#[test]
fn melody_covers_target_length() {
    for params in variants() {
        let song = compose(&params).unwrap();
        let melody = &song.tracks[0];
        let elapsed = melody.elapsed_seconds();
        let whole = song
            .time_signature
            .ticks_to_seconds(Duration::Whole.ticks() as u64, song.tempo_bpm);
        assert!(elapsed >= params.melody_length_seconds);
        assert!(
            elapsed < params.melody_length_seconds + whole,
            "{elapsed} overshoots {} by a whole note or more",
            params.melody_length_seconds
        );
        // The rhythm track stops on the same rule.
        assert!(song.tracks[1].elapsed_seconds() >= params.melody_length_seconds);
    }
}

#[test]
fn tie_break_is_fair_between_two_tones() {
    let scale = Scale::named("pentatonic").unwrap();
    let quantizer = ScaleQuantizer::new(&scale, KeySignature::new(6).unwrap());
    let trials = 10_000;
    // 44 = G#2, halfway between G (7) and A (9).
    let mut g = 0;
    for seed in 0..trials {
        let pitch = quantizer.quantize(44, &mut SongRng::new(1_000_000 + seed));
        assert!(pitch == 43 + 6 || pitch == 45 + 6);
        if pitch == 43 + 6 {
            g += 1;
        }
    }
    let share = g as f64 / trials as f64;
    assert!((0.46..0.54).contains(&share), "G chosen {:.1}%", share * 100.0);
}

#[test]
fn config_errors_are_reported_before_generation() {
    let cases = [
        CompositionParams { scale: vec![], ..Default::default() },
        CompositionParams { time_sig_numerator: 0, ..Default::default() },
        CompositionParams { melody_length_seconds: -3.0, ..Default::default() },
        CompositionParams { tempo_bpm: 0.0, ..Default::default() },
        CompositionParams { rhythm_motif_count: 0, ..Default::default() },
    ];
    for params in cases {
        let err = compose(&params).unwrap_err();
        assert!(
            matches!(err, loomsong_music::ComposeError::Configuration { .. }),
            "{err}"
        );
    }
}
