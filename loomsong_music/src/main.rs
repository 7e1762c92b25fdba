// Loomsong Music Generator: CLI entry point.
//
// Composes a melody + rhythm song from noise and writes it to MIDI.
// Parameters start from `--config FILE` (JSON) or the defaults; flags
// override individual fields.
//
// Usage:
//   cargo run -p loomsong_music -- [output.mid] [--config FILE] [--seed N]
//     [--tempo BPM] [--scale NAME] [--key NAME] [--time N/D]
//     [--length SECONDS] [--motifs N]
//
// Scales: pentatonic, major-pentatonic, minor-pentatonic, major, minor,
//   dorian, phrygian, lydian, mixolydian, blues, whole-tone, chromatic
// Logging: RUST_LOG=loomsong_music=debug for per-track detail.

use loomsong_music::midi::write_midi;
use loomsong_music::scale::{KeySignature, Scale};
use loomsong_music::{CompositionParams, compose};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("loomsong_music=info".parse().unwrap()))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let output_path = args.get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("output.mid");

    let mut params = match parse_flag::<String>(&args, "--config") {
        Some(path) => match CompositionParams::load(Path::new(&path)) {
            Ok(p) => p,
            Err(e) => fail(&format!("Failed to load config '{}': {}", path, e)),
        },
        None => CompositionParams::default(),
    };
    apply_overrides(&mut params, &args);

    println!("=== Loomsong Music Generator ===");
    println!("Output: {}", output_path);
    println!("Seed: {}", params.seed);
    println!("Tempo: {} BPM, time {}/{}", params.tempo_bpm,
        params.time_sig_numerator, params.time_sig_denominator);
    println!("Scale: {:?}, key offset {}", params.scale, params.key_signature);
    println!("Length: {}s, {} rhythm motif(s)", params.melody_length_seconds,
        params.rhythm_motif_count);
    println!();

    let song = match compose(&params) {
        Ok(song) => song,
        Err(e) => fail(&format!("Composition failed: {}", e)),
    };

    print!("{}", song.summary());
    let stats = song.stats();
    println!();
    println!("{} events ({} sounding, {} rests) over {} measures, {:.1}s",
        stats.total_events, stats.sounding, stats.rests, stats.measures,
        song.duration_seconds());

    match write_midi(&song, Path::new(output_path)) {
        Ok(()) => println!("Wrote {}", output_path),
        Err(e) => fail(&format!("Error writing MIDI: {}", e)),
    }
}

fn apply_overrides(params: &mut CompositionParams, args: &[String]) {
    if let Some(seed) = parse_flag(args, "--seed") {
        params.seed = seed;
    }
    if let Some(tempo) = parse_flag(args, "--tempo") {
        params.tempo_bpm = tempo;
    }
    if let Some(length) = parse_flag(args, "--length") {
        params.melody_length_seconds = length;
    }
    if let Some(motifs) = parse_flag(args, "--motifs") {
        params.rhythm_motif_count = motifs;
    }
    if let Some(name) = parse_flag::<String>(args, "--scale") {
        match Scale::named(&name) {
            Some(scale) => params.scale = scale.tones().to_vec(),
            None => fail(&format!("Unknown scale '{}'", name)),
        }
    }
    if let Some(name) = parse_flag::<String>(args, "--key") {
        match KeySignature::from_name(&name) {
            Some(key) => params.key_signature = key.offset(),
            None => fail(&format!("Unknown key '{}'", name)),
        }
    }
    if let Some(time) = parse_flag::<String>(args, "--time") {
        match parse_time_signature(&time) {
            Some((n, d)) => {
                params.time_sig_numerator = n;
                params.time_sig_denominator = d;
            }
            None => fail(&format!("Bad time signature '{}', expected N/D", time)),
        }
    }
}

fn parse_time_signature(s: &str) -> Option<(u32, u32)> {
    let (n, d) = s.split_once('/')?;
    Some((n.trim().parse().ok()?, d.trim().parse().ok()?))
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
