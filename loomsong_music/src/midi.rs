// MIDI output from songs.
//
// Converts a Song into a Standard MIDI File (SMF Format 1). Track 0 carries
// tempo and time signature; every song track becomes its own MIDI track with
// a name, a program change, and note-on/note-off pairs. Rests emit nothing
// but still move time forward, and the end-of-track marker sits at the end
// of the last event (rest or not), so trailing silence is kept.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::{ComposeError, Result};
use crate::song::{Song, Track};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;
use tracing::debug;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u32 = 480;

/// Largest tempo value a MIDI tempo event can hold (microseconds per quarter).
const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;

/// Convert a Song to MIDI and write it to a file.
pub fn write_midi(song: &Song, path: &Path) -> Result<()> {
    let buf = song_to_bytes(song)?;
    std::fs::write(path, &buf)?;
    debug!(path = %path.display(), bytes = buf.len(), "wrote MIDI file");
    Ok(())
}

/// Encode a Song as SMF bytes.
pub fn song_to_bytes(song: &Song) -> Result<Vec<u8>> {
    let smf = song_to_smf(song)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Convert a Song to an in-memory SMF. Track names borrow from the song.
pub fn song_to_smf(song: &Song) -> Result<Smf<'_>> {
    let ts = song.time_signature;
    let numerator = u8::try_from(ts.numerator).map_err(|_| {
        ComposeError::InvariantViolation(format!(
            "time signature numerator {} does not fit a MIDI meta event",
            ts.numerator
        ))
    })?;

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER as u16)),
    ));

    let tempo_micros = (60_000_000.0 / song.tempo_bpm).round().clamp(1.0, MAX_TEMPO_MICROS as f64) as u32;
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_micros))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
                numerator,
                ts.denominator.trailing_zeros() as u8,
                24,
                8,
            )),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    // One song tick is a quarter of a beat; a beat is a 1/denominator note.
    let midi_per_tick = (TICKS_PER_QUARTER / ts.denominator) as u64;
    for track in &song.tracks {
        smf.tracks.push(encode_track(track, midi_per_tick));
    }

    Ok(smf)
}

fn encode_track(track: &Track, midi_per_tick: u64) -> Vec<TrackEvent<'_>> {
    let channel = u4::new(track.channel);
    let mut out = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(track.name.as_bytes())),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(track.instrument),
                },
            },
        },
    ];

    let mut last_tick: u64 = 0;
    for event in track.events().iter().filter(|e| !e.is_rest()) {
        let start = event.start_tick * midi_per_tick;
        let end = event.end_tick() * midi_per_tick;
        out.push(TrackEvent {
            delta: u28::new((start - last_tick) as u32),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key: u7::new(event.pitch),
                    vel: u7::new(event.velocity),
                },
            },
        });
        out.push(TrackEvent {
            delta: u28::new((end - start) as u32),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key: u7::new(event.pitch),
                    vel: u7::new(0),
                },
            },
        });
        last_tick = end;
    }

    let track_end = track.end_tick() * midi_per_tick;
    out.push(TrackEvent {
        delta: u28::new((track_end - last_tick) as u32),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    out
}
