// MIDI output from compositions.
//
// Converts a Composition into a Standard MIDI File (SMF) for rendering. Output
// is SMF Format 1: track 0 is a master clock holding the tempo, the 4/4 time
// signature and a name; every instrument track follows in composition order
// with its name, a program change, then its note events delta-encoded by
// schedule.rs. Note-offs are written as NoteOff with velocity 0.
//
// The reader exists so a written file can be checked against the composition
// it came from: it sums deltas back into absolute ticks and treats NoteOn with
// velocity 0 as a note-off, as most sequencers write them.
//
// Uses the `midly` crate for both directions.

use crate::compose::Composition;
use crate::error::ComposeError;
use crate::event::{EventKind, NoteEvent, Tick, Track as NoteTrack};
use crate::schedule::encode;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

const MASTER_TRACK_NAME: &str = "Lofi Master Clock";

/// Microseconds per quarter note for a tempo.
pub fn tempo_micros(bpm: u16) -> u32 {
    60_000_000 / bpm.max(1) as u32
}

/// Convert a Composition to MIDI and write it to a file.
pub fn write_midi(composition: &Composition, path: &Path) -> Result<(), ComposeError> {
    let buf = to_bytes(composition)?;
    std::fs::write(path, &buf)?;
    log::info!("Wrote {} ({} bytes)", path.display(), buf.len());
    Ok(())
}

/// Serialize a Composition to SMF bytes.
pub fn to_bytes(composition: &Composition) -> Result<Vec<u8>, ComposeError> {
    let smf = composition_to_smf(composition);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

fn master_track(composition: &Composition) -> Track<'static> {
    vec![
        meta(0, MetaMessage::TrackName(MASTER_TRACK_NAME.as_bytes())),
        meta(0, MetaMessage::Tempo(u24::new(tempo_micros(composition.bpm)))),
        // 4/4, 24 MIDI clocks per click, 8 thirty-seconds per quarter.
        meta(0, MetaMessage::TimeSignature(4, 2, 24, 8)),
        meta(0, MetaMessage::EndOfTrack),
    ]
}

fn instrument_track(track: &NoteTrack) -> Track<'static> {
    let channel = u4::new(track.channel);
    let mut out: Track<'static> = Vec::with_capacity(track.events.len() + 3);

    out.push(meta(0, MetaMessage::TrackName(track.instrument.track_title().as_bytes())));
    out.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(track.program),
            },
        },
    });

    for event in encode(&track.events) {
        let key = u7::new(event.pitch);
        let message = match event.kind {
            EventKind::On => MidiMessage::NoteOn {
                key,
                vel: u7::new(event.velocity),
            },
            EventKind::Off => MidiMessage::NoteOff { key, vel: u7::new(0) },
        };
        out.push(TrackEvent {
            delta: u28::new(event.delta),
            kind: TrackEventKind::Midi { channel, message },
        });
    }

    out.push(meta(0, MetaMessage::EndOfTrack));
    out
}

/// Convert a Composition to an in-memory SMF.
pub fn composition_to_smf(composition: &Composition) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(composition.ticks_per_beat)),
    ));
    smf.tracks.push(master_track(composition));
    for track in &composition.tracks {
        smf.tracks.push(instrument_track(track));
    }
    smf
}

/// One track read back from a MIDI file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTrack {
    pub name: Option<String>,
    pub channel: Option<u8>,
    pub program: Option<u8>,
    /// Note events at absolute ticks, in file order.
    pub events: Vec<NoteEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMidi {
    pub ticks_per_beat: u16,
    /// Microseconds per quarter note from the first tempo event.
    pub tempo_micros: Option<u32>,
    pub time_signature: Option<(u8, u8)>,
    pub tracks: Vec<ParsedTrack>,
}

impl ParsedMidi {
    pub fn bpm(&self) -> Option<f64> {
        self.tempo_micros.map(|t| 60_000_000.0 / t as f64)
    }
}

/// Parse SMF bytes into absolute-tick note events.
pub fn read_midi(bytes: &[u8]) -> Result<ParsedMidi, ComposeError> {
    let smf = Smf::parse(bytes)?;
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(t) => t.as_int(),
        Timing::Timecode(..) => return Err(ComposeError::InvalidResolution),
    };

    let mut tempo = None;
    let mut time_signature = None;
    let mut tracks = Vec::with_capacity(smf.tracks.len());

    for raw in &smf.tracks {
        let mut parsed = ParsedTrack {
            name: None,
            channel: None,
            program: None,
            events: Vec::new(),
        };
        let mut tick: Tick = 0;
        for event in raw {
            tick += event.delta.as_int();
            match event.kind {
                TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                    parsed.name = Some(String::from_utf8_lossy(name).into_owned());
                }
                TrackEventKind::Meta(MetaMessage::Tempo(t)) => {
                    tempo.get_or_insert(t.as_int());
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, den_pow, _, _)) => {
                    time_signature.get_or_insert((num, 1u8 << den_pow.min(7)));
                }
                TrackEventKind::Midi { channel, message } => {
                    parsed.channel.get_or_insert(channel.as_int());
                    let note = match message {
                        MidiMessage::ProgramChange { program } => {
                            parsed.program.get_or_insert(program.as_int());
                            None
                        }
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            Some((EventKind::On, key.as_int(), vel.as_int()))
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            Some((EventKind::Off, key.as_int(), 0))
                        }
                        _ => None,
                    };
                    if let Some((kind, pitch, velocity)) = note {
                        parsed.events.push(NoteEvent {
                            tick,
                            kind,
                            pitch,
                            velocity,
                        });
                    }
                }
                _ => {}
            }
        }
        tracks.push(parsed);
    }

    Ok(ParsedMidi {
        ticks_per_beat,
        tempo_micros: tempo,
        time_signature,
        tracks,
    })
}

/// Read and parse a MIDI file from disk.
pub fn read_midi_file(path: &Path) -> Result<ParsedMidi, ComposeError> {
    let bytes = std::fs::read(path)?;
    read_midi(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{compose, CompositionRequest};
    use crate::event::Instrument;
    use lofi_crafter_prng::LofiRng;

    fn piece() -> Composition {
        let request = CompositionRequest::new("jazzhop").bpm(90).measures(4);
        compose(&request, &mut LofiRng::new(21)).unwrap()
    }

    #[test]
    fn test_composition_to_smf_layout() {
        let piece = piece();
        let smf = composition_to_smf(&piece);
        // 1 master track + one per instrument.
        assert_eq!(smf.tracks.len(), piece.tracks.len() + 1);
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
        for track in &smf.tracks {
            assert_eq!(
                track.last().map(|e| e.kind),
                Some(TrackEventKind::Meta(MetaMessage::EndOfTrack))
            );
        }
    }

    #[test]
    fn test_master_track_carries_tempo_and_meter() {
        let parsed = read_midi(&to_bytes(&piece()).unwrap()).unwrap();
        assert_eq!(parsed.tempo_micros, Some(666_666));
        assert_eq!(parsed.time_signature, Some((4, 4)));
        assert_eq!(parsed.tracks[0].name.as_deref(), Some(MASTER_TRACK_NAME));
        assert!(parsed.tracks[0].events.is_empty());
    }

    #[test]
    fn test_tracks_read_back_exactly() {
        let piece = piece();
        let parsed = read_midi(&to_bytes(&piece).unwrap()).unwrap();
        assert_eq!(parsed.ticks_per_beat, piece.ticks_per_beat);
        for (track, read) in piece.tracks.iter().zip(&parsed.tracks[1..]) {
            assert_eq!(read.name.as_deref(), Some(track.instrument.track_title()));
            assert_eq!(read.program, Some(track.program));
            assert_eq!(read.channel, Some(track.channel));
            let expected: Vec<_> = track
                .events
                .iter()
                .map(|e| NoteEvent {
                    velocity: if e.kind == EventKind::Off { 0 } else { e.velocity },
                    ..*e
                })
                .collect();
            assert_eq!(read.events, expected, "{:?}", track.instrument);
        }
    }

    #[test]
    fn test_drums_on_channel_nine() {
        let parsed = read_midi(&to_bytes(&piece()).unwrap()).unwrap();
        let drums = parsed
            .tracks
            .iter()
            .find(|t| t.name.as_deref() == Some(Instrument::Drums.track_title()));
        assert_eq!(drums.and_then(|t| t.channel), Some(9));
    }

    #[test]
    fn test_write_midi_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(piece().file_name());
        write_midi(&piece(), &path).unwrap();
        let parsed = read_midi_file(&path).unwrap();
        assert_eq!(parsed.tracks.len(), piece().tracks.len() + 1);
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        assert!(matches!(read_midi(b"not a midi file"), Err(ComposeError::MidiParse(_))));
    }
}
