// Note events, instruments and tracks.
//
// Generators emit absolute-tick `NoteEvent`s in pairs (one `On`, one `Off`)
// through `Track::push_note`, which enforces that a note's off tick is
// strictly after its on tick. Tracks are not ordered while being built;
// schedule.rs sorts them when the composition is assembled and produces the
// delta-encoded form for serialization.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::theory::clamp_pitch;

/// Smallest unit of time in the event timeline.
pub type Tick = u32;

/// Whether an event starts or stops a note. `On` sorts before `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    On,
    Off,
}

/// A single note-on or note-off at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub tick: Tick,
    pub kind: EventKind,
    /// MIDI key number (0-127).
    pub pitch: u8,
    /// MIDI velocity. Always 0 for `Off`.
    pub velocity: u8,
}

/// Instrument roles. Each maps to a General MIDI program and a fixed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// Felt piano comping the chords.
    Piano,
    Bass,
    /// Sustained atmospheric pad.
    Pad,
    /// Lead line drawn from chord tones.
    Melody,
    /// Ornament: plucked pentatonic runs.
    Koto,
    /// Ornament: chord root plus a major third.
    Accordion,
    /// Ornament: long breathy notes every other bar.
    Shakuhachi,
    /// Percussion kit.
    Drums,
}

impl Instrument {
    pub const ALL: [Instrument; 8] = [
        Instrument::Piano,
        Instrument::Bass,
        Instrument::Pad,
        Instrument::Melody,
        Instrument::Koto,
        Instrument::Accordion,
        Instrument::Shakuhachi,
        Instrument::Drums,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Instrument::Piano => "piano",
            Instrument::Bass => "bass",
            Instrument::Pad => "pad",
            Instrument::Melody => "melody",
            Instrument::Koto => "koto",
            Instrument::Accordion => "accordion",
            Instrument::Shakuhachi => "shakuhachi",
            Instrument::Drums => "drums",
        }
    }

    /// Parse an instrument name. `harmony` and `percussion` are accepted as
    /// role names for piano and drums.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "piano" | "harmony" | "keys" => Some(Instrument::Piano),
            "bass" => Some(Instrument::Bass),
            "pad" | "pads" => Some(Instrument::Pad),
            "melody" | "lead" => Some(Instrument::Melody),
            "koto" => Some(Instrument::Koto),
            "accordion" | "sanfona" => Some(Instrument::Accordion),
            "shakuhachi" | "flute" => Some(Instrument::Shakuhachi),
            "drums" | "percussion" | "kit" => Some(Instrument::Drums),
            _ => None,
        }
    }

    /// General MIDI program (0-based).
    pub fn program(self) -> u8 {
        match self {
            Instrument::Piano => 0,
            Instrument::Bass => 32,
            Instrument::Pad => 89,
            Instrument::Melody => 1,
            Instrument::Koto => 107,
            Instrument::Accordion => 21,
            Instrument::Shakuhachi => 77,
            Instrument::Drums => 0,
        }
    }

    /// MIDI channel (0-based). Drums use channel 9, the GM percussion channel.
    pub fn channel(self) -> u8 {
        match self {
            Instrument::Piano => 0,
            Instrument::Bass => 1,
            Instrument::Pad => 2,
            Instrument::Melody => 6,
            Instrument::Koto => 7,
            Instrument::Accordion => 8,
            Instrument::Drums => 9,
            Instrument::Shakuhachi => 10,
        }
    }

    /// Track title written into the MIDI file.
    pub fn track_title(self) -> &'static str {
        match self {
            Instrument::Piano => "Felt Piano",
            Instrument::Bass => "Bass",
            Instrument::Pad => "Atmospheric Pad",
            Instrument::Melody => "Melody",
            Instrument::Koto => "Koto",
            Instrument::Accordion => "Accordion",
            Instrument::Shakuhachi => "Shakuhachi",
            Instrument::Drums => "Drums",
        }
    }

    pub fn is_percussion(self) -> bool {
        self == Instrument::Drums
    }
}

/// A paired note recovered from a track's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundingNote {
    pub on: Tick,
    pub off: Tick,
    pub pitch: u8,
    pub velocity: u8,
}

/// All events for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub instrument: Instrument,
    pub program: u8,
    pub channel: u8,
    pub events: Vec<NoteEvent>,
}

impl Track {
    pub fn new(instrument: Instrument) -> Self {
        Track {
            instrument,
            program: instrument.program(),
            channel: instrument.channel(),
            events: Vec::new(),
        }
    }

    /// Append an on/off pair. The pitch is clamped to MIDI range and the off
    /// tick is pushed to at least `on + 1`.
    pub fn push_note(&mut self, on: Tick, off: Tick, pitch: i32, velocity: u8) {
        let pitch = clamp_pitch(pitch);
        let off = off.max(on.saturating_add(1));
        self.events.push(NoteEvent {
            tick: on,
            kind: EventKind::On,
            pitch,
            velocity: velocity.min(127),
        });
        self.events.push(NoteEvent {
            tick: off,
            kind: EventKind::Off,
            pitch,
            velocity: 0,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn note_count(&self) -> usize {
        self.events.iter().filter(|e| e.kind == EventKind::On).count()
    }

    /// Tick of the last event, or 0 for an empty track.
    pub fn end_tick(&self) -> Tick {
        self.events.iter().map(|e| e.tick).max().unwrap_or(0)
    }

    /// Pair ons with offs per pitch, first-in first-out, walking events in
    /// their current order. Unmatched events are ignored.
    pub fn notes(&self) -> Vec<SoundingNote> {
        let mut pending: HashMap<u8, VecDeque<(Tick, u8)>> = HashMap::new();
        let mut notes = Vec::new();
        for event in &self.events {
            match event.kind {
                EventKind::On => pending
                    .entry(event.pitch)
                    .or_default()
                    .push_back((event.tick, event.velocity)),
                EventKind::Off => {
                    if let Some((on, velocity)) =
                        pending.get_mut(&event.pitch).and_then(|q| q.pop_front())
                    {
                        notes.push(SoundingNote {
                            on,
                            off: event.tick,
                            pitch: event.pitch,
                            velocity,
                        });
                    }
                }
            }
        }
        notes
    }
}
