// Event ordering and delta-time encoding.
//
// Ordering rule, per track: ascending tick; at equal ticks every `On` comes
// before every `Off`; otherwise insertion order is kept. `sort_by_key` is a
// stable sort, so keying on `(tick, kind)` gives exactly that.
//
// Encoding replaces each absolute tick with the distance from the previous
// event in the same track. The first event's delta is its own tick (the
// origin is zero). Decoding is a running sum, so
// `decode(&encode(events)) == schedule(events)`.

use crate::event::{EventKind, NoteEvent, Tick};
use serde::{Deserialize, Serialize};

/// A note event whose time is relative to the previous event in its track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEvent {
    pub delta: Tick,
    pub kind: EventKind,
    pub pitch: u8,
    pub velocity: u8,
}

/// Stable time ordering with on-before-off at equal ticks.
pub fn schedule(events: &[NoteEvent]) -> Vec<NoteEvent> {
    let mut ordered = events.to_vec();
    sort_events(&mut ordered);
    ordered
}

/// In-place form of `schedule`.
pub fn sort_events(events: &mut [NoteEvent]) {
    events.sort_by_key(|e| (e.tick, e.kind));
}

/// Order the events, then rewrite ticks as deltas.
pub fn encode(events: &[NoteEvent]) -> Vec<DeltaEvent> {
    let mut last_tick: Tick = 0;
    schedule(events)
        .into_iter()
        .map(|e| {
            let delta = e.tick - last_tick;
            last_tick = e.tick;
            DeltaEvent {
                delta,
                kind: e.kind,
                pitch: e.pitch,
                velocity: e.velocity,
            }
        })
        .collect()
}

/// Rebuild absolute ticks from deltas.
pub fn decode(deltas: &[DeltaEvent]) -> Vec<NoteEvent> {
    let mut tick: Tick = 0;
    deltas
        .iter()
        .map(|d| {
            tick += d.delta;
            NoteEvent {
                tick,
                kind: d.kind,
                pitch: d.pitch,
                velocity: d.velocity,
            }
        })
        .collect()
}
