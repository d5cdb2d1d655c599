// Composition entry point.
//
// `compose` turns a `CompositionRequest` (a style name plus optional
// overrides) into a `Composition`: every requested instrument's track of
// timed note events, ordered and ready to encode. The pipeline is
//
//   resolve parameters (style.rs) -> pick progression (progression.rs)
//   -> draw swing (drums.rs) -> one generator per instrument (generate.rs)
//   -> order each track (schedule.rs)
//
// All randomness comes from the caller's `LofiRng`, drawn in that fixed
// order, so one seed and one request always give the same composition. The
// swing fraction is drawn even when percussion is off so that toggling drums
// does not reshuffle the pitched tracks.

use crate::config::EngineConfig;
use crate::drums::draw_swing;
use crate::error::ComposeError;
use crate::event::{Instrument, Tick, Track};
use crate::generate::{generate_track, GenContext, BEATS_PER_MEASURE};
use crate::progression::{select_progression, Progression};
use crate::schedule::{encode, sort_events, DeltaEvent};
use crate::style::{resolve, Overrides, Style};
use crate::theory::{pitch_class_name, Key};
use lofi_crafter_prng::LofiRng;
use serde::{Deserialize, Serialize};

pub const MIN_BPM: u16 = 20;
pub const MAX_BPM: u16 = 300;
/// Keeps every tick (and every MIDI delta) well inside range.
pub const MAX_MEASURES: u32 = 4096;
/// Largest resolution a metrical MIDI header can carry.
pub const MAX_TICKS_PER_BEAT: u16 = 0x7fff;

/// What to compose. Anything left unset is filled from the style preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositionRequest {
    /// Style name; unknown names fall back to chillhop.
    pub style: String,
    #[serde(default)]
    pub overrides: Overrides,
}

impl CompositionRequest {
    pub fn new(style: impl Into<String>) -> Self {
        CompositionRequest {
            style: style.into(),
            overrides: Overrides::default(),
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.overrides.key = Some(key.into());
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.overrides.mode = Some(mode.into());
        self
    }

    pub fn bpm(mut self, bpm: u16) -> Self {
        self.overrides.bpm = Some(bpm);
        self
    }

    pub fn measures(mut self, measures: u32) -> Self {
        self.overrides.measures = Some(measures);
        self
    }

    pub fn percussion(mut self, include: bool) -> Self {
        self.overrides.include_percussion = Some(include);
        self
    }

    pub fn instruments(mut self, instruments: Vec<Instrument>) -> Self {
        self.overrides.instruments = Some(instruments);
        self
    }
}

/// A finished piece: shared timing plus one track per instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub style: Style,
    pub key: Key,
    pub bpm: u16,
    pub ticks_per_beat: u16,
    pub measures: u32,
    pub progression: Progression,
    pub swing_fraction: f64,
    /// Pitched tracks in request order, then percussion if enabled. Each
    /// track's events are already in schedule order.
    pub tracks: Vec<Track>,
}

impl Composition {
    pub fn ticks_per_measure(&self) -> Tick {
        self.ticks_per_beat as Tick * BEATS_PER_MEASURE
    }

    pub fn total_ticks(&self) -> Tick {
        self.measures * self.ticks_per_measure()
    }

    pub fn track(&self, instrument: Instrument) -> Option<&Track> {
        self.tracks.iter().find(|t| t.instrument == instrument)
    }

    pub fn has_percussion(&self) -> bool {
        self.tracks.iter().any(|t| t.instrument.is_percussion())
    }

    /// Delta-encoded events for every track, in track order.
    pub fn encoded_tracks(&self) -> Vec<Vec<DeltaEvent>> {
        self.tracks.iter().map(|t| encode(&t.events)).collect()
    }

    /// `lofi_<style>_<key><mode initial>_<bpm>bpm.mid`
    pub fn file_name(&self) -> String {
        let mode_initial = self.key.mode.name().chars().next().unwrap_or('m');
        format!(
            "lofi_{}_{}{}_{}bpm.mid",
            self.style.name(),
            pitch_class_name(self.key.root),
            mode_initial,
            self.bpm
        )
    }
}

/// Compose with the built-in style catalog at 480 ticks per beat.
pub fn compose(request: &CompositionRequest, rng: &mut LofiRng) -> Result<Composition, ComposeError> {
    compose_with(&EngineConfig::default(), request, rng)
}

pub fn compose_with(
    config: &EngineConfig,
    request: &CompositionRequest,
    rng: &mut LofiRng,
) -> Result<Composition, ComposeError> {
    let tpb = config.ticks_per_beat;
    if tpb == 0 || tpb > MAX_TICKS_PER_BEAT {
        return Err(ComposeError::InvalidResolution);
    }

    let style = Style::from_name_or_default(&request.style);
    let preset = config.preset(style);
    let params = resolve(style, &preset, &request.overrides, rng);

    if !(MIN_BPM..=MAX_BPM).contains(&params.bpm) {
        return Err(ComposeError::InvalidTempo { bpm: params.bpm });
    }
    if params.measures > MAX_MEASURES {
        return Err(ComposeError::TooManyMeasures {
            measures: params.measures,
            max: MAX_MEASURES,
        });
    }

    let progression = select_progression(params.key.mode, params.harmonic_character, rng);
    let swing_fraction = draw_swing(params.groove.drums.swing_range, rng);

    log::info!(
        "Composing {} in {} at {} BPM, {} measures, progression {}, swing {:.3}",
        style.name(),
        params.key.describe(),
        params.bpm,
        params.measures,
        progression.describe(),
        swing_fraction
    );

    let ctx = GenContext {
        key: params.key,
        progression: &progression,
        measures: params.measures,
        ticks_per_beat: tpb as Tick,
        groove: &params.groove,
        swing_fraction,
    };

    let mut roles = params.instruments.clone();
    if params.include_percussion {
        roles.push(Instrument::Drums);
    }

    let tracks = roles
        .into_iter()
        .map(|instrument| {
            let mut track = generate_track(instrument, &ctx, rng);
            sort_events(&mut track.events);
            track
        })
        .collect();

    Ok(Composition {
        style,
        key: params.key,
        bpm: params.bpm,
        ticks_per_beat: tpb,
        measures: params.measures,
        progression,
        swing_fraction,
        tracks,
    })
}
