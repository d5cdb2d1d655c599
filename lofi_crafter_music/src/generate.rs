// Track generators for the pitched instruments.
//
// Every generator has the same shape: read the key, the progression and the
// groove from a `GenContext`, walk the measures, and push on/off pairs into a
// `Track`. All randomness goes through humanize.rs and the caller's
// `LofiRng`; none of it is hidden in here.
//
// - Piano: the full chord at octave 3 once per bar, onsets jittered, released
//   an eighth of a beat before the next bar line.
// - Bass: chord root at octave 2 on beat 1 and (optionally) on the
//   syncopated "and" of 2, each hit 4/5 of a beat long.
// - Pad: root plus the quality's next two intervals at octave 4, held for the
//   whole bar.
// - Melody and the ornaments (koto, accordion, shakuhachi) share
//   `sparse_line`: at each eligible eighth of the bar, sound a note with a
//   fixed probability, pitch drawn from the bar's chord. A `LinePattern`
//   carries everything that differs between them.
//
// Tick-valued groove settings (onset spreads, backbeat drag) are written
// against 480 ticks per beat and rescaled through `GenContext::scale_ticks`,
// so a piece sounds the same at any resolution.
//
// Percussion lives in drums.rs. Generators never fail: a zero measure count
// produces an empty track.

use crate::drums::percussion_track;
use crate::event::{Instrument, Tick, Track};
use crate::humanize::{jitter_time, jitter_velocity, jitter_velocity_capped, VELOCITY_CEILING};
use crate::progression::Progression;
use crate::style::GrooveFeel;
use crate::theory::Key;
use lofi_crafter_prng::LofiRng;

/// Beats per bar. The engine only writes 4/4.
pub const BEATS_PER_MEASURE: Tick = 4;

/// Resolution the tick-valued groove settings are expressed in.
pub const REFERENCE_TICKS_PER_BEAT: Tick = 480;

/// Shared, read-only inputs for every generator in one composition.
#[derive(Debug, Clone)]
pub struct GenContext<'a> {
    pub key: Key,
    pub progression: &'a Progression,
    pub measures: u32,
    pub ticks_per_beat: Tick,
    pub groove: &'a GrooveFeel,
    /// Drawn once per composition; see drums.rs.
    pub swing_fraction: f64,
}

impl GenContext<'_> {
    pub fn ticks_per_measure(&self) -> Tick {
        self.ticks_per_beat * BEATS_PER_MEASURE
    }

    pub fn measure_start(&self, measure: u32) -> Tick {
        measure * self.ticks_per_measure()
    }

    /// Tick of an eighth-note position (0..8) inside a measure.
    pub fn eighth(&self, measure: u32, eighth: u32) -> Tick {
        self.measure_start(measure) + eighth * self.ticks_per_beat / 2
    }

    /// Gap left between a held chord and the next bar line, so repeated
    /// pitches across bars re-strike cleanly.
    pub fn release_gap(&self) -> Tick {
        (self.ticks_per_beat / 8).max(1)
    }

    /// Convert a tick count written at `REFERENCE_TICKS_PER_BEAT` to this
    /// composition's resolution.
    pub fn scale_ticks(&self, reference_ticks: u32) -> Tick {
        (reference_ticks as u64 * self.ticks_per_beat as u64 / REFERENCE_TICKS_PER_BEAT as u64) as Tick
    }

    /// Earliest onset for a chord held into `measure`: one tick after the
    /// previous bar's chord releases, so a repeated pitch never starts
    /// before (or on) its own note-off.
    fn held_chord_floor(&self, measure: u32) -> Tick {
        (self.measure_start(measure) + 1).saturating_sub(self.release_gap())
    }
}

/// Build the track for one instrument.
pub fn generate_track(instrument: Instrument, ctx: &GenContext, rng: &mut LofiRng) -> Track {
    let track = match instrument {
        Instrument::Piano => harmony_track(ctx, rng),
        Instrument::Bass => bass_track(ctx, rng),
        Instrument::Pad => pad_track(ctx, rng),
        Instrument::Drums => percussion_track(ctx, rng),
        line => sparse_line(line, &LinePattern::for_instrument(line, ctx.groove), ctx, rng),
    };
    log::debug!(
        "{}: {} notes over {} measures",
        instrument.name(),
        track.note_count(),
        ctx.measures
    );
    track
}

/// Comping piano: every chord tone once per bar.
pub fn harmony_track(ctx: &GenContext, rng: &mut LofiRng) -> Track {
    let mut track = Track::new(Instrument::Piano);
    let feel = ctx.groove.harmony.chord;
    for m in 0..ctx.measures {
        let step = ctx.progression.chord_at(m);
        let start = ctx.measure_start(m);
        let off = start + ctx.ticks_per_measure() - ctx.release_gap();
        let floor = ctx.held_chord_floor(m);
        for pitch in ctx.key.chord(step.degree, step.quality, 3) {
            let on = jitter_time(start, ctx.scale_ticks(feel.time_spread), rng).max(floor);
            let velocity = jitter_velocity(feel.velocity, feel.velocity_spread, rng);
            track.push_note(on, off, pitch, velocity);
        }
    }
    track
}

/// Root-note bass on beat 1 and the syncopated "and" of beat 2.
pub fn bass_track(ctx: &GenContext, rng: &mut LofiRng) -> Track {
    let mut track = Track::new(Instrument::Bass);
    let feel = &ctx.groove.bass;
    let length = ctx.ticks_per_beat * 4 / 5;
    for m in 0..ctx.measures {
        let step = ctx.progression.chord_at(m);
        let root = ctx.key.note(step.degree, 2);
        for (i, eighth) in [0u32, 3].into_iter().enumerate() {
            if i > 0 && !rng.random_bool(feel.syncopation_chance) {
                continue;
            }
            let base = ctx.eighth(m, eighth);
            let on = jitter_time(base, ctx.scale_ticks(feel.hit.time_spread), rng);
            let velocity = jitter_velocity(feel.hit.velocity, feel.hit.velocity_spread, rng);
            track.push_note(on, base + length, root, velocity);
        }
    }
    track
}

/// Sustained three-note pad voicing.
pub fn pad_track(ctx: &GenContext, rng: &mut LofiRng) -> Track {
    let mut track = Track::new(Instrument::Pad);
    let feel = ctx.groove.harmony.pad;
    for m in 0..ctx.measures {
        let step = ctx.progression.chord_at(m);
        let root = ctx.key.note(step.degree, 4);
        let intervals = step.quality.intervals();
        let voicing = [
            root,
            root + intervals.get(1).copied().unwrap_or(4),
            root + intervals.get(2).copied().unwrap_or(7),
        ];
        let start = ctx.measure_start(m);
        let off = start + ctx.ticks_per_measure() - ctx.release_gap();
        let floor = ctx.held_chord_floor(m);
        for pitch in voicing {
            let on = jitter_time(start, ctx.scale_ticks(feel.time_spread), rng).max(floor);
            let velocity = jitter_velocity(feel.velocity, feel.velocity_spread, rng);
            track.push_note(on, off, pitch, velocity);
        }
    }
    track
}

/// How a sparse line picks its pitches from the bar's harmony.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchChoice {
    /// One random tone of the bar's chord.
    ChordTone,
    /// A scale degree 0..=span steps above the chord root, for modal runs.
    ScaleRun { span: i32 },
    /// The chord root plus a major third above it.
    ThirdDyad,
    /// Only the chord root.
    ChordRoot,
}

/// Everything that distinguishes one sparse melodic voice from another.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePattern {
    /// Eligible eighth-note positions in a bar (0..8).
    pub positions: &'static [u32],
    /// Probability that each eligible position sounds.
    pub chance: f64,
    /// Only every `measure_stride`-th bar is eligible.
    pub measure_stride: u32,
    pub octave: i32,
    pub pitch: PitchChoice,
    pub velocity: i32,
    pub velocity_spread: u32,
    pub velocity_ceiling: u8,
    /// Onset jitter (±), in ticks at `REFERENCE_TICKS_PER_BEAT`.
    pub time_spread: u32,
    /// Note length as a fraction of a beat, (numerator, denominator).
    pub length: (u32, u32),
}

impl LinePattern {
    /// The lead melody: chord tones an octave above the pad.
    pub fn melody(groove: &GrooveFeel) -> Self {
        let feel = &groove.melody;
        LinePattern {
            positions: &[1, 4, 7],
            chance: feel.note_chance,
            measure_stride: 1,
            octave: 5,
            pitch: PitchChoice::ChordTone,
            velocity: feel.hit.velocity,
            velocity_spread: feel.hit.velocity_spread,
            velocity_ceiling: VELOCITY_CEILING,
            time_spread: feel.hit.time_spread,
            length: (9, 10),
        }
    }

    pub fn koto(groove: &GrooveFeel) -> Self {
        LinePattern {
            positions: &[0, 1, 4, 5],
            chance: 0.7 * groove.melody.ornament_density,
            measure_stride: 1,
            octave: 5,
            pitch: PitchChoice::ScaleRun { span: 4 },
            velocity: 60,
            velocity_spread: 8,
            velocity_ceiling: 72,
            time_spread: 10,
            length: (1, 4),
        }
    }

    pub fn accordion(groove: &GrooveFeel) -> Self {
        LinePattern {
            positions: &[1, 2, 5, 6],
            chance: 0.6 * groove.melody.ornament_density,
            measure_stride: 1,
            octave: 5,
            pitch: PitchChoice::ThirdDyad,
            velocity: 55,
            velocity_spread: 8,
            velocity_ceiling: 68,
            time_spread: 12,
            length: (2, 5),
        }
    }

    pub fn shakuhachi(groove: &GrooveFeel) -> Self {
        LinePattern {
            positions: &[4],
            chance: 0.5 * groove.melody.ornament_density,
            measure_stride: 2,
            octave: 6,
            pitch: PitchChoice::ChordRoot,
            velocity: 45,
            velocity_spread: 6,
            velocity_ceiling: 60,
            time_spread: 20,
            length: (2, 1),
        }
    }

    /// Pattern for a line instrument. Non-line instruments get the melody
    /// pattern.
    pub fn for_instrument(instrument: Instrument, groove: &GrooveFeel) -> Self {
        match instrument {
            Instrument::Koto => Self::koto(groove),
            Instrument::Accordion => Self::accordion(groove),
            Instrument::Shakuhachi => Self::shakuhachi(groove),
            _ => Self::melody(groove),
        }
    }
}

/// Probabilistic line over the progression.
pub fn sparse_line(
    instrument: Instrument,
    pattern: &LinePattern,
    ctx: &GenContext,
    rng: &mut LofiRng,
) -> Track {
    let mut track = Track::new(instrument);
    let (num, den) = pattern.length;
    let length = (ctx.ticks_per_beat * num / den.max(1)).max(1);
    let stride = pattern.measure_stride.max(1) as usize;

    for m in (0..ctx.measures).step_by(stride) {
        let step = ctx.progression.chord_at(m);
        for &eighth in pattern.positions {
            if !rng.random_bool(pattern.chance) {
                continue;
            }
            let pitches = match pattern.pitch {
                PitchChoice::ChordTone => {
                    let chord = ctx.key.chord(step.degree, step.quality, pattern.octave);
                    rng.choose(&chord).copied().into_iter().collect::<Vec<_>>()
                }
                PitchChoice::ScaleRun { span } => {
                    let offset = rng.range_i64_inclusive(0, span.max(0) as i64) as i32;
                    vec![ctx.key.note(step.degree + offset, pattern.octave)]
                }
                PitchChoice::ThirdDyad => {
                    let root = ctx.key.note(step.degree, pattern.octave);
                    vec![root, root + 4]
                }
                PitchChoice::ChordRoot => vec![ctx.key.note(step.degree, pattern.octave)],
            };
            let base = ctx.eighth(m, eighth);
            let on = jitter_time(base, ctx.scale_ticks(pattern.time_spread), rng);
            let velocity = jitter_velocity_capped(
                pattern.velocity,
                pattern.velocity_spread,
                pattern.velocity_ceiling,
                rng,
            );
            for pitch in pitches {
                track.push_note(on, base + length, pitch, velocity);
            }
        }
    }
    track
}
