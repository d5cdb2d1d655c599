// Style presets and parameter resolution.
//
// A `StylePreset` holds everything that makes one lofi flavour differ from
// another: tempo range, preferred keys, mode, length, instrument set and a
// `GrooveFeel` of humanization spreads and note probabilities. Presets are
// plain data built by named constructors (`StylePreset::chillhop()` etc.) and
// can be replaced from a JSON config file (see config.rs).
//
// `resolve` fills every parameter the caller left unset:
// - key: uniform pick from the preset's key preferences. A preference ending
//   in a minor marker ("Am") selects the minor mode; otherwise the preset's
//   mode is used. An explicit mode override wins over both.
// - tempo: uniform integer in the preset's inclusive BPM range.
// - measures, percussion flag, instruments: taken from the preset verbatim.
//
// Random draws happen in a fixed order (key, then tempo) so a seed always
// resolves to the same parameters.

use crate::event::Instrument;
use crate::progression::HarmonicCharacter;
use crate::theory::{Key, KeyName, ScaleMode};
use lofi_crafter_prng::LofiRng;
use serde::{Deserialize, Serialize};

/// Named lofi flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Chillhop,
    Jazzhop,
    Sleep,
    Ambient,
    Sad,
    Nostalgic,
    Oriental,
    Nordeste,
    EnergeticSwing,
}

impl Style {
    pub const ALL: [Style; 9] = [
        Style::Chillhop,
        Style::Jazzhop,
        Style::Sleep,
        Style::Ambient,
        Style::Sad,
        Style::Nostalgic,
        Style::Oriental,
        Style::Nordeste,
        Style::EnergeticSwing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Style::Chillhop => "chillhop",
            Style::Jazzhop => "jazzhop",
            Style::Sleep => "sleep",
            Style::Ambient => "ambient",
            Style::Sad => "sad",
            Style::Nostalgic => "nostalgic",
            Style::Oriental => "oriental",
            Style::Nordeste => "nordeste",
            Style::EnergeticSwing => "energetic_swing",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "chillhop" | "chill" => Some(Style::Chillhop),
            "jazzhop" | "jazz" => Some(Style::Jazzhop),
            "sleep" | "sleepy" => Some(Style::Sleep),
            "ambient" => Some(Style::Ambient),
            "sad" => Some(Style::Sad),
            "nostalgic" => Some(Style::Nostalgic),
            "oriental" => Some(Style::Oriental),
            "nordeste" => Some(Style::Nordeste),
            "energetic_swing" | "swing" => Some(Style::EnergeticSwing),
            _ => None,
        }
    }

    /// `from_name` with the chillhop fallback.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            log::warn!("Unknown style '{name}', using chillhop");
            Style::Chillhop
        })
    }
}

/// Base velocity, velocity spread and onset spread for one kind of hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub velocity: i32,
    pub velocity_spread: u32,
    /// Onset jitter (±), in ticks at 480 per beat; rescaled to the
    /// composition's resolution.
    pub time_spread: u32,
}

impl Hit {
    pub const fn new(velocity: i32, velocity_spread: u32, time_spread: u32) -> Self {
        Hit {
            velocity,
            velocity_spread,
            time_spread,
        }
    }
}

/// Chords: the comping piano and the sustained pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonyFeel {
    pub chord: Hit,
    pub pad: Hit,
}

impl Default for HarmonyFeel {
    fn default() -> Self {
        HarmonyFeel {
            chord: Hit::new(45, 10, 40),
            pad: Hit::new(35, 4, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BassFeel {
    pub hit: Hit,
    /// Probability of the second, syncopated root hit in each bar.
    pub syncopation_chance: f64,
}

impl Default for BassFeel {
    fn default() -> Self {
        BassFeel {
            hit: Hit::new(70, 10, 20),
            syncopation_chance: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodyFeel {
    pub hit: Hit,
    /// Probability that each eligible subdivision sounds.
    pub note_chance: f64,
    /// Multiplier on every ornamental voice's note probability.
    pub ornament_density: f64,
}

impl Default for MelodyFeel {
    fn default() -> Self {
        MelodyFeel {
            hit: Hit::new(75, 10, 15),
            note_chance: 0.6,
            ornament_density: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrumFeel {
    pub kick: Hit,
    /// Probability of dropping the syncopated kick on the "and" of 3.
    pub kick_skip_chance: f64,
    pub backbeat: Hit,
    /// The backbeat always lands late by this many ticks at 480 per beat
    /// (inclusive range).
    pub backbeat_drag: (u32, u32),
    pub ghost: Hit,
    /// Probability of a ghost snare half a beat after each backbeat.
    pub ghost_chance: f64,
    pub hat: Hit,
    pub offbeat_hat: Hit,
    /// Probability of opening the hat on the bar's last off-beat.
    pub open_hat_chance: f64,
    /// Range the composition's swing fraction is drawn from. 0.5 is straight.
    pub swing_range: (f64, f64),
}

impl Default for DrumFeel {
    fn default() -> Self {
        DrumFeel {
            kick: Hit::new(85, 10, 25),
            kick_skip_chance: 0.4,
            backbeat: Hit::new(75, 15, 0),
            backbeat_drag: (15, 45),
            ghost: Hit::new(25, 5, 0),
            ghost_chance: 0.3,
            hat: Hit::new(65, 12, 10),
            offbeat_hat: Hit::new(40, 10, 10),
            open_hat_chance: 0.1,
            swing_range: (0.58, 0.62),
        }
    }
}

/// All the per-style numbers the generators read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrooveFeel {
    pub harmony: HarmonyFeel,
    pub bass: BassFeel,
    pub melody: MelodyFeel,
    pub drums: DrumFeel,
}

/// Defaults for one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePreset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Inclusive tempo range in BPM.
    pub bpm_range: (u16, u16),
    /// Key names such as "Eb" or "Am".
    pub key_preferences: Vec<String>,
    pub mode: ScaleMode,
    /// Forces a progression group regardless of mode.
    #[serde(default)]
    pub harmonic_character: Option<HarmonicCharacter>,
    pub measures: u32,
    pub has_percussion: bool,
    /// Pitched instruments, in track order. Percussion is controlled by
    /// `has_percussion`.
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub groove: GrooveFeel,
}

const STANDARD_BAND: [Instrument; 4] = [
    Instrument::Piano,
    Instrument::Bass,
    Instrument::Pad,
    Instrument::Melody,
];

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl StylePreset {
    pub fn builtin(style: Style) -> Self {
        match style {
            Style::Chillhop => Self::chillhop(),
            Style::Jazzhop => Self::jazzhop(),
            Style::Sleep => Self::sleep(),
            Style::Ambient => Self::ambient(),
            Style::Sad => Self::sad(),
            Style::Nostalgic => Self::nostalgic(),
            Style::Oriental => Self::oriental(),
            Style::Nordeste => Self::nordeste(),
            Style::EnergeticSwing => Self::energetic_swing(),
        }
    }

    pub fn chillhop() -> Self {
        StylePreset {
            name: "Chillhop".into(),
            description: "Felt piano, firm bass lines and steady beats".into(),
            bpm_range: (75, 90),
            key_preferences: keys(&["C", "F", "G", "D"]),
            mode: ScaleMode::Minor,
            harmonic_character: None,
            measures: 16,
            has_percussion: true,
            instruments: STANDARD_BAND.to_vec(),
            groove: GrooveFeel::default(),
        }
    }

    pub fn jazzhop() -> Self {
        let mut groove = GrooveFeel::default();
        groove.drums.swing_range = (0.60, 0.64);
        groove.drums.ghost_chance = 0.35;
        groove.harmony.chord.time_spread = 30;
        StylePreset {
            name: "Jazzhop".into(),
            description: "Jazzy extended chords over a pronounced swing".into(),
            bpm_range: (80, 95),
            key_preferences: keys(&["Eb", "Bb", "F", "Ab"]),
            mode: ScaleMode::Dorian,
            harmonic_character: None,
            measures: 16,
            has_percussion: true,
            instruments: STANDARD_BAND.to_vec(),
            groove,
        }
    }

    pub fn sleep() -> Self {
        let mut groove = GrooveFeel::default();
        groove.harmony.chord = Hit::new(40, 8, 50);
        groove.bass.syncopation_chance = 0.3;
        groove.bass.hit = Hit::new(60, 8, 25);
        groove.melody.note_chance = 0.4;
        groove.melody.hit = Hit::new(60, 8, 20);
        groove.drums.swing_range = (0.5, 0.5);
        StylePreset {
            name: "Sleep Lofi".into(),
            description: "Slow tempo, no drums, long sustained chords".into(),
            bpm_range: (60, 70),
            key_preferences: keys(&["A", "E", "D", "G"]),
            mode: ScaleMode::Minor,
            harmonic_character: None,
            measures: 24,
            has_percussion: false,
            instruments: STANDARD_BAND.to_vec(),
            groove,
        }
    }

    pub fn ambient() -> Self {
        let mut groove = GrooveFeel::default();
        groove.harmony.pad = Hit::new(42, 4, 0);
        groove.melody.note_chance = 0.35;
        groove.melody.hit = Hit::new(55, 8, 25);
        groove.drums.swing_range = (0.5, 0.5);
        StylePreset {
            name: "Ambient Lofi".into(),
            description: "Atmospheric, built around textures and pads".into(),
            bpm_range: (60, 70),
            key_preferences: keys(&["A", "E", "D"]),
            mode: ScaleMode::Minor,
            harmonic_character: None,
            measures: 24,
            has_percussion: false,
            instruments: vec![Instrument::Pad, Instrument::Piano, Instrument::Melody],
            groove,
        }
    }

    pub fn sad() -> Self {
        let mut groove = GrooveFeel::default();
        groove.melody.hit = Hit::new(68, 10, 15);
        StylePreset {
            name: "Sad Lofi".into(),
            description: "Minor-key progressions and melancholic melodies".into(),
            bpm_range: (70, 80),
            key_preferences: keys(&["Am", "Dm", "Em", "Bm"]),
            mode: ScaleMode::Minor,
            harmonic_character: None,
            measures: 16,
            has_percussion: true,
            instruments: STANDARD_BAND.to_vec(),
            groove,
        }
    }

    pub fn nostalgic() -> Self {
        let mut groove = GrooveFeel::default();
        groove.melody.note_chance = 0.45;
        StylePreset {
            name: "Nostalgic Lofi".into(),
            description: "Sparse, emotive melodies over wistful changes".into(),
            bpm_range: (70, 80),
            key_preferences: keys(&["C", "G", "D", "A"]),
            mode: ScaleMode::Minor,
            harmonic_character: None,
            measures: 16,
            has_percussion: true,
            instruments: STANDARD_BAND.to_vec(),
            groove,
        }
    }

    pub fn oriental() -> Self {
        let mut groove = GrooveFeel::default();
        groove.drums.ghost_chance = 0.2;
        groove.drums.open_hat_chance = 0.0;
        StylePreset {
            name: "Oriental Lofi".into(),
            description: "Pentatonic koto runs and shakuhachi over minor vamps".into(),
            bpm_range: (70, 85),
            key_preferences: keys(&["A", "D", "E"]),
            mode: ScaleMode::PentatonicMinor,
            harmonic_character: Some(HarmonicCharacter::Oriental),
            measures: 16,
            has_percussion: true,
            instruments: vec![
                Instrument::Piano,
                Instrument::Bass,
                Instrument::Pad,
                Instrument::Koto,
                Instrument::Shakuhachi,
            ],
            groove,
        }
    }

    pub fn nordeste() -> Self {
        let mut groove = GrooveFeel::default();
        groove.drums.swing_range = (0.54, 0.58);
        groove.drums.kick_skip_chance = 0.2;
        StylePreset {
            name: "Nordeste Lofi".into(),
            description: "Accordion thirds over dominant lydian-flat-seven harmony".into(),
            bpm_range: (85, 100),
            key_preferences: keys(&["G", "D", "C"]),
            mode: ScaleMode::LydianFlat7,
            harmonic_character: Some(HarmonicCharacter::ModalDominant),
            measures: 16,
            has_percussion: true,
            instruments: vec![
                Instrument::Piano,
                Instrument::Bass,
                Instrument::Pad,
                Instrument::Accordion,
                Instrument::Melody,
            ],
            groove,
        }
    }

    pub fn energetic_swing() -> Self {
        let mut groove = GrooveFeel::default();
        groove.drums.swing_range = (0.62, 0.66);
        groove.drums.kick_skip_chance = 0.15;
        groove.drums.hat = Hit::new(75, 10, 8);
        groove.drums.offbeat_hat = Hit::new(52, 10, 8);
        groove.drums.open_hat_chance = 0.3;
        groove.bass.hit = Hit::new(80, 10, 15);
        groove.melody.note_chance = 0.7;
        StylePreset {
            name: "Energetic Swing".into(),
            description: "Up-tempo, heavy triplet swing and busy hats".into(),
            bpm_range: (90, 105),
            key_preferences: keys(&["F", "Bb", "C", "G"]),
            mode: ScaleMode::Dorian,
            harmonic_character: None,
            measures: 16,
            has_percussion: true,
            instruments: STANDARD_BAND.to_vec(),
            groove,
        }
    }
}

/// Caller-supplied values that take precedence over the preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub key: Option<String>,
    pub mode: Option<String>,
    pub bpm: Option<u16>,
    pub measures: Option<u32>,
    pub include_percussion: Option<bool>,
    /// Instrument set. A `Drums` entry turns percussion on unless
    /// `include_percussion` says otherwise.
    pub instruments: Option<Vec<Instrument>>,
}

/// Fully resolved parameters for one composition.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    pub style: Style,
    pub key: Key,
    pub bpm: u16,
    pub measures: u32,
    pub include_percussion: bool,
    /// Pitched instruments only; percussion is `include_percussion`.
    pub instruments: Vec<Instrument>,
    pub harmonic_character: Option<HarmonicCharacter>,
    pub groove: GrooveFeel,
}

/// Fill unset parameters from the preset.
pub fn resolve(
    style: Style,
    preset: &StylePreset,
    overrides: &Overrides,
    rng: &mut LofiRng,
) -> ResolvedParams {
    let key_text = match &overrides.key {
        Some(k) => k.clone(),
        None => rng
            .choose(&preset.key_preferences)
            .cloned()
            .unwrap_or_else(|| "A".to_string()),
    };
    let key_name = KeyName::parse_or_default(&key_text);
    let mode = match &overrides.mode {
        Some(m) => ScaleMode::from_name_or_default(m),
        None if key_name.minor => ScaleMode::Minor,
        None => preset.mode,
    };

    let bpm = match overrides.bpm {
        Some(b) => b,
        None => {
            let (a, b) = preset.bpm_range;
            let (lo, hi) = (a.min(b), a.max(b));
            rng.range_i64_inclusive(lo as i64, hi as i64) as u16
        }
    };

    let measures = overrides.measures.unwrap_or(preset.measures);

    let requested = overrides
        .instruments
        .clone()
        .unwrap_or_else(|| preset.instruments.clone());
    let drums_requested = requested.iter().any(|i| i.is_percussion());
    let mut instruments: Vec<Instrument> = Vec::with_capacity(requested.len());
    for inst in requested {
        if !inst.is_percussion() && !instruments.contains(&inst) {
            instruments.push(inst);
        }
    }
    let include_percussion = overrides
        .include_percussion
        .unwrap_or(preset.has_percussion || drums_requested);

    ResolvedParams {
        style,
        key: Key::new(key_name.pitch_class, mode),
        bpm,
        measures,
        include_percussion,
        instruments,
        harmonic_character: preset.harmonic_character,
        groove: preset.groove.clone(),
    }
}
