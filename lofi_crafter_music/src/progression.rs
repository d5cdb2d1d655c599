// Curated chord progressions, grouped by harmonic character.
//
// Every progression is four (degree, quality) steps, one per measure, cycled
// across the piece (`measure % len`). The catalog is fixed; selection is a
// deterministic grouping rule followed by a uniform draw inside the group:
//
// - pentatonic minor keys, or the oriental style → `Oriental`
// - lydian-flat7 keys, or the nordeste style → `ModalDominant`
// - everything else → `Melancholic`
//
// An explicit style character takes precedence over the mode rule, so an
// oriental piece forced into a plain minor key still gets oriental changes.

use crate::theory::{ChordQuality, ScaleMode};
use lofi_crafter_prng::LofiRng;
use serde::{Deserialize, Serialize};

use crate::theory::ChordQuality::{Dominant7, Major7, Minor7, Minor7Flat5, Minor9, Sus4};

/// One measure's harmony: a scale degree and the chord built on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordStep {
    /// 1-based scale degree of the chord root.
    pub degree: i32,
    pub quality: ChordQuality,
}

const fn step(degree: i32, quality: ChordQuality) -> ChordStep {
    ChordStep { degree, quality }
}

/// Progression groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonicCharacter {
    /// Minor-key ii-V and plagal loops with ninths.
    Melancholic,
    /// Static minor-seventh vamps with suspended colour, for pentatonic melody.
    Oriental,
    /// Dominant-seventh tonic, the northeastern Brazilian sound.
    ModalDominant,
}

const MELANCHOLIC: &[&[ChordStep]] = &[
    &[step(1, Minor9), step(4, Minor7), step(7, Dominant7), step(3, Major7)],
    &[step(1, Minor7), step(6, Major7), step(2, Minor7Flat5), step(5, Dominant7)],
    &[step(6, Major7), step(5, Dominant7), step(1, Minor9), step(1, Minor7)],
    &[step(1, Minor7), step(4, Minor9), step(1, Minor7), step(4, Minor7)],
];

const ORIENTAL: &[&[ChordStep]] = &[
    &[step(1, Minor7), step(4, Sus4), step(1, Minor7), step(7, Minor7)],
    &[step(1, Minor7), step(2, Minor7), step(1, Minor7), step(7, Minor7)],
];

const MODAL_DOMINANT: &[&[ChordStep]] = &[
    &[step(1, Dominant7), step(4, Major7), step(1, Dominant7), step(5, Dominant7)],
    &[step(1, Dominant7), step(7, Major7), step(6, Major7), step(5, Dominant7)],
];

impl HarmonicCharacter {
    /// Every progression eligible for this character.
    pub fn catalog(self) -> &'static [&'static [ChordStep]] {
        match self {
            HarmonicCharacter::Melancholic => MELANCHOLIC,
            HarmonicCharacter::Oriental => ORIENTAL,
            HarmonicCharacter::ModalDominant => MODAL_DOMINANT,
        }
    }
}

/// The grouping rule. `style_character` is the preset's declared character,
/// if it has one.
pub fn character_for(mode: ScaleMode, style_character: Option<HarmonicCharacter>) -> HarmonicCharacter {
    if let Some(character) = style_character {
        return character;
    }
    match mode {
        ScaleMode::PentatonicMinor => HarmonicCharacter::Oriental,
        ScaleMode::LydianFlat7 => HarmonicCharacter::ModalDominant,
        ScaleMode::Major | ScaleMode::Minor | ScaleMode::Dorian => HarmonicCharacter::Melancholic,
    }
}

/// A chosen progression. Immutable once selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub character: HarmonicCharacter,
    pub steps: Vec<ChordStep>,
}

impl Progression {
    pub fn new(character: HarmonicCharacter, steps: &[ChordStep]) -> Self {
        assert!(!steps.is_empty(), "a progression needs at least one chord");
        Progression {
            character,
            steps: steps.to_vec(),
        }
    }

    /// Harmony for a measure, cycling through the steps.
    pub fn chord_at(&self, measure: u32) -> ChordStep {
        self.steps[measure as usize % self.steps.len()]
    }

    /// Roman-ish summary for logs, e.g. "1m9 4m7 7:7 3maj7".
    pub fn describe(&self) -> String {
        self.steps
            .iter()
            .map(|s| match s.quality {
                ChordQuality::Dominant7 => format!("{}:7", s.degree),
                q => format!("{}{}", s.degree, q.symbol()),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Pick a progression for a mode (and optional style character).
pub fn select_progression(
    mode: ScaleMode,
    style_character: Option<HarmonicCharacter>,
    rng: &mut LofiRng,
) -> Progression {
    let character = character_for(mode, style_character);
    let catalog = character.catalog();
    let steps = catalog[rng.range_usize(0, catalog.len())];
    Progression::new(character, steps)
}
