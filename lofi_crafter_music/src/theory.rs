// Scale, key and chord vocabulary for lofi harmony.
//
// A `Key` is a root pitch class plus a `ScaleMode`. Modes map to fixed
// interval tables (5 to 7 semitone offsets from the root within one octave).
// Scale degrees are 1-based and wrap upward: degree 8 of a seven-note scale
// is degree 1 an octave higher, degree 6 of a pentatonic scale is degree 1
// an octave higher.
//
// Name parsing fails closed. An unrecognised key name resolves to A
// (pitch class 9) and an unrecognised mode name resolves to natural minor,
// both with a logged warning, so a typo never stops a piece from being made.
//
// Used by progression.rs (mode → harmonic character), generate.rs (pitches
// for every track) and style.rs (splitting preset key names).

use serde::{Deserialize, Serialize};

/// Pitch class used when a key name cannot be parsed (A).
pub const DEFAULT_PITCH_CLASS: u8 = 9;

/// Scale families supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// Ionian: W W H W W W H.
    Major,
    /// Aeolian / natural minor. The fallback for unknown names.
    Minor,
    /// Minor with a raised sixth; the jazzhop colour.
    Dorian,
    /// Five-note minor pentatonic, used for the oriental style.
    PentatonicMinor,
    /// Major with a raised fourth and lowered seventh (the "nordestino"
    /// acoustic scale).
    LydianFlat7,
}

impl ScaleMode {
    pub const ALL: [ScaleMode; 5] = [
        ScaleMode::Major,
        ScaleMode::Minor,
        ScaleMode::Dorian,
        ScaleMode::PentatonicMinor,
        ScaleMode::LydianFlat7,
    ];

    /// Semitone offsets of each degree from the root, ascending.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ScaleMode::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleMode::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleMode::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleMode::PentatonicMinor => &[0, 3, 5, 7, 10],
            ScaleMode::LydianFlat7 => &[0, 2, 4, 6, 7, 9, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleMode::Major => "major",
            ScaleMode::Minor => "minor",
            ScaleMode::Dorian => "dorian",
            ScaleMode::PentatonicMinor => "pentatonic_minor",
            ScaleMode::LydianFlat7 => "lydian_b7",
        }
    }

    /// Look up a mode by name. Accepts snake_case, kebab-case and a few
    /// common aliases; anything else is `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "major" | "ionian" => Some(ScaleMode::Major),
            "minor" | "aeolian" | "natural_minor" => Some(ScaleMode::Minor),
            "dorian" => Some(ScaleMode::Dorian),
            "pentatonic_minor" | "minor_pentatonic" | "pentatonic" => {
                Some(ScaleMode::PentatonicMinor)
            }
            "lydian_b7" | "lydian_flat7" | "lydian_dominant" | "acoustic" => {
                Some(ScaleMode::LydianFlat7)
            }
            _ => None,
        }
    }

    /// Like `from_name`, but substitutes `Minor` for unknown names.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            log::warn!("Unknown mode '{name}', using minor");
            ScaleMode::Minor
        })
    }
}

/// Interval table for a mode name, with the minor fallback.
pub fn scale_for(mode: &str) -> &'static [i32] {
    ScaleMode::from_name_or_default(mode).intervals()
}

/// Chord types used by the progression catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Minor7,
    Minor9,
    Major7,
    Dominant7,
    /// Half-diminished.
    Minor7Flat5,
    Sus4,
}

impl ChordQuality {
    /// Semitone intervals above the chord root.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Minor9 => &[0, 3, 7, 10, 14],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Minor7Flat5 => &[0, 3, 6, 10],
            ChordQuality::Sus4 => &[0, 5, 7],
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ChordQuality::Minor7 => "m7",
            ChordQuality::Minor9 => "m9",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Minor7Flat5 => "m7b5",
            ChordQuality::Sus4 => "sus4",
        }
    }
}

/// A parsed key name such as `"Eb"` or `"F#m"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyName {
    pub pitch_class: u8,
    /// True when the name carried a trailing minor marker (`m`, `min`, `minor`).
    pub minor: bool,
}

impl KeyName {
    /// Strictly parse a key name. Returns `None` for anything that is not a
    /// letter A-G, an optional `#`/`b` accidental and an optional
    /// major/minor suffix.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let mut chars = name.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let natural: i32 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let rest = chars.as_str();
        let (accidental, suffix) = match rest.chars().next() {
            Some('#') | Some('♯') => (1, &rest[rest.chars().next()?.len_utf8()..]),
            Some('♭') => (-1, &rest['♭'.len_utf8()..]),
            // A lone "b" after the letter is a flat; "bm" is B-flat minor.
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let minor = match suffix.to_ascii_lowercase().as_str() {
            "" | "maj" | "major" => false,
            "m" | "min" | "minor" => true,
            _ => return None,
        };

        Some(KeyName {
            pitch_class: (natural + accidental).rem_euclid(12) as u8,
            minor,
        })
    }

    /// Parse with the documented fallback: A, no minor marker.
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            log::warn!("Unknown key '{name}', using A");
            KeyName {
                pitch_class: DEFAULT_PITCH_CLASS,
                minor: false,
            }
        })
    }
}

/// Pitch class of a key name, or `DEFAULT_PITCH_CLASS` if it is not one.
pub fn parse_key(name: &str) -> u8 {
    KeyName::parse_or_default(name).pitch_class
}

/// Conventional spelling of a pitch class (flats for the black keys that
/// lofi keys usually use).
pub fn pitch_class_name(pc: u8) -> &'static str {
    match pc % 12 {
        0 => "C",
        1 => "C#",
        2 => "D",
        3 => "Eb",
        4 => "E",
        5 => "F",
        6 => "F#",
        7 => "G",
        8 => "Ab",
        9 => "A",
        10 => "Bb",
        _ => "B",
    }
}

/// A tonal centre: root pitch class plus scale mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Root pitch class, 0 = C.
    pub root: u8,
    pub mode: ScaleMode,
}

impl Key {
    pub fn new(root: u8, mode: ScaleMode) -> Self {
        Key {
            root: root % 12,
            mode,
        }
    }

    pub fn scale(&self) -> &'static [i32] {
        self.mode.intervals()
    }

    /// MIDI pitch of a 1-based scale degree in an octave.
    ///
    /// `root + scale[(degree-1) mod n] + 12 * (octave + floor((degree-1) / n))`.
    /// Degrees past the scale length climb into the next octave; degrees
    /// below 1 descend. The result is unclamped; callers clamp to MIDI range
    /// when emitting events.
    pub fn note(&self, degree: i32, octave: i32) -> i32 {
        let scale = self.scale();
        let len = scale.len() as i32;
        let idx = (degree - 1).rem_euclid(len);
        let octave_shift = (degree - 1).div_euclid(len);
        self.root as i32 + scale[idx as usize] + 12 * (octave + octave_shift)
    }

    /// Chord tones for a degree and quality, rooted at `note(degree, octave)`.
    pub fn chord(&self, degree: i32, quality: ChordQuality, octave: i32) -> Vec<i32> {
        let root = self.note(degree, octave);
        quality.intervals().iter().map(|iv| root + iv).collect()
    }

    /// Human-readable name, e.g. "Eb dorian".
    pub fn describe(&self) -> String {
        format!("{} {}", pitch_class_name(self.root), self.mode.name())
    }
}

/// Clamp an unbounded pitch into the MIDI key range.
pub fn clamp_pitch(pitch: i32) -> u8 {
    pitch.clamp(0, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_sizes_match_modes() {
        assert_eq!(ScaleMode::Major.intervals().len(), 7);
        assert_eq!(ScaleMode::Minor.intervals().len(), 7);
        assert_eq!(ScaleMode::Dorian.intervals().len(), 7);
        assert_eq!(ScaleMode::PentatonicMinor.intervals().len(), 5);
        assert_eq!(ScaleMode::LydianFlat7.intervals().len(), 7);
    }

    #[test]
    fn test_scales_ascend_within_one_octave() {
        for mode in ScaleMode::ALL {
            let s = mode.intervals();
            assert_eq!(s[0], 0, "{mode:?} must start on the root");
            assert!(s.windows(2).all(|w| w[0] < w[1]), "{mode:?} not ascending");
            assert!(*s.last().unwrap() < 12, "{mode:?} spills past the octave");
        }
    }

    #[test]
    fn test_unknown_mode_falls_back_to_minor() {
        assert_eq!(scale_for("phrygian-ish"), ScaleMode::Minor.intervals());
        assert_eq!(scale_for("Dorian"), ScaleMode::Dorian.intervals());
        assert_eq!(scale_for("pentatonic-minor"), ScaleMode::PentatonicMinor.intervals());
        assert_eq!(scale_for("lydian-flat7"), ScaleMode::LydianFlat7.intervals());
    }

    #[test]
    fn test_parse_key_names() {
        assert_eq!(parse_key("C"), 0);
        assert_eq!(parse_key("c#"), 1);
        assert_eq!(parse_key("Db"), 1);
        assert_eq!(parse_key("Eb"), 3);
        assert_eq!(parse_key("F#"), 6);
        assert_eq!(parse_key("Bb"), 10);
        assert_eq!(parse_key("B"), 11);
        assert_eq!(parse_key("Cb"), 11);
        assert_eq!(parse_key("  A  "), 9);
    }

    #[test]
    fn test_parse_key_minor_marker() {
        assert_eq!(
            KeyName::parse("Am"),
            Some(KeyName { pitch_class: 9, minor: true })
        );
        assert_eq!(
            KeyName::parse("Bbm"),
            Some(KeyName { pitch_class: 10, minor: true })
        );
        assert_eq!(
            KeyName::parse("bm"),
            Some(KeyName { pitch_class: 11, minor: true })
        );
        assert_eq!(
            KeyName::parse("F#minor"),
            Some(KeyName { pitch_class: 6, minor: true })
        );
        assert_eq!(
            KeyName::parse("G"),
            Some(KeyName { pitch_class: 7, minor: false })
        );
    }

    #[test]
    fn test_parse_key_fails_closed() {
        assert_eq!(KeyName::parse("H"), None);
        assert_eq!(KeyName::parse(""), None);
        assert_eq!(KeyName::parse("Cx7"), None);
        assert_eq!(parse_key("H"), DEFAULT_PITCH_CLASS);
        assert_eq!(parse_key(""), DEFAULT_PITCH_CLASS);
    }

    #[test]
    fn test_note_formula_wraps_octaves() {
        let a_minor = Key::new(9, ScaleMode::Minor);
        // Degree 1 in octave 3 is A2 (MIDI 45).
        assert_eq!(a_minor.note(1, 3), 45);
        // Degree 8 is degree 1 one octave up.
        assert_eq!(a_minor.note(8, 3), a_minor.note(1, 4));
        // Degree 9 lands an octave above degree 2.
        assert_eq!(a_minor.note(9, 3), a_minor.note(2, 3) + 12);

        let pent = Key::new(0, ScaleMode::PentatonicMinor);
        assert_eq!(pent.note(6, 4), pent.note(1, 5));
        assert_eq!(pent.note(2, 4), 48 + 3);
    }

    #[test]
    fn test_note_is_monotonic_in_degree() {
        for mode in ScaleMode::ALL {
            for root in 0..12 {
                let key = Key::new(root, mode);
                for octave in 0..6 {
                    for degree in 1..20 {
                        assert!(
                            key.note(degree, octave) <= key.note(degree + 1, octave),
                            "{mode:?} root {root} octave {octave} degree {degree}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_chord_tones_follow_quality() {
        let c_major = Key::new(0, ScaleMode::Major);
        assert_eq!(c_major.chord(5, ChordQuality::Dominant7, 4), vec![55, 59, 62, 65]);
        let a_minor = Key::new(9, ScaleMode::Minor);
        assert_eq!(a_minor.chord(1, ChordQuality::Minor9, 3), vec![45, 48, 52, 55, 59]);
    }

    #[test]
    fn test_clamp_pitch_bounds() {
        assert_eq!(clamp_pitch(-5), 0);
        assert_eq!(clamp_pitch(60), 60);
        assert_eq!(clamp_pitch(200), 127);
    }
}
