// Lofi Crafter composition engine
//
// Procedurally composes multi-track lofi pieces as timed note events. A small
// set of parameters (style, key, mode, tempo, length, instrument set) becomes
// chord-driven harmony, bass, pad, melody, ornament and drum tracks with
// swing and humanized timing and velocity, delta-encoded into a standard MIDI
// file. Audio synthesis is left to an external renderer.
//
// Architecture:
// - theory.rs: Scale modes, chord qualities, key parsing, degree-to-pitch math
// - progression.rs: Chord progression catalog grouped by harmonic character
// - humanize.rs: Timing/velocity jitter and laid-back drag
// - event.rs: Note events, instrument roles (program, channel) and tracks
// - generate.rs: Pitched track generators (harmony, bass, pad, sparse lines)
// - drums.rs: Percussion kit and swing
// - schedule.rs: Per-track event ordering and delta-time encoding
// - style.rs: Style presets, groove feel data and parameter resolution
// - compose.rs: The `compose` entry point and the `Composition` it returns
// - midi.rs: SMF format 1 writer (and a reader for verification)
// - config.rs: JSON engine config (resolution and style catalog)
// - render.rs: External FluidSynth renderer
// - error.rs: Error types
//
// The engine is deterministic given a seed: every random draw goes through
// the caller's `LofiRng`.

pub mod compose;
pub mod config;
pub mod drums;
pub mod error;
pub mod event;
pub mod generate;
pub mod humanize;
pub mod midi;
pub mod progression;
pub mod render;
pub mod schedule;
pub mod style;
pub mod theory;

pub use compose::{compose, compose_with, Composition, CompositionRequest};
pub use config::EngineConfig;
pub use error::{ComposeError, RenderError};
pub use event::{EventKind, Instrument, NoteEvent, Tick, Track};
pub use style::Style;
