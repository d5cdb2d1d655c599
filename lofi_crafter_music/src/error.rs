// Error types for composition, serialization and rendering.
//
// Bad names (style, key, mode, instrument) are not errors; they fall back to
// defaults with a warning. `ComposeError` covers contract violations and I/O
// around the MIDI file and config. `RenderError` belongs to the external
// synthesizer step and never touches an already-written MIDI file.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("tempo {bpm} BPM is outside the supported range 20-300")]
    InvalidTempo { bpm: u16 },

    #[error("ticks per beat must be positive")]
    InvalidResolution,

    #[error("{measures} measures requested, at most {max} supported")]
    TooManyMeasures { measures: u32, max: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("MIDI parse error: {0}")]
    MidiParse(#[from] midly::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("MIDI file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code:?}: {stderr}")]
    ProcessFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}
